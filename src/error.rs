use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status} for {url}")]
    Upstream { status: StatusCode, url: String },

    #[error("malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("sentry token is not a valid header value")]
    InvalidToken,

    #[error("request gate closed")]
    GateClosed(#[from] tokio::sync::AcquireError),

    #[error("scrape failed {failures} times in a row, last error: {last}")]
    RetriesExhausted {
        failures: u32,
        #[source]
        last: Box<ExporterError>,
    },
}

pub type Result<T> = std::result::Result<T, ExporterError>;
