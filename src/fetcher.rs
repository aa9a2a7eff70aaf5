use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{ExporterError, Result};
use crate::metrics::UPSTREAM_THROTTLED;

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Authenticated GET client shared by every upstream call of the exporter.
///
/// All requests go through one counting semaphore, so at most `max_concurrent`
/// requests are in flight process-wide. A permit is held for the whole call,
/// including any 429 backoff, which means a throttled request keeps its slot.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
}

impl Fetcher {
    pub fn new(token: &str, max_concurrent: usize) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ExporterError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(max_concurrent)),
        })
    }

    /// GET `url` and decode its JSON body.
    ///
    /// 429 responses are retried forever after sleeping for `Retry-After`
    /// seconds (1s if missing or unparsable). Any other non-success status
    /// fails with [`ExporterError::Upstream`].
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let _permit = self.permits.acquire().await?;

        loop {
            let res = self.client.get(url).send().await?;
            let status = res.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = retry_after(res.headers());
                UPSTREAM_THROTTLED.inc();
                warn!(url, delay_secs = delay.as_secs(), "Rate limit exceeded, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                return Err(ExporterError::Upstream {
                    status,
                    url: url.to_string(),
                });
            }

            debug!(url, %status, "upstream response");
            let body = res.bytes().await?;
            return serde_json::from_slice(&body).map_err(|source| ExporterError::Malformed {
                url: url.to_string(),
                source,
            });
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::time::Instant;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn retry_after_defaults_to_one_second() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), Duration::from_secs(1));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), Duration::from_secs(1));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), Duration::from_secs(1));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Duration::from_secs(7));
    }

    #[test]
    fn rejects_token_with_newline() {
        assert!(matches!(Fetcher::new("bad\ntoken", 1), Err(ExporterError::InvalidToken)));
    }

    #[tokio::test]
    async fn sends_bearer_token_and_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new("s3cret", 2).unwrap();
        let body: Value = fetcher.get(&format!("{}/thing", server.uri())).await.unwrap();

        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn waits_out_429_then_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2])))
            .with_priority(2)
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new("t", 1).unwrap();
        let start = Instant::now();
        let body: Vec<u32> = fetcher.get(&format!("{}/busy", server.uri())).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(body, vec![1, 2]);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn other_errors_fail_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new("t", 1).unwrap();
        let err = fetcher
            .get::<Value>(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();

        match err {
            ExporterError::Upstream { status, url } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert!(url.ends_with("/down"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new("t", 1).unwrap();
        let err = fetcher.get::<Value>(&server.uri()).await.unwrap_err();

        assert!(matches!(err, ExporterError::Malformed { .. }));
    }

    #[tokio::test]
    async fn concurrency_is_capped_by_permits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new("t", 1).unwrap();
        let url = server.uri();
        let start = Instant::now();
        let results = futures::future::join_all((0..3).map(|_| fetcher.get::<Value>(&url))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        // one slot: the three calls are serialized
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn throttled_call_keeps_its_slot_while_backing_off() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/throttled"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .with_priority(2)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new("t", 1).unwrap();
        let throttled_url = format!("{}/throttled", server.uri());
        let fast_url = format!("{}/fast", server.uri());
        let start = Instant::now();

        let (throttled, fast_done) = tokio::join!(fetcher.get::<Value>(&throttled_url), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let res = fetcher.get::<Value>(&fast_url).await;
            (res, start.elapsed())
        });

        assert!(throttled.is_ok());
        let (fast, fast_elapsed) = fast_done;
        assert!(fast.is_ok());
        // the 200 for /fast had to wait for the slot held through the backoff
        assert!(fast_elapsed >= Duration::from_secs(2));
    }
}
