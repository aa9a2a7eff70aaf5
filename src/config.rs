use clap::Parser;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "sentry-exporter")]
#[command(about = "Exports Sentry project rate limits and event rates to Prometheus")]
pub struct Args {
    // Sentry API token, sent as a bearer token
    #[arg(short = 'T', long, env = "SENTRY_TOKEN", hide_env_values = true)]
    pub sentry_token: String,

    // Sentry API root, e.g. https://sentry.io/api/0/
    #[arg(long)]
    pub sentry_url: String,

    // Organization slug
    #[arg(long)]
    pub sentry_org: String,

    // Port serving /metrics and /health
    #[arg(long, default_value_t = 8000)]
    pub metrics_port: u16,

    // Max concurrent requests to Sentry
    #[arg(long = "max-con-req", default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_concurrent_requests: u32,
}
