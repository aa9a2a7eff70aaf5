use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::error::{ExporterError, Result};
use crate::metrics;

pub const SCRAPE_INTERVAL: Duration = Duration::from_secs(30);
pub const FAILURE_BUDGET: u32 = 5;

// What the scheduler does after a cycle finishes
#[derive(Debug, PartialEq, Eq)]
pub enum Transition {
    Retry { remaining: u32 },
    Fail,
}

/// Drives scrape cycles forever: sleep after a success, retry at once after
/// a failure, give up after `budget` failures in a row.
#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    budget: u32,
    remaining: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SCRAPE_INTERVAL, FAILURE_BUDGET)
    }
}

impl Scheduler {
    pub fn new(interval: Duration, budget: u32) -> Self {
        Self {
            interval,
            budget,
            remaining: budget,
        }
    }

    pub fn on_success(&mut self) {
        self.remaining = self.budget;
    }

    pub fn on_failure(&mut self) -> Transition {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Transition::Fail
        } else {
            Transition::Retry {
                remaining: self.remaining,
            }
        }
    }

    /// Run `cycle` until the failure budget is spent. Only returns on that
    /// terminal condition, with the last cycle error attached.
    pub async fn run<F, Fut, T>(&mut self, mut cycle: F) -> ExporterError
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        loop {
            info!("Start scraping from Sentry API");
            let started = Instant::now();

            match cycle().await {
                Ok(projects) => {
                    metrics::record_cycle(true);
                    metrics::SCRAPE_DURATION.observe(started.elapsed().as_secs_f64());
                    self.on_success();
                    info!(
                        projects = projects.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Scrape finished, waiting for next one"
                    );
                    tokio::time::sleep(self.interval).await;
                }
                Err(e) => {
                    metrics::record_cycle(false);
                    match self.on_failure() {
                        Transition::Retry { remaining } => {
                            error!(error = %e, remaining, "Scrape failed, trying again");
                        }
                        Transition::Fail => {
                            error!(error = %e, "Retry limit reached");
                            return ExporterError::RetriesExhausted {
                                failures: self.budget,
                                last: Box::new(e),
                            };
                        }
                    }
                }
            }
        }
    }
}
