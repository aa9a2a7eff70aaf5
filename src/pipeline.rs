use chrono::{Duration, Utc};
use futures::future::try_join_all;
use futures::try_join;
use serde_json::Value;
use tracing::debug;

use crate::api::Endpoints;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::metrics;
use crate::models::{EnrichedProject, Project, ProjectKey, StatName, StatTotals};
use crate::rate_limit::hourly_limit_for_keys;
use crate::stats::sum_series;

/// Turns the organization's project list into enriched records, publishing
/// gauges along the way.
///
/// Every project is enriched concurrently, and inside a project the rate limit
/// and the three stat windows are fetched concurrently too. The only bound is
/// the fetcher's permit pool. The first failing fetch fails the whole run and
/// drops the remaining work; gauges already written stay as they are.
pub struct Pipeline {
    fetcher: Fetcher,
    endpoints: Endpoints,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, endpoints: Endpoints) -> Self {
        Self { fetcher, endpoints }
    }

    pub async fn run(&self) -> Result<Vec<EnrichedProject>> {
        let projects: Vec<Project> = self.fetcher.get(&self.endpoints.projects()).await?;
        debug!(count = projects.len(), "fetched project list");

        try_join_all(projects.into_iter().map(|project| self.enrich(project))).await
    }

    async fn enrich(&self, project: Project) -> Result<EnrichedProject> {
        let (rate_limit_hourly, stats) =
            try_join!(self.rate_limit(&project), self.stats(&project))?;
        debug!(
            project = %project.slug,
            rate_limit_hourly,
            received = stats.received,
            "enriched project"
        );

        Ok(EnrichedProject {
            project,
            rate_limit_hourly,
            stats,
        })
    }

    async fn rate_limit(&self, project: &Project) -> Result<i64> {
        let keys: Vec<ProjectKey> = self
            .fetcher
            .get(&self.endpoints.project_keys(&project.slug))
            .await?;

        let hourly = hourly_limit_for_keys(&keys);
        metrics::set_hourly_rate_limit(&project.slug, hourly);
        Ok(hourly)
    }

    async fn stats(&self, project: &Project) -> Result<StatTotals> {
        let (received, rejected, blacklisted) = try_join!(
            self.stat(project, StatName::Received),
            self.stat(project, StatName::Rejected),
            self.stat(project, StatName::Blacklisted)
        )?;

        // rejected and blacklisted are computed but not exported
        metrics::set_received_events(&project.slug, received);
        Ok(StatTotals {
            received,
            rejected,
            blacklisted,
        })
    }

    // Trailing hour ending now, sampled per call
    async fn stat(&self, project: &Project, stat: StatName) -> Result<i64> {
        let until = Utc::now();
        let since = until - Duration::hours(1);
        let url = self.endpoints.project_stats(
            &project.slug,
            &project.id,
            stat,
            since.timestamp(),
            until.timestamp(),
        );

        let series: Vec<Value> = self.fetcher.get(&url).await?;
        Ok(sum_series(&series))
    }
}
