use crate::models::StatName;

// Builds upstream URLs for one organization.
// `base_url` is the API root, e.g. https://sentry.io/api/0/
#[derive(Clone, Debug)]
pub struct Endpoints {
    base_url: String,
    org: String,
}

impl Endpoints {
    pub fn new(base_url: &str, org: &str) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Self {
            base_url,
            org: org.to_string(),
        }
    }

    pub fn projects(&self) -> String {
        format!(
            "{}organizations/{}/projects/?all_projects=1",
            self.base_url, self.org
        )
    }

    pub fn project_keys(&self, project_slug: &str) -> String {
        format!("{}projects/{}/{}/keys/", self.base_url, self.org, project_slug)
    }

    // Stat series for [since, until], both unix seconds
    pub fn project_stats(
        &self,
        project_slug: &str,
        project_id: &str,
        stat: StatName,
        since: i64,
        until: i64,
    ) -> String {
        format!(
            "{}projects/{}/{}/stats/?stat={}&since={}&until={}&project={}",
            self.base_url, self.org, project_slug, stat, since, until, project_id
        )
    }
}
