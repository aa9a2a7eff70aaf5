use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// Sentry project as listed by the organization endpoint
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Project {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub slug: String,
    pub name: String,
}

// Client key (DSN) of a project; only the rate limit matters here
#[derive(Deserialize, Clone, Debug)]
pub struct ProjectKey {
    #[serde(rename = "rateLimit", default)]
    pub rate_limit: Option<RateLimitConfig>,
}

// Rate limit as configured upstream: `count` events per `window` seconds
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct RateLimitConfig {
    pub window: u64,
    pub count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatName {
    Received,
    Rejected,
    Blacklisted,
}

impl StatName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatName::Received => "received",
            StatName::Rejected => "rejected",
            StatName::Blacklisted => "blacklisted",
        }
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Event totals over the trailing hour
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatTotals {
    pub received: i64,
    pub rejected: i64,
    pub blacklisted: i64,
}

// Project plus everything derived for it during one scrape cycle
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct EnrichedProject {
    #[serde(flatten)]
    pub project: Project,
    #[serde(rename = "rateLimitHourly")]
    pub rate_limit_hourly: i64,
    pub stats: StatTotals,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
