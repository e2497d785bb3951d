use std::fmt;

/// One Pi-hole's reading for the current poll.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct StatusSnapshot {
    #[serde(alias = "dns_queries_today")]
    pub queries_today: u64,
    pub ads_blocked_today: u64,
    /// Fraction of today's queries that were blocked, in `0.0..=1.0`.
    pub ads_percentage_today: f64,
    #[serde(alias = "domains_being_blocked")]
    pub domains_blocked: u64,
    pub queries_cached: u64,
    pub status: BlockingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "String")]
pub enum BlockingStatus {
    Enabled,
    Disabled,
    Other(String),
}

impl From<String> for BlockingStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "enabled" => Self::Enabled,
            "disabled" => Self::Disabled,
            _ => Self::Other(value),
        }
    }
}

impl fmt::Display for BlockingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => f.write_str("enabled"),
            Self::Disabled => f.write_str("disabled"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Text shown on the panel; also the input of the change digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedSummary {
    pub body_text: String,
    pub status_line: String,
}
