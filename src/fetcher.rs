use crate::config::EndpointConfig;
use crate::state::StatusSnapshot;
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Fields every status document must carry, with the alternative spellings
/// the Pi-hole API uses for some of them.
const REQUIRED_FIELDS: &[(&str, &[&str])] = &[
    ("queries_today", &["dns_queries_today"]),
    ("ads_blocked_today", &[]),
    ("ads_percentage_today", &[]),
    ("domains_blocked", &["domains_being_blocked"]),
    ("queries_cached", &[]),
    ("status", &[]),
];

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("запрос к {url} не выполнен: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
    #[error("{url} ответил статусом {status}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },
    #[error("{url} вернул некорректный JSON: {reason}")]
    Malformed {
        url: String,
        reason: String,
        body: String,
    },
    #[error("в ответе {url} нет обязательных полей: {}", .missing.join(", "))]
    MissingFields {
        url: String,
        missing: Vec<&'static str>,
        body: String,
    },
    #[error("в ответе {url} поле имеет неверный тип: {reason}")]
    InvalidField {
        url: String,
        reason: String,
        body: String,
    },
}

impl StatusError {
    /// True for responses that parsed but do not describe a status document.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::MissingFields { .. } | Self::InvalidField { .. })
    }

    /// What the endpoint actually said, for the error screen.
    pub fn raw_response(&self) -> String {
        match self {
            Self::Request { source, .. } => source.to_string(),
            Self::HttpStatus { status, body, .. } => format!("HTTP {status}: {body}"),
            Self::Malformed { body, .. }
            | Self::MissingFields { body, .. }
            | Self::InvalidField { body, .. } => body.clone(),
        }
    }
}

pub trait StatusSource {
    fn fetch(&self, endpoint: &EndpointConfig) -> Result<StatusSnapshot, StatusError>;
}

pub struct StatusFetcher {
    client: Client,
    api_path: String,
}

impl StatusFetcher {
    pub fn new(api_path: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("pihole-dashboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            api_path: api_path.to_string(),
        })
    }

    pub fn url_for(&self, endpoint: &EndpointConfig) -> String {
        format!("http://{}:{}{}", endpoint.host, endpoint.port, self.api_path)
    }
}

impl StatusSource for StatusFetcher {
    fn fetch(&self, endpoint: &EndpointConfig) -> Result<StatusSnapshot, StatusError> {
        let url = self.url_for(endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| StatusError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| StatusError::Request {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(StatusError::HttpStatus {
                url,
                status: status.as_u16(),
                body,
            });
        }

        parse_snapshot(&url, &body)
    }
}

pub fn parse_snapshot(url: &str, body: &str) -> Result<StatusSnapshot, StatusError> {
    let value: Value = serde_json::from_str(body).map_err(|err| StatusError::Malformed {
        url: url.to_string(),
        reason: err.to_string(),
        body: body.to_string(),
    })?;

    // Pi-hole answers `[]` when the API refuses the request.
    let empty = Map::new();
    let fields = value.as_object().unwrap_or(&empty);
    let missing = missing_fields(fields);
    if !missing.is_empty() {
        return Err(StatusError::MissingFields {
            url: url.to_string(),
            missing,
            body: body.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|err| StatusError::InvalidField {
        url: url.to_string(),
        reason: err.to_string(),
        body: body.to_string(),
    })
}

fn missing_fields(fields: &Map<String, Value>) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .filter(|(name, aliases)| {
            !fields.contains_key(*name) && !aliases.iter().any(|a| fields.contains_key(*a))
        })
        .map(|(name, _)| *name)
        .collect()
}
