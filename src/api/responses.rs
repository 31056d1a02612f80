//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::TimerSnapshot;

/// Body of POST /start
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    /// Minutes as typed into the duration field, either a string or a number
    #[serde(default)]
    pub minutes: Option<Value>,
}

impl StartRequest {
    /// The raw minutes text, as the duration parser expects it
    pub fn minutes_text(&self) -> Option<String> {
        match self.minutes.as_ref()? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }
}

/// Body of POST /visibility
#[derive(Debug, Clone, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

/// API response structure for event endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

impl ApiResponse {
    pub fn new(status: String, message: String, timer: TimerSnapshot) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// Status follows the countdown phase
    pub fn for_timer(message: String, timer: TimerSnapshot) -> Self {
        let status = if timer.running { "running" } else { "idle" };
        Self::new(status.to_string(), message, timer)
    }

    pub fn error(message: String, timer: TimerSnapshot) -> Self {
        Self::new("error".to_string(), message, timer)
    }
}

/// Status response with server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> StartRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn minutes_accept_strings_and_numbers() {
        assert_eq!(parse(r#"{"minutes": "12"}"#).minutes_text().as_deref(), Some("12"));
        assert_eq!(parse(r#"{"minutes": 3}"#).minutes_text().as_deref(), Some("3"));
        assert_eq!(parse(r#"{"minutes": 2.5}"#).minutes_text().as_deref(), Some("2.5"));
    }

    #[test]
    fn missing_or_odd_minutes_are_none() {
        assert_eq!(parse("{}").minutes_text(), None);
        assert_eq!(parse(r#"{"minutes": null}"#).minutes_text(), None);
        assert_eq!(parse(r#"{"minutes": [1]}"#).minutes_text(), None);
    }
}
