//! Health probe DTOs.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "status": "healthy",
    "version": "0.1.0",
    "timestamp": "2025-06-14T08:00:00Z",
    "checks": {
        "database": {
            "status": "healthy",
            "message": "Connected",
            "response_time_ms": 3
        }
    }
}))]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: jiff::Timestamp,
    pub checks: BTreeMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Folds the component checks into an overall status; the worst one wins.
    pub fn from_checks(version: &str, checks: BTreeMap<String, ComponentHealth>) -> Self {
        let status = checks
            .values()
            .map(|check| check.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);
        Self {
            status,
            version: version.to_string(),
            timestamp: jiff::Timestamp::now(),
            checks,
        }
    }
}

/// Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: Option<u64>,
}

impl ComponentHealth {
    pub fn healthy(message: &str, elapsed: Duration) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: Some(message.to_string()),
            response_time_ms: Some(elapsed.as_millis() as u64),
        }
    }

    pub fn unhealthy(message: String, elapsed: Duration) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message),
            response_time_ms: Some(elapsed.as_millis() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&HealthStatus::Degraded).unwrap(), "\"degraded\"");
    }

    #[test]
    fn test_worst_component_decides_overall_status() {
        let mut checks = BTreeMap::new();
        checks.insert(
            "database".to_string(),
            ComponentHealth::unhealthy("Connection failed: timeout".to_string(), Duration::from_millis(5000)),
        );
        checks.insert(
            "cache".to_string(),
            ComponentHealth::healthy("OK", Duration::from_millis(1)),
        );

        let response = HealthResponse::from_checks("0.1.0", checks);
        assert_eq!(response.status, HealthStatus::Unhealthy);
        assert_eq!(response.checks["database"].response_time_ms, Some(5000));
    }

    #[test]
    fn test_no_checks_is_healthy() {
        let response = HealthResponse::from_checks("0.1.0", BTreeMap::new());
        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.version, "0.1.0");
    }
}
