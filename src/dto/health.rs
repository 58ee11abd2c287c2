use serde::Serialize;

/// Healthcheck response reporting service and storage status.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status; always `ok` when the process answers.
    pub status: &'static str,
    /// Storage status: `ok`, `unreachable` or `degraded`.
    pub storage: &'static str,
}
