//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Broker statistics (`GET /api/stats`)
///
/// Session codes are never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDto {
    pub sessions: usize,
    pub receivers: usize,
    pub connections: usize,
    pub oldest_session_created_at: Option<String>,
}
