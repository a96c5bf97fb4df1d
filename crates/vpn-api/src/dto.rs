use serde::{Deserialize, Serialize};

// ── Requests ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateEndpointRequest {
    pub region: String,
}

// ── Responses ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub adopted: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ready: bool,
}
