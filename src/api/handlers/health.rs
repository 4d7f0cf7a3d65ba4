//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Store**: Key-value store bound and reachable
/// 2. **Pool**: Size of the pool held in memory (informational)
/// 3. **Task Queue**: Background worker still accepting jobs
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "store": { "status": "ok", "message": "Store reachable" },
///     "pool": { "status": "ok", "message": "842 urls in memory" },
///     "task_queue": { "status": "ok", "message": "Capacity: 1024" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_check = check_store(&state).await;

    let pool_check = check_pool(&state);

    let queue_check = check_task_queue(&state);

    let all_healthy = store_check.status == "ok" && queue_check.status == "ok";

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            store: store_check,
            pool: pool_check,
            task_queue: queue_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks that a store is bound and answers.
async fn check_store(state: &AppState) -> CheckStatus {
    match &state.pool_store {
        None => CheckStatus {
            status: "error".to_string(),
            message: Some("KV store binding not found".to_string()),
        },
        Some(store) if store.health_check().await => CheckStatus {
            status: "ok".to_string(),
            message: Some("Store reachable".to_string()),
        },
        Some(_) => CheckStatus {
            status: "error".to_string(),
            message: Some("Store connection failed".to_string()),
        },
    }
}

/// Reports the memory-mirrored pool size without touching the store.
fn check_pool(state: &AppState) -> CheckStatus {
    let size = state
        .pool_store
        .as_ref()
        .and_then(|store| store.mirrored())
        .map(|pool| pool.len())
        .unwrap_or(0);

    CheckStatus {
        status: "ok".to_string(),
        message: Some(format!("{} urls in memory", size)),
    }
}

/// Checks if the background queue is operational.
fn check_task_queue(state: &AppState) -> CheckStatus {
    if state.tasks.is_closed() {
        CheckStatus {
            status: "error".to_string(),
            message: Some("Background queue is closed".to_string()),
        }
    } else {
        CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("Capacity: {}", state.tasks.capacity())),
        }
    }
}
