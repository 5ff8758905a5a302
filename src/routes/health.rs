use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::AppResult;
use crate::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    db: &'static str,
    version: &'static str,
}

/// Build the health check router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

/// Liveness probe: always returns 200 with component status.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = check_db(&state).await;

    Json(HealthResponse {
        status: if db_ok { "healthy" } else { "degraded" },
        db: if db_ok { "connected" } else { "disconnected" },
        version: VERSION,
    })
}

/// Readiness probe: returns 200 only when the database is reachable. A load
/// balancer should stop routing traffic to an instance that fails this check.
async fn readiness_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    if !check_db(&state).await {
        return Err(crate::error::AppError::Internal(
            "database unavailable".into(),
        ));
    }

    Ok(Json(HealthResponse {
        status: "ready",
        db: "connected",
        version: VERSION,
    }))
}

/// Run `SELECT 1` against the Postgres pool.
async fn check_db(state: &AppState) -> bool {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok()
}
