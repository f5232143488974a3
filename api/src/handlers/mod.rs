use axum::{Json, extract::State};
use pdash_common::views::Health;

use crate::{context::ApiContext, error::ApiError};

pub mod auth;
pub mod decode;
pub mod node;
pub mod payments;
pub mod phoenixd;

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tags = ["health"],
    responses((status = 200, description = "Backend and storage are up", body = Health))
)]
pub async fn health_check(State(ctx): State<ApiContext>) -> Result<Json<Health>, ApiError> {
    ctx.db.ping().await?;

    Ok(Json(Health {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    }))
}
