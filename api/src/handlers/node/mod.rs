use axum::{
    Json,
    extract::{Query, State},
};
use pdash_common::{
    params::{BumpFeeParams, CloseChannelParams, EstimateFeesParams},
    views::{Balance, Channel, LiquidityFees, LnAddress, NodeInfo, Offer, TransactionId},
};
use tracing::info;

use crate::{auth::Auth, context::ApiContext, error::ApiError};


#[utoipa::path(
    get,
    path = "/api/v1/node/info",
    tags = ["node"],
    responses((status = 200, description = "Node identity and channels", body = NodeInfo))
)]
pub async fn node_info(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
) -> Result<Json<NodeInfo>, ApiError> {
    Ok(Json(ctx.phoenixd.active().await.get_info().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/node/balance",
    tags = ["node"],
    responses((status = 200, description = "Spendable balance", body = Balance))
)]
pub async fn node_balance(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
) -> Result<Json<Balance>, ApiError> {
    Ok(Json(ctx.phoenixd.active().await.get_balance().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/node/channels",
    tags = ["node"],
    responses((status = 200, description = "Channels as reported by phoenixd", body = Vec<Channel>))
)]
pub async fn list_channels(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<Channel>>, ApiError> {
    Ok(Json(ctx.phoenixd.active().await.list_channels().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/node/channels/close",
    tags = ["node"],
    request_body(content = CloseChannelParams, content_type = "application/json"),
    responses((status = 200, description = "Closing transaction published", body = TransactionId))
)]
pub async fn close_channel(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<CloseChannelParams>,
) -> Result<Json<TransactionId>, ApiError> {
    body.validate()?;

    let tx_id = ctx.phoenixd.active().await.close_channel(&body).await?;
    info!(channel_id = %body.channel_id, %tx_id, "Channel close requested");

    Ok(Json(TransactionId { tx_id }))
}

#[utoipa::path(
    get,
    path = "/api/v1/node/fees/estimate",
    tags = ["node"],
    params(EstimateFeesParams),
    responses((status = 200, description = "Cost of the requested inbound liquidity", body = LiquidityFees))
)]
pub async fn estimate_liquidity_fees(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Query(params): Query<EstimateFeesParams>,
) -> Result<Json<LiquidityFees>, ApiError> {
    params.validate()?;
    Ok(Json(
        ctx.phoenixd
            .active()
            .await
            .estimate_liquidity_fees(&params)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/node/bumpfee",
    tags = ["node"],
    request_body(content = BumpFeeParams, content_type = "application/json"),
    responses((status = 200, description = "Child transaction published", body = TransactionId))
)]
pub async fn bump_fee(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<BumpFeeParams>,
) -> Result<Json<TransactionId>, ApiError> {
    body.validate()?;

    let tx_id = ctx.phoenixd.active().await.bump_fee(&body).await?;
    info!(%tx_id, feerate_sat_byte = body.feerate_sat_byte, "Fee bumped");

    Ok(Json(TransactionId { tx_id }))
}

#[utoipa::path(
    get,
    path = "/api/v1/node/offer",
    tags = ["node"],
    responses((status = 200, description = "Reusable BOLT12 offer", body = Offer))
)]
pub async fn get_offer(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
) -> Result<Json<Offer>, ApiError> {
    let offer = ctx.phoenixd.active().await.get_offer().await?;
    Ok(Json(Offer { offer }))
}

#[utoipa::path(
    get,
    path = "/api/v1/node/lnaddress",
    tags = ["node"],
    responses((status = 200, description = "Lightning address", body = LnAddress))
)]
pub async fn get_ln_address(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
) -> Result<Json<LnAddress>, ApiError> {
    let address = ctx.phoenixd.active().await.get_ln_address().await?;
    Ok(Json(LnAddress { address }))
}
