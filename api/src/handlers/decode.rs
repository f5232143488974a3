use axum::{Json, extract::State};
use pdash_common::{
    params::{DecodeInvoiceParams, DecodeOfferParams},
    views::{DecodedInvoice, DecodedOffer},
};

use crate::{auth::Auth, context::ApiContext, error::ApiError};

#[utoipa::path(
    post,
    path = "/api/v1/decode/invoice",
    tags = ["decode"],
    request_body(content = DecodeInvoiceParams, content_type = "application/json"),
    responses((status = 200, description = "Decoded BOLT11 invoice", body = DecodedInvoice))
)]
pub async fn decode_invoice(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<DecodeInvoiceParams>,
) -> Result<Json<DecodedInvoice>, ApiError> {
    body.validate()?;
    Ok(Json(ctx.phoenixd.active().await.decode_invoice(&body).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/decode/offer",
    tags = ["decode"],
    request_body(content = DecodeOfferParams, content_type = "application/json"),
    responses((status = 200, description = "Decoded BOLT12 offer", body = DecodedOffer))
)]
pub async fn decode_offer(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<DecodeOfferParams>,
) -> Result<Json<DecodedOffer>, ApiError> {
    body.validate()?;
    Ok(Json(ctx.phoenixd.active().await.decode_offer(&body).await?))
}
