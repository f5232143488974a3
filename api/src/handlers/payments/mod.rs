use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use pdash_common::{
    params::{
        CreateInvoiceParams, ListPaymentsParams, PayInvoiceParams, PayLnAddressParams,
        PayOfferParams, SendToAddressParams, validate_payment_key,
    },
    views::{CreatedInvoice, IncomingPayment, OutgoingPayment, PaymentResult, TransactionId},
};
use tracing::info;

use crate::{auth::Auth, context::ApiContext, error::ApiError};


#[utoipa::path(
    get,
    path = "/api/v1/payments/incoming",
    tags = ["payments"],
    params(ListPaymentsParams),
    responses((status = 200, description = "Incoming payments, newest first", body = Vec<IncomingPayment>))
)]
pub async fn list_incoming(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Query(params): Query<ListPaymentsParams>,
) -> Result<Json<Vec<IncomingPayment>>, ApiError> {
    params.validate()?;
    Ok(Json(
        ctx.phoenixd
            .active()
            .await
            .list_incoming_payments(&params)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/incoming/{payment_hash}",
    tags = ["payments"],
    params(("payment_hash" = String, Path, description = "Payment hash of the invoice")),
    responses((status = 200, description = "The incoming payment", body = IncomingPayment))
)]
pub async fn get_incoming(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Path(payment_hash): Path<String>,
) -> Result<Json<IncomingPayment>, ApiError> {
    validate_payment_key("payment_hash", &payment_hash)?;
    Ok(Json(
        ctx.phoenixd
            .active()
            .await
            .get_incoming_payment(&payment_hash)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/outgoing",
    tags = ["payments"],
    params(ListPaymentsParams),
    responses((status = 200, description = "Outgoing payments, newest first", body = Vec<OutgoingPayment>))
)]
pub async fn list_outgoing(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Query(params): Query<ListPaymentsParams>,
) -> Result<Json<Vec<OutgoingPayment>>, ApiError> {
    params.validate()?;
    Ok(Json(
        ctx.phoenixd
            .active()
            .await
            .list_outgoing_payments(&params)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/outgoing/{payment_id}",
    tags = ["payments"],
    params(("payment_id" = String, Path, description = "Id phoenixd assigned to the payment")),
    responses((status = 200, description = "The outgoing payment", body = OutgoingPayment))
)]
pub async fn get_outgoing(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Path(payment_id): Path<String>,
) -> Result<Json<OutgoingPayment>, ApiError> {
    validate_payment_key("payment_id", &payment_id)?;
    Ok(Json(
        ctx.phoenixd
            .active()
            .await
            .get_outgoing_payment(&payment_id)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/invoice",
    tags = ["payments"],
    request_body(content = CreateInvoiceParams, content_type = "application/json"),
    responses((status = 201, description = "Invoice created", body = CreatedInvoice))
)]
pub async fn create_invoice(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<CreateInvoiceParams>,
) -> Result<(StatusCode, Json<CreatedInvoice>), ApiError> {
    body.validate()?;

    let invoice = ctx.phoenixd.active().await.create_invoice(&body).await?;
    info!(
        payment_hash = %invoice.payment_hash,
        amount_sat = ?invoice.amount_sat,
        "Invoice created"
    );

    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/pay/invoice",
    tags = ["payments"],
    request_body(content = PayInvoiceParams, content_type = "application/json"),
    responses((status = 200, description = "Payment sent", body = PaymentResult))
)]
pub async fn pay_invoice(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<PayInvoiceParams>,
) -> Result<Json<PaymentResult>, ApiError> {
    body.validate()?;

    let result = ctx.phoenixd.active().await.pay_invoice(&body).await?;
    info!(
        payment_id = %result.payment_id,
        recipient_amount_sat = result.recipient_amount_sat,
        "Invoice paid"
    );

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/pay/offer",
    tags = ["payments"],
    request_body(content = PayOfferParams, content_type = "application/json"),
    responses((status = 200, description = "Payment sent", body = PaymentResult))
)]
pub async fn pay_offer(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<PayOfferParams>,
) -> Result<Json<PaymentResult>, ApiError> {
    body.validate()?;

    let result = ctx.phoenixd.active().await.pay_offer(&body).await?;
    info!(
        payment_id = %result.payment_id,
        recipient_amount_sat = result.recipient_amount_sat,
        "Offer paid"
    );

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/pay/lnaddress",
    tags = ["payments"],
    request_body(content = PayLnAddressParams, content_type = "application/json"),
    responses((status = 200, description = "Payment sent", body = PaymentResult))
)]
pub async fn pay_ln_address(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<PayLnAddressParams>,
) -> Result<Json<PaymentResult>, ApiError> {
    body.validate()?;

    let result = ctx.phoenixd.active().await.pay_ln_address(&body).await?;
    info!(payment_id = %result.payment_id, address = %body.address, "Lightning address paid");

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/send",
    tags = ["payments"],
    request_body(content = SendToAddressParams, content_type = "application/json"),
    responses((status = 200, description = "On-chain transaction published", body = TransactionId))
)]
pub async fn send_to_address(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<SendToAddressParams>,
) -> Result<Json<TransactionId>, ApiError> {
    body.validate()?;

    let tx_id = ctx.phoenixd.active().await.send_to_address(&body).await?;
    info!(%tx_id, amount_sat = body.amount_sat, "On-chain payment sent");

    Ok(Json(TransactionId { tx_id }))
}
