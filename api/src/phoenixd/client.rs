use std::time::Duration;

use pdash_common::{
    params::{
        BumpFeeParams, CloseChannelParams, CreateInvoiceParams, DecodeInvoiceParams,
        DecodeOfferParams, EstimateFeesParams, ListPaymentsParams, PayInvoiceParams,
        PayLnAddressParams, PayOfferParams, SendToAddressParams,
    },
    views::{
        Balance, Channel, CreatedInvoice, DecodedInvoice, DecodedOffer, IncomingPayment,
        LiquidityFees, NodeInfo, OutgoingPayment, PaymentResult,
    },
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use super::{PhoenixdConnection, PhoenixdError};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP client for one phoenixd instance.
///
/// phoenixd takes form encoded bodies and answers with JSON, except for calls
/// that publish a transaction or return a single string, which answer with
/// plain text.
#[derive(Debug, Clone)]
pub struct PhoenixdClient {
    connection: PhoenixdConnection,
    client: Client,
}

impl PhoenixdClient {
    pub fn new(connection: PhoenixdConnection, timeout: Duration) -> Result<Self, PhoenixdError> {
        let client = Client::builder()
            .user_agent(format!("pdash-api/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { connection, client })
    }

    pub fn connection(&self) -> &PhoenixdConnection {
        &self.connection
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, PhoenixdError> {
        let response = request
            .basic_auth("", Some(self.connection.password()))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(PhoenixdError::Unauthorized),
            StatusCode::NOT_FOUND => Err(PhoenixdError::NotFound),
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = match body.trim() {
                    "" => status.canonical_reason().unwrap_or("error").to_string(),
                    text => text.to_string(),
                };
                Err(PhoenixdError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn url_with_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<String, PhoenixdError> {
        let query = serde_urlencoded::to_string(query)
            .map_err(|e| PhoenixdError::Client(format!("failed to encode query: {e}")))?;
        let url = self.connection.endpoint(path);

        Ok(if query.is_empty() {
            url
        } else {
            format!("{url}?{query}")
        })
    }

    async fn get(&self, path: &str) -> Result<Response, PhoenixdError> {
        debug!(path, "GET phoenixd");
        self.send(self.client.get(self.connection.endpoint(path)))
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PhoenixdError> {
        Ok(self.get(path).await?.json::<T>().await?)
    }

    async fn get_json_query<Q, T>(&self, path: &str, query: &Q) -> Result<T, PhoenixdError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_with_query(path, query)?;
        debug!(%url, "GET phoenixd");
        Ok(self.send(self.client.get(url)).await?.json::<T>().await?)
    }

    async fn get_text(&self, path: &str) -> Result<String, PhoenixdError> {
        Ok(self.get(path).await?.text().await?.trim().to_string())
    }

    async fn post_form<F: Serialize + ?Sized>(
        &self,
        path: &str,
        form: &F,
    ) -> Result<Response, PhoenixdError> {
        let body = serde_urlencoded::to_string(form)
            .map_err(|e| PhoenixdError::Client(format!("failed to encode form: {e}")))?;

        debug!(path, "POST phoenixd");
        self.send(
            self.client
                .post(self.connection.endpoint(path))
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body),
        )
        .await
    }

    async fn post_form_json<F, T>(&self, path: &str, form: &F) -> Result<T, PhoenixdError>
    where
        F: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Ok(self.post_form(path, form).await?.json::<T>().await?)
    }

    async fn post_form_text<F: Serialize + ?Sized>(
        &self,
        path: &str,
        form: &F,
    ) -> Result<String, PhoenixdError> {
        Ok(self.post_form(path, form).await?.text().await?.trim().to_string())
    }

    #[instrument(skip(self), fields(url = self.connection.url()))]
    pub async fn get_info(&self) -> Result<NodeInfo, PhoenixdError> {
        self.get_json("/getinfo").await
    }

    pub async fn get_balance(&self) -> Result<Balance, PhoenixdError> {
        self.get_json("/getbalance").await
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>, PhoenixdError> {
        self.get_json("/listchannels").await
    }

    /// Returns the id of the closing transaction.
    #[instrument(skip(self, params), fields(channel_id = %params.channel_id))]
    pub async fn close_channel(
        &self,
        params: &CloseChannelParams,
    ) -> Result<String, PhoenixdError> {
        self.post_form_text("/closechannel", params).await
    }

    pub async fn estimate_liquidity_fees(
        &self,
        params: &EstimateFeesParams,
    ) -> Result<LiquidityFees, PhoenixdError> {
        self.get_json_query("/estimateliquidityfees", params).await
    }

    /// Returns the id of the child transaction.
    pub async fn bump_fee(&self, params: &BumpFeeParams) -> Result<String, PhoenixdError> {
        self.post_form_text("/bumpfee", params).await
    }

    pub async fn get_offer(&self) -> Result<String, PhoenixdError> {
        self.get_text("/getoffer").await
    }

    pub async fn get_ln_address(&self) -> Result<String, PhoenixdError> {
        self.get_text("/getlnaddress").await
    }

    pub async fn create_invoice(
        &self,
        params: &CreateInvoiceParams,
    ) -> Result<CreatedInvoice, PhoenixdError> {
        self.post_form_json("/createinvoice", params).await
    }

    #[instrument(skip(self, params))]
    pub async fn pay_invoice(
        &self,
        params: &PayInvoiceParams,
    ) -> Result<PaymentResult, PhoenixdError> {
        self.post_form_json("/payinvoice", params).await
    }

    #[instrument(skip(self, params))]
    pub async fn pay_offer(&self, params: &PayOfferParams) -> Result<PaymentResult, PhoenixdError> {
        self.post_form_json("/payoffer", params).await
    }

    #[instrument(skip(self, params), fields(address = %params.address))]
    pub async fn pay_ln_address(
        &self,
        params: &PayLnAddressParams,
    ) -> Result<PaymentResult, PhoenixdError> {
        self.post_form_json("/paylnaddress", params).await
    }

    /// Returns the id of the published transaction.
    #[instrument(skip(self, params), fields(address = %params.address))]
    pub async fn send_to_address(
        &self,
        params: &SendToAddressParams,
    ) -> Result<String, PhoenixdError> {
        self.post_form_text("/sendtoaddress", params).await
    }

    pub async fn list_incoming_payments(
        &self,
        params: &ListPaymentsParams,
    ) -> Result<Vec<IncomingPayment>, PhoenixdError> {
        self.get_json_query("/payments/incoming", params).await
    }

    pub async fn get_incoming_payment(
        &self,
        payment_hash: &str,
    ) -> Result<IncomingPayment, PhoenixdError> {
        self.get_json(&format!("/payments/incoming/{payment_hash}"))
            .await
    }

    pub async fn list_outgoing_payments(
        &self,
        params: &ListPaymentsParams,
    ) -> Result<Vec<OutgoingPayment>, PhoenixdError> {
        // phoenixd only filters incoming payments by external id
        let params = ListPaymentsParams {
            external_id: None,
            ..params.clone()
        };
        self.get_json_query("/payments/outgoing", &params).await
    }

    pub async fn get_outgoing_payment(
        &self,
        payment_id: &str,
    ) -> Result<OutgoingPayment, PhoenixdError> {
        self.get_json(&format!("/payments/outgoing/{payment_id}"))
            .await
    }

    pub async fn decode_invoice(
        &self,
        params: &DecodeInvoiceParams,
    ) -> Result<DecodedInvoice, PhoenixdError> {
        self.post_form_json("/decodeinvoice", params).await
    }

    pub async fn decode_offer(
        &self,
        params: &DecodeOfferParams,
    ) -> Result<DecodedOffer, PhoenixdError> {
        self.post_form_json("/decodeoffer", params).await
    }
}

#[cfg(test)]
mod tests {
    use httptest::{
        Expectation, Server, all_of,
        matchers::{contains, key, not, request, url_decoded},
        responders::{json_encoded, status_code},
    };
    use serde_json::json;

    use super::*;

    fn client_for(server: &Server) -> PhoenixdClient {
        let connection = PhoenixdConnection::local(server.url_str("/"), "secret");
        PhoenixdClient::new(connection, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn get_balance_sends_basic_auth() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/getbalance"),
                request::headers(contains(("authorization", "Basic OnNlY3JldA=="))),
            ])
            .respond_with(json_encoded(json!({ "balanceSat": 5000, "feeCreditSat": 12 }))),
        );

        let balance = client_for(&server).get_balance().await.unwrap();
        assert_eq!(
            balance,
            Balance {
                balance_sat: 5000,
                fee_credit_sat: 12
            }
        );
    }

    #[tokio::test]
    async fn close_channel_posts_form_and_reads_txid() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/closechannel"),
                request::body(url_decoded(contains(("channelId", "c0ffee")))),
                request::body(url_decoded(contains(("feerateSatByte", "9")))),
            ])
            .respond_with(status_code(200).body("  b4d7e1\n")),
        );

        let tx_id = client_for(&server)
            .close_channel(&CloseChannelParams {
                channel_id: "c0ffee".into(),
                address: "bc1qtest".into(),
                feerate_sat_byte: 9,
            })
            .await
            .unwrap();

        assert_eq!(tx_id, "b4d7e1");
    }

    #[tokio::test]
    async fn estimate_fees_sends_query() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/estimateliquidityfees"),
                request::query(url_decoded(contains(("amountSat", "100000")))),
            ])
            .respond_with(json_encoded(json!({ "miningFeeSat": 600, "serviceFeeSat": 1000 }))),
        );

        let fees = client_for(&server)
            .estimate_liquidity_fees(&EstimateFeesParams { amount_sat: 100_000 })
            .await
            .unwrap();

        assert_eq!(fees.mining_fee_sat, 600);
        assert_eq!(fees.service_fee_sat, 1000);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/getinfo"))
                .respond_with(status_code(401)),
        );

        let err = client_for(&server).get_info().await.unwrap_err();
        assert!(matches!(err, PhoenixdError::Unauthorized));
    }

    #[tokio::test]
    async fn rejection_carries_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/decodeinvoice"))
                .respond_with(status_code(400).body("invalid invoice")),
        );

        let err = client_for(&server)
            .decode_invoice(&DecodeInvoiceParams {
                invoice: "lnbc1garbage".into(),
            })
            .await
            .unwrap_err();

        match err {
            PhoenixdError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid invoice");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn outgoing_listing_drops_external_id() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/payments/outgoing"),
                request::query(url_decoded(contains(("limit", "5")))),
                request::query(url_decoded(not(contains(key("externalId"))))),
            ])
            .respond_with(json_encoded(json!([]))),
        );

        let payments = client_for(&server)
            .list_outgoing_payments(&ListPaymentsParams {
                limit: Some(5),
                external_id: Some("order-1".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(payments.is_empty());
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let connection = PhoenixdConnection::local("http://127.0.0.1:1", "secret");
        let client = PhoenixdClient::new(connection, Duration::from_secs(2)).unwrap();

        let err = client.get_balance().await.unwrap_err();
        assert!(matches!(err, PhoenixdError::Unreachable(_)));
    }
}
