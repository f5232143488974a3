use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A payment received by the node.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomingPayment {
    pub payment_hash: String,
    pub sub_type: Option<String>,
    pub preimage: Option<String>,
    pub external_id: Option<String>,
    pub description: Option<String>,
    pub invoice: Option<String>,
    pub payer_note: Option<String>,
    pub payer_key: Option<String>,

    #[serde(default)]
    pub is_paid: bool,

    #[serde(default)]
    pub received_sat: u64,

    #[serde(default)]
    pub fees: u64,

    pub completed_at: Option<i64>,
    pub created_at: i64,
}

/// A payment sent by the node, over lightning or on-chain.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPayment {
    pub payment_id: String,
    pub sub_type: Option<String>,
    pub payment_hash: Option<String>,
    pub tx_id: Option<String>,
    pub preimage: Option<String>,
    pub invoice: Option<String>,

    #[serde(default)]
    pub is_paid: bool,

    #[serde(default)]
    pub sent: u64,

    #[serde(default)]
    pub fees: u64,

    pub completed_at: Option<i64>,
    pub created_at: i64,
}

/// A freshly created BOLT11 invoice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvoice {
    pub amount_sat: Option<u64>,
    pub payment_hash: String,
    pub serialized: String,
}

/// Outcome of a lightning payment made by the node.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub recipient_amount_sat: u64,
    pub routing_fee_sat: u64,
    pub payment_id: String,
    pub payment_hash: String,
    pub payment_preimage: String,
}

/// A decoded BOLT11 invoice, as phoenixd reports it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct DecodedInvoice(pub Value);

/// A decoded BOLT12 offer, as phoenixd reports it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct DecodedOffer(pub Value);
