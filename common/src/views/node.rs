use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Summary of the node as reported by phoenixd `getinfo`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub node_id: String,

    #[serde(default)]
    pub channels: Vec<ChannelSummary>,

    pub chain: String,
    pub block_height: u64,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub state: String,
    pub channel_id: String,

    #[serde(default)]
    pub balance_sat: u64,

    #[serde(default)]
    pub inbound_liquidity_sat: u64,

    #[serde(default)]
    pub capacity_sat: u64,

    pub funding_tx_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub balance_sat: u64,
    pub fee_credit_sat: u64,
}

/// Full channel record from phoenixd `listchannels`. The layout follows
/// phoenixd's internal channel state and is forwarded untouched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct Channel(pub Value);

impl Channel {
    /// The channel id, wherever the current channel state keeps it.
    pub fn channel_id(&self) -> Option<&str> {
        self.0
            .get("channelId")
            .or_else(|| self.0.pointer("/commitments/params/channelId"))
            .or_else(|| self.0.pointer("/commitments/channelId"))
            .and_then(Value::as_str)
    }

    /// The short state name, e.g. `Normal` for
    /// `fr.acinq.lightning.channel.states.Normal`.
    pub fn state(&self) -> Option<&str> {
        self.0
            .get("type")
            .or_else(|| self.0.get("state"))
            .and_then(Value::as_str)
            .map(|s| s.rsplit('.').next().unwrap_or(s))
    }
}

/// Fees phoenixd would charge to make `amountSat` of inbound liquidity
/// available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityFees {
    pub mining_fee_sat: u64,
    pub service_fee_sat: u64,
}

/// An on-chain transaction published by phoenixd (channel close, fee bump,
/// on-chain send).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionId {
    pub tx_id: String,
}

/// The node's reusable BOLT12 offer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Offer {
    pub offer: String,
}

/// The node's BIP353 lightning address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LnAddress {
    pub address: String,
}
