use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{ParamError, require_non_empty, require_positive};

/// Mutual close of a channel, sweeping funds to `address`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloseChannelParams {
    pub channel_id: String,

    /// On-chain address receiving the channel balance.
    pub address: String,

    pub feerate_sat_byte: u64,
}

impl CloseChannelParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        require_non_empty("channelId", &self.channel_id)?;
        require_non_empty("address", &self.address)?;
        require_positive("feerateSatByte", self.feerate_sat_byte)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EstimateFeesParams {
    /// Amount of inbound liquidity to price, in satoshis.
    pub amount_sat: u64,
}

impl EstimateFeesParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        require_positive("amountSat", self.amount_sat)
    }
}

/// Bumps the fee of unconfirmed channel transactions (CPFP).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BumpFeeParams {
    pub feerate_sat_byte: u64,
}

impl BumpFeeParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        require_positive("feerateSatByte", self.feerate_sat_byte)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DecodeInvoiceParams {
    pub invoice: String,
}

impl DecodeInvoiceParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        require_non_empty("invoice", &self.invoice)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DecodeOfferParams {
    pub offer: String,
}

impl DecodeOfferParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        require_non_empty("offer", &self.offer)
    }
}
