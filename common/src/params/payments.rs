use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{ParamError, require_non_empty, require_positive};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceParams {
    pub description: String,

    /// Omit for an amountless invoice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_sat: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_seconds: Option<u64>,
}

impl CreateInvoiceParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if let Some(amount) = self.amount_sat {
            require_positive("amountSat", amount)?;
        }
        if let Some(expiry) = self.expiry_seconds {
            require_positive("expirySeconds", expiry)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayInvoiceParams {
    pub invoice: String,

    /// Required for amountless invoices, ignored otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_sat: Option<u64>,
}

impl PayInvoiceParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        require_non_empty("invoice", &self.invoice)?;
        if let Some(amount) = self.amount_sat {
            require_positive("amountSat", amount)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayOfferParams {
    pub offer: String,
    pub amount_sat: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PayOfferParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        require_non_empty("offer", &self.offer)?;
        require_positive("amountSat", self.amount_sat)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayLnAddressParams {
    pub address: String,
    pub amount_sat: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PayLnAddressParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        require_non_empty("address", &self.address)?;
        if !self.address.contains('@') {
            return Err(ParamError::new("address", "expected user@domain"));
        }
        require_positive("amountSat", self.amount_sat)
    }
}

/// On-chain send from the node's balance.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendToAddressParams {
    pub address: String,
    pub amount_sat: u64,
    pub feerate_sat_byte: u64,
}

impl SendToAddressParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        require_non_empty("address", &self.address)?;
        require_positive("amountSat", self.amount_sat)?;
        require_positive("feerateSatByte", self.feerate_sat_byte)
    }
}

/// Filters for listing payments. Timestamps are milliseconds since the epoch.
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListPaymentsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,

    /// Include unpaid and failed payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<bool>,

    /// Only incoming payments carry an external id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl ListPaymentsParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ParamError::new("from", "must not be after `to`"));
            }
        }
        Ok(())
    }
}

/// Checks a payment hash or payment id taken from a request path.
///
/// The value ends up as a path segment of a phoenixd URL, so only ASCII
/// letters, digits and `-` are accepted. That covers hex payment hashes and
/// UUID payment ids.
pub fn validate_payment_key(field: &'static str, value: &str) -> Result<(), ParamError> {
    require_non_empty(field, value)?;
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ParamError::new(
            field,
            "may only contain letters, digits and `-`",
        ));
    }
    Ok(())
}
