use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::chain_tx::ChainSide;

/// A work item representing the obligation to broadcast one outbound
/// settlement tx. Inserted by the matcher on an Order's Open -> Funded
/// transition.
#[derive(Debug, Clone, FromRow)]
pub struct SendOrder {
    pub id: i64,
    pub order_tx: String,
    pub to_addr: String,
    pub value: i64,
    pub to_type: i16,
    pub status: i16,
    pub out_tx: Option<String>,
    pub retry: i32,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOrderStatus {
    New,
    Confirmed,
    PendingReplace,
    Sent,
}

/// Gas-escalation retry counter is capped at this value; `1.1^RETRY_CAP` is
/// therefore the maximum gas multiplier on chain A.
pub const RETRY_CAP: i32 = 10;

impl SendOrderStatus {
    pub fn code(self) -> i16 {
        match self {
            SendOrderStatus::New => 0,
            SendOrderStatus::Confirmed => 1,
            SendOrderStatus::Sent => 2,
            SendOrderStatus::PendingReplace => -1,
        }
    }

    pub fn from_code(code: i16) -> anyhow::Result<Self> {
        match code {
            0 => Ok(SendOrderStatus::New),
            1 => Ok(SendOrderStatus::Confirmed),
            2 => Ok(SendOrderStatus::Sent),
            -1 => Ok(SendOrderStatus::PendingReplace),
            other => Err(anyhow::anyhow!("invalid send order status code: {other}")),
        }
    }

    /// Any status other than `Confirmed` is eligible to transition to
    /// `Confirmed` when the outbound tx is observed on-chain -- see §9's
    /// note that the original only allowed this from `Sent`.
    pub fn is_terminal(self) -> bool {
        matches!(self, SendOrderStatus::Confirmed)
    }
}

impl SendOrder {
    pub fn status(&self) -> anyhow::Result<SendOrderStatus> {
        SendOrderStatus::from_code(self.status)
    }

    pub fn to_type(&self) -> anyhow::Result<ChainSide> {
        ChainSide::from_i16(self.to_type)
    }
}

/// Gas multiplier for retry attempt `retry`, capped at `RETRY_CAP`.
pub fn gas_multiplier(retry: i32) -> f64 {
    1.1_f64.powi(retry.min(RETRY_CAP))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_roundtrip() {
        for s in [
            SendOrderStatus::New,
            SendOrderStatus::Confirmed,
            SendOrderStatus::Sent,
            SendOrderStatus::PendingReplace,
        ] {
            assert_eq!(SendOrderStatus::from_code(s.code()).unwrap(), s);
        }
    }

    #[test]
    fn gas_multiplier_saturates_at_cap() {
        let at_cap = gas_multiplier(RETRY_CAP);
        let beyond_cap = gas_multiplier(RETRY_CAP + 5);
        assert!((at_cap - beyond_cap).abs() < 1e-9);
        assert!((at_cap - 1.1_f64.powi(10)).abs() < 1e-9);
    }

    #[test]
    fn gas_multiplier_grows_with_retry() {
        assert!(gas_multiplier(1) > gas_multiplier(0));
        assert!(gas_multiplier(2) > gas_multiplier(1));
    }

    #[test]
    fn only_confirmed_is_terminal() {
        assert!(SendOrderStatus::Confirmed.is_terminal());
        assert!(!SendOrderStatus::New.is_terminal());
        assert!(!SendOrderStatus::Sent.is_terminal());
        assert!(!SendOrderStatus::PendingReplace.is_terminal());
    }
}
