use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A user intent persisted at intake time, binding `(from, to, value)` to a
/// unique bridge id.
///
/// State is implicit in `(in_tx, out_tx)`:
///   - `(None, None)`   -> Open
///   - `(Some, None)`   -> Funded
///   - `(Some, Some)`   -> Settled
/// `(None, Some)` is never constructed; see [`Order::state`].
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: i64,
    pub tx: String,
    pub from_addr: String,
    pub to_addr: String,
    pub value: i64,
    pub send_value: Option<i64>,
    pub tax_cost: Option<i64>,
    pub in_tx: Option<String>,
    pub out_tx: Option<String>,
    pub create_time: DateTime<Utc>,
    pub completed_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Open,
    Funded,
    Settled,
}

impl Order {
    /// Derive the implicit lifecycle state from `(in_tx, out_tx)`.
    ///
    /// `(None, Some)` never occurs in practice (enforced by the matcher's
    /// queries), but if it somehow did this treats it as `Open` rather than
    /// panicking -- callers that care about I2 should assert it directly.
    pub fn state(&self) -> OrderState {
        match (&self.in_tx, &self.out_tx) {
            (None, None) => OrderState::Open,
            (Some(_), None) => OrderState::Funded,
            (Some(_), Some(_)) => OrderState::Settled,
            (None, Some(_)) => OrderState::Open,
        }
    }

    /// I2: `in_tx = None` implies `out_tx = None`.
    pub fn upholds_i2(&self) -> bool {
        self.in_tx.is_some() || self.out_tx.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(in_tx: Option<&str>, out_tx: Option<&str>) -> Order {
        Order {
            id: 1,
            tx: "tx1".into(),
            from_addr: "from".into(),
            to_addr: "to".into(),
            value: 100,
            send_value: None,
            tax_cost: None,
            in_tx: in_tx.map(String::from),
            out_tx: out_tx.map(String::from),
            create_time: Utc::now(),
            completed_time: None,
        }
    }

    #[test]
    fn state_transitions() {
        assert_eq!(base(None, None).state(), OrderState::Open);
        assert_eq!(base(Some("a"), None).state(), OrderState::Funded);
        assert_eq!(base(Some("a"), Some("b")).state(), OrderState::Settled);
    }

    #[test]
    fn i2_holds_for_reachable_states() {
        assert!(base(None, None).upholds_i2());
        assert!(base(Some("a"), None).upholds_i2());
        assert!(base(Some("a"), Some("b")).upholds_i2());
        assert!(!base(None, Some("b")).upholds_i2());
    }
}
