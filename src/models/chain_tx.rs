use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Which chain a value refers to. Chain-A is the account/nonce model
/// (EVM-style); Chain-N is the UTXO/invocation model (NEO-style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainSide {
    A = 1,
    N = 2,
}

impl ChainSide {
    pub fn opposite(self) -> ChainSide {
        match self {
            ChainSide::A => ChainSide::N,
            ChainSide::N => ChainSide::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChainSide::A => "A",
            ChainSide::N => "N",
        }
    }

    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(n: i16) -> anyhow::Result<Self> {
        match n {
            1 => Ok(ChainSide::A),
            2 => Ok(ChainSide::N),
            other => Err(anyhow::anyhow!("invalid chain side discriminant: {other}")),
        }
    }
}

/// A row from a chain's transaction table, supplied by the external indexer.
/// Read-only to the bridge.
#[derive(Debug, Clone, FromRow)]
pub struct ChainTx {
    pub id: i64,
    pub tx: String,
    pub from_addr: String,
    pub to_addr: String,
    pub asset: String,
    pub value: i64,
    pub block: i64,
    pub create_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involutive() {
        assert_eq!(ChainSide::A.opposite(), ChainSide::N);
        assert_eq!(ChainSide::N.opposite(), ChainSide::A);
        assert_eq!(ChainSide::A.opposite().opposite(), ChainSide::A);
    }

    #[test]
    fn roundtrips_through_i16() {
        assert_eq!(ChainSide::from_i16(ChainSide::A.as_i16()).unwrap(), ChainSide::A);
        assert_eq!(ChainSide::from_i16(ChainSide::N.as_i16()).unwrap(), ChainSide::N);
        assert!(ChainSide::from_i16(7).is_err());
    }
}
