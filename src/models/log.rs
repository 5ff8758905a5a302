use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Append-only, human-readable order transition log, keyed by `order.tx`.
#[derive(Debug, Clone, FromRow)]
pub struct Log {
    pub id: i64,
    pub order_tx: String,
    pub create_time: DateTime<Utc>,
    pub content: String,
}
