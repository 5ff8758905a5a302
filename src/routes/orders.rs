//! The bridge's public HTTP surface: `POST /trade`, `GET /trade/:tx`,
//! `GET /log/:tx`, `GET /tradeinfo`. Grounded in the original
//! `web.go::CreateOrder`/`GetOrder`/`GetOrderLog`/`TradeInfo`, translated
//! from gin's uniform `{Code, Error, Data}` envelope into axum handlers
//! returning the same shape.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fee;
use crate::models::ChainSide;
use crate::utils::validation::{validate_chain_a_address, validate_chain_n_address};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trade", post(create_order))
        .route("/trade/:tx", get(get_order))
        .route("/log/:tx", get(get_order_log))
        .route("/tradeinfo", get(trade_info))
}

/// Uniform response envelope matching the original's `Response{Code, Error,
/// Data}`: `code = 0` is success, nonzero is failure, with `error` carrying
/// the message.
#[derive(Serialize)]
struct Envelope<T: Serialize> {
    code: i32,
    error: String,
    data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    fn ok(data: T) -> Json<Envelope<T>> {
        Json(Envelope { code: 0, error: String::new(), data: Some(data) })
    }
}

fn fail<T: Serialize>(message: impl Into<String>) -> Json<Envelope<T>> {
    Json(Envelope { code: 1, error: message.into(), data: None })
}

#[derive(Deserialize)]
struct CreateOrderParams {
    from: String,
    to: String,
    value: String,
}

#[derive(Serialize)]
struct CreateOrderResponse {
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Value")]
    value: String,
    #[serde(rename = "TX")]
    tx: String,
    #[serde(rename = "CreateTime")]
    create_time: i64,
}

/// Generates an opaque order id. The original used a Snowflake node; this
/// crate has no such dependency in its stack, so a random 16-byte hex
/// string (keyed off the same `rand` crate the nonce encoding already uses)
/// fills the same role: unique, URL-safe, and unguessable enough for a
/// lookup key.
fn generate_tx_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

async fn create_order(
    State(state): State<AppState>,
    Query(params): Query<CreateOrderParams>,
) -> Json<Envelope<CreateOrderResponse>> {
    let amount: f64 = match params.value.parse() {
        Ok(v) => v,
        Err(_) => return fail("value must be a number"),
    };

    if amount > state.config.max_amount {
        return fail(format!(
            "amount too large, max amount: {}",
            state.config.max_amount
        ));
    }
    if amount < state.config.limit_amount {
        return fail(format!(
            "amount must over {}",
            state.config.limit_amount
        ));
    }
    if params.from.is_empty() || params.to.is_empty() || amount <= 0.0 {
        return fail("param error");
    }

    // The deposit side is whichever of `from`/`to` is chain-A formatted;
    // the counterparty address must then be chain-N formatted. Matches the
    // original's asymmetric `from`-first address-format dispatch.
    let (from, to, deposit_side) = if validate_chain_a_address(&params.from) {
        if !validate_chain_n_address(&params.to) {
            return fail("address error");
        }
        (params.from.to_lowercase(), params.to.clone(), ChainSide::A)
    } else if validate_chain_a_address(&params.to) {
        if !validate_chain_n_address(&params.from) {
            return fail("address error");
        }
        (params.from.clone(), params.to.to_lowercase(), ChainSide::N)
    } else {
        return fail("address error");
    };

    let value = fee::encode_value_with_nonce(amount);
    if value < 0 {
        return fail("amount param error");
    }

    let tx = generate_tx_id();

    let order = match state.store.create_order(&tx, &from, &to, value).await {
        Ok(order) => order,
        Err(e) => return fail(e.to_string()),
    };

    let address = match deposit_side {
        ChainSide::A => state.chain_a_address.clone(),
        ChainSide::N => state.chain_n_address.clone(),
    };

    Envelope::ok(CreateOrderResponse {
        address,
        value: order.value.to_string(),
        tx: order.tx,
        create_time: order.create_time.timestamp(),
    })
}

async fn get_order(State(state): State<AppState>, Path(tx): Path<String>) -> Json<Envelope<Value>> {
    match state.store.get_order_by_tx(&tx).await {
        Ok(order) => match serde_json::to_value(&OrderView::from(&order)) {
            Ok(v) => Envelope::ok(v),
            Err(e) => fail(e.to_string()),
        },
        Err(e) => fail(e.to_string()),
    }
}

async fn get_order_log(State(state): State<AppState>, Path(tx): Path<String>) -> Json<Envelope<Value>> {
    match state.store.get_logs_for_tx(&tx).await {
        Ok(logs) => match serde_json::to_value(&logs.iter().map(LogView::from).collect::<Vec<_>>()) {
            Ok(v) => Envelope::ok(v),
            Err(e) => fail(e.to_string()),
        },
        Err(e) => fail(e.to_string()),
    }
}

async fn trade_info(State(state): State<AppState>) -> Json<Envelope<TradeInfoResponse>> {
    Envelope::ok(TradeInfoResponse {
        limit_amount: state.config.limit_amount,
        max_amount: state.config.max_amount,
        eth2neotax: state.config.a_to_n_tax,
        neo2ethtax: state.config.n_to_a_tax,
    })
}

#[derive(Serialize)]
struct TradeInfoResponse {
    #[serde(rename = "limitAmount")]
    limit_amount: f64,
    #[serde(rename = "maxAmount")]
    max_amount: f64,
    eth2neotax: f64,
    neo2ethtax: f64,
}

#[derive(Serialize)]
struct OrderView {
    #[serde(rename = "TX")]
    tx: String,
    #[serde(rename = "From")]
    from: String,
    #[serde(rename = "To")]
    to: String,
    #[serde(rename = "Value")]
    value: String,
    #[serde(rename = "InTX")]
    in_tx: Option<String>,
    #[serde(rename = "OutTX")]
    out_tx: Option<String>,
    #[serde(rename = "CreateTime")]
    create_time: i64,
}

impl From<&crate::models::Order> for OrderView {
    fn from(order: &crate::models::Order) -> Self {
        Self {
            tx: order.tx.clone(),
            from: order.from_addr.clone(),
            to: order.to_addr.clone(),
            value: order.value.to_string(),
            in_tx: order.in_tx.clone(),
            out_tx: order.out_tx.clone(),
            create_time: order.create_time.timestamp(),
        }
    }
}

#[derive(Serialize)]
struct LogView {
    #[serde(rename = "TX")]
    tx: String,
    #[serde(rename = "Content")]
    content: String,
    #[serde(rename = "CreateTime")]
    create_time: i64,
}

impl From<&crate::models::Log> for LogView {
    fn from(log: &crate::models::Log) -> Self {
        Self {
            tx: log.order_tx.clone(),
            content: log.content.clone(),
            create_time: log.create_time.timestamp(),
        }
    }
}
