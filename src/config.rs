use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Database
    pub database_url: String,
    pub db_max_connections: u32,

    // Rate limiter backing store
    pub redis_url: String,

    // Chain A (account model, e.g. an EVM chain)
    pub chain_a_node_url: String,
    pub chain_a_tnc: String,
    pub chain_a_keystore_path: String,
    pub chain_a_keystore_password: String,
    pub chain_a_confirm_count: u64,
    pub chain_a_get_block_interval_secs: u64,

    // Chain N (UTXO/invocation model, e.g. NEO)
    pub chain_n_node_url: String,
    pub chain_n_tnc: String,
    pub chain_n_keystore_path: String,
    pub chain_n_keystore_password: String,
    pub chain_n_confirm_count: u64,
    pub chain_n_get_block_interval_secs: u64,

    // Bridge economics
    pub a_to_n_tax: f64,
    pub n_to_a_tax: f64,
    pub limit_amount: f64,
    pub max_amount: f64,

    // Rate limiting (global, per spec §6: "up to `limit` requests per
    // `interval` seconds, global")
    pub rate_limit_requests: u32,
    pub rate_limit_interval_secs: u64,

    // CORS
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: env("HOST", "0.0.0.0"),
            port: env("PORT", "8000").parse().expect("PORT must be a number"),

            database_url: require_env("DATABASE_URL"),
            db_max_connections: env("DB_MAX_CONNECTIONS", "20").parse().unwrap_or(20),

            redis_url: env("REDIS_URL", "redis://127.0.0.1:6379"),

            chain_a_node_url: env("CHAIN_A_NODE_URL", "http://127.0.0.1:8545"),
            chain_a_tnc: require_env("CHAIN_A_TNC"),
            chain_a_keystore_path: require_env("CHAIN_A_KEYSTORE"),
            chain_a_keystore_password: env("CHAIN_A_KEYSTORE_PASSWORD", ""),
            chain_a_confirm_count: env("BRIDGE_A_CONFIRM_COUNT", "12").parse().unwrap_or(12),
            chain_a_get_block_interval_secs: env("BRIDGE_A_BLOCK_INTERVAL", "20")
                .parse()
                .unwrap_or(20),

            chain_n_node_url: env("CHAIN_N_NODE_URL", "http://127.0.0.1:10332"),
            chain_n_tnc: require_env("CHAIN_N_TNC"),
            chain_n_keystore_path: require_env("CHAIN_N_KEYSTORE"),
            chain_n_keystore_password: env("CHAIN_N_KEYSTORE_PASSWORD", ""),
            chain_n_confirm_count: env("BRIDGE_N_CONFIRM_COUNT", "12").parse().unwrap_or(12),
            chain_n_get_block_interval_secs: env("BRIDGE_N_BLOCK_INTERVAL", "10")
                .parse()
                .unwrap_or(10),

            a_to_n_tax: env("BRIDGE_A_TO_N_TAX", "0.001").parse().unwrap_or(0.001),
            n_to_a_tax: env("BRIDGE_N_TO_A_TAX", "0.001").parse().unwrap_or(0.001),
            limit_amount: env("BRIDGE_LIMIT_AMOUNT", "1").parse().unwrap_or(1.0),
            max_amount: env("BRIDGE_MAX_AMOUNT", "100000").parse().unwrap_or(100_000.0),

            rate_limit_requests: env("RATE_LIMIT_REQUESTS", "1000").parse().unwrap_or(1000),
            rate_limit_interval_secs: env("RATE_LIMIT_INTERVAL_SECS", "10")
                .parse()
                .unwrap_or(10),

            cors_origins: env("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port).parse().expect("Invalid address")
    }

    /// Fee rate for a given send direction (the chain being sent *to*).
    pub fn tax_rate_for(&self, to: crate::models::ChainSide) -> f64 {
        match to {
            crate::models::ChainSide::N => self.a_to_n_tax,
            crate::models::ChainSide::A => self.n_to_a_tax,
        }
    }
}

fn env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
