use regex::Regex;
use std::sync::OnceLock;

use crate::models::ChainSide;

/// Validate a blockchain address for the given side of the bridge.
pub fn validate_address(side: ChainSide, address: &str) -> bool {
    match side {
        ChainSide::A => validate_chain_a_address(address),
        ChainSide::N => validate_chain_n_address(address),
    }
}

/// Chain A: account-model (EVM-style), 0x-prefixed 40-hex-character address.
pub fn validate_chain_a_address(addr: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap());
    re.is_match(addr)
}

/// Chain N: invocation-model (NEO-style), base58check address starting
/// with `A`, 34 characters.
pub fn validate_chain_n_address(addr: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^A[1-9A-HJ-NP-Za-km-z]{33}$").unwrap());
    re.is_match(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_a_valid() {
        assert!(validate_chain_a_address(
            "0xdAC17F958D2ee523a2206206994597C13D831ec7"
        ));
    }

    #[test]
    fn chain_a_invalid_no_prefix() {
        assert!(!validate_chain_a_address(
            "dAC17F958D2ee523a2206206994597C13D831ec7"
        ));
    }

    #[test]
    fn chain_a_invalid_wrong_length() {
        assert!(!validate_chain_a_address("0xdeadbeef"));
    }

    #[test]
    fn chain_n_valid() {
        assert!(validate_chain_n_address("AK2nJJpJr6o664CWBsEbyVrMcqM2YkcFFo"));
    }

    #[test]
    fn chain_n_invalid_wrong_prefix() {
        assert!(!validate_chain_n_address("Zk2nJJpJr6o664CWBsEbyVrMcqM2YkcFFo"));
    }

    #[test]
    fn dispatch_by_side() {
        assert!(validate_address(
            ChainSide::A,
            "0xdAC17F958D2ee523a2206206994597C13D831ec7"
        ));
        assert!(validate_address(
            ChainSide::N,
            "AK2nJJpJr6o664CWBsEbyVrMcqM2YkcFFo"
        ));
        assert!(!validate_address(ChainSide::A, "AK2nJJpJr6o664CWBsEbyVrMcqM2YkcFFo"));
    }
}
