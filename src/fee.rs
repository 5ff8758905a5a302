//! Value arithmetic: the fee/tax computation (I5) and the amount-as-nonce
//! encoding that disambiguates concurrent orders (spec §4.1, §9).

use rand::Rng;

/// The token's smallest-unit precision: 8 decimal digits, matching the
/// original `ETH_TNC_DECIAMLS` constant.
pub const DECIMALS: u32 = 8;

/// `send_value = value - floor(value * tax_rate)` (invariant I5).
///
/// `tax_rate` is the fee fraction for the source -> dest direction (e.g.
/// `0.001` for 0.1%). Returns `(send_value, tax_cost)`.
pub fn apply_tax(value: i64, tax_rate: f64) -> (i64, i64) {
    debug_assert!(value >= 0);
    let tax_cost = ((value as f64) * tax_rate).floor() as i64;
    let send_value = value - tax_cost;
    (send_value, tax_cost)
}

/// Convert a user-facing decimal amount (e.g. `100.0` tokens) to the
/// persisted smallest-unit integer, salted with a random nonce in
/// `[1, 9999]` to disambiguate otherwise-identical concurrent orders.
///
/// This is the ONLY collision-avoidance mechanism for two orders from the
/// same user with the same nominal amount; the matcher relies on the exact
/// equality this produces never colliding in practice.
pub fn encode_value_with_nonce(requested_value: f64) -> i64 {
    let mut rng = rand::thread_rng();
    let nonce: i64 = rng.gen_range(1..=9999);
    encode_value_with_given_nonce(requested_value, nonce)
}

/// Same as [`encode_value_with_nonce`] but with an explicit nonce, for
/// deterministic testing.
pub fn encode_value_with_given_nonce(requested_value: f64, nonce: i64) -> i64 {
    debug_assert!((1..=9999).contains(&nonce));
    let fixed = (requested_value * 10f64.powi(DECIMALS as i32)).floor() as i64;
    fixed + nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_and_send_value_sum_to_original() {
        let (send_value, tax_cost) = apply_tax(10_000_000_0314, 0.001);
        assert_eq!(send_value + tax_cost, 10_000_000_0314);
    }

    #[test]
    fn tax_is_floor_of_fraction() {
        let (send_value, tax_cost) = apply_tax(1000, 0.001);
        assert_eq!(tax_cost, 1); // floor(1000 * 0.001) = 1
        assert_eq!(send_value, 999);
    }

    #[test]
    fn zero_tax_rate_is_identity() {
        let (send_value, tax_cost) = apply_tax(12345, 0.0);
        assert_eq!(send_value, 12345);
        assert_eq!(tax_cost, 0);
    }

    #[test]
    fn nonce_is_low_order_digits() {
        let v = encode_value_with_given_nonce(100.0, 314);
        assert_eq!(v, 10_000_000_0314);
        let v2 = encode_value_with_given_nonce(100.0, 712);
        assert_eq!(v2, 10_000_000_0712);
        assert_ne!(v, v2);
    }

    #[test]
    fn random_nonce_is_in_range() {
        for _ in 0..100 {
            let v = encode_value_with_nonce(1.0);
            let fixed = 10_000_000i64;
            let nonce = v - fixed;
            assert!((1..=9999).contains(&nonce), "nonce {nonce} out of range");
        }
    }
}
