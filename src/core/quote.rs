//! Constant-product quote engine (Uniswap V2 pricing)
//!
//! Pure integer math, no I/O:
//!
//! ```text
//! amountInWithFee = amountIn * 997
//! amountOut       = amountInWithFee * reserveOut / (reserveIn * 1000 + amountInWithFee)
//! ```
//!
//! Intermediates are computed in 576 bits so no pair of 256-bit inputs can
//! overflow. Division truncates, matching on-chain behaviour.

use alloy_primitives::{Address, Uint, U256};

use crate::models::types::{PairReserves, QuoteRequest, QuoteResult};
use crate::utils::constants::{FEE_DENOMINATOR, FEE_NUMERATOR};

/// Wide integer for intermediates (256 + 10 + 256 bits fit comfortably)
type Wide = Uint<576, 9>;

fn widen(value: U256) -> Wide {
    let mut limbs = [0u64; 9];
    limbs[..4].copy_from_slice(value.as_limbs());
    Wide::from_limbs(limbs)
}

fn narrow(value: Wide) -> U256 {
    let limbs = value.as_limbs();
    debug_assert!(limbs[4..].iter().all(|l| *l == 0));
    U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]])
}

/// Order the pool's reserves as `(reserve_in, reserve_out)` for a swap that
/// sells `token_from`.
///
/// Only `token0` is consulted: if it is not `token_from` the reserves are
/// swapped, whatever `token_to` is.
pub fn reconcile_reserves(token_from: Address, reserves: &PairReserves) -> (U256, U256) {
    if reserves.token0 == token_from {
        (reserves.reserve0, reserves.reserve1)
    } else {
        (reserves.reserve1, reserves.reserve0)
    }
}

/// Output amount for `amount_in` against already-ordered reserves.
///
/// Returns zero for a zero input or an empty side of the pool.
pub fn get_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return U256::ZERO;
    }

    let amount_in_with_fee = widen(amount_in) * Wide::from(FEE_NUMERATOR);
    let numerator = amount_in_with_fee * widen(reserve_out);
    let denominator = widen(reserve_in) * Wide::from(FEE_DENOMINATOR) + amount_in_with_fee;

    // amountOut < reserveOut, so the quotient always fits in 256 bits
    narrow(numerator / denominator)
}

/// Quote a swap against a pool snapshot
pub fn quote(request: &QuoteRequest, reserves: &PairReserves) -> QuoteResult {
    let (reserve_in, reserve_out) = reconcile_reserves(request.token_from, reserves);
    QuoteResult {
        amount_out: get_amount_out(request.amount_in, reserve_in, reserve_out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const TOKEN_X: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const TOKEN_Y: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

    fn u(value: u128) -> U256 {
        U256::from(value)
    }

    #[test]
    fn test_zero_amount_in() {
        for (r_in, r_out) in [(0u128, 0u128), (1, 1), (5_000, 10_000), (u128::MAX, 7)] {
            assert_eq!(get_amount_out(U256::ZERO, u(r_in), u(r_out)), U256::ZERO);
        }
        assert_eq!(get_amount_out(U256::ZERO, U256::MAX, U256::MAX), U256::ZERO);
    }

    #[test]
    fn test_zero_reserves() {
        for amount in [1u128, 1_000, 10u128.pow(30)] {
            assert_eq!(get_amount_out(u(amount), U256::ZERO, u(10_000)), U256::ZERO);
            assert_eq!(get_amount_out(u(amount), u(10_000), U256::ZERO), U256::ZERO);
            assert_eq!(get_amount_out(u(amount), U256::ZERO, U256::ZERO), U256::ZERO);
        }
    }

    #[test]
    fn test_exact_formula() {
        // 997e18 * 2e12 / (1e12 * 1000 + 997e18)
        let out = get_amount_out(u(10u128.pow(18)), u(10u128.pow(12)), u(2 * 10u128.pow(12)));
        assert_eq!(out, u(1_999_997_993_983));

        // 997 * 2000 / (1000 * 1000 + 997) = 1.99.. truncates to 1
        assert_eq!(get_amount_out(u(1), u(1_000), u(2_000)), u(1));

        // tiny input against a deep pool truncates to zero
        assert_eq!(get_amount_out(u(1), u(10u128.pow(18)), u(10u128.pow(18))), U256::ZERO);

        assert_eq!(
            get_amount_out(u(10u128.pow(6)), u(10u128.pow(18)), u(10u128.pow(18))),
            u(996_999)
        );
    }

    #[test]
    fn test_no_overflow_at_max() {
        let out = get_amount_out(U256::MAX, U256::MAX, U256::MAX);
        let expected: U256 =
            "57809070089937028962093275940742035117531384432470526964115779296890030170763"
                .parse()
                .unwrap();
        assert_eq!(out, expected);
        assert!(out < U256::MAX);
    }

    #[test]
    fn test_output_bounded_by_reserve_out() {
        let out = get_amount_out(u(10u128.pow(30)), u(1), u(500));
        assert!(out < u(500));
        assert_eq!(out, u(499));
    }

    #[test]
    fn test_reconcile_reserves() {
        let reserves = PairReserves {
            token0: TOKEN_X,
            reserve0: u(5_000),
            reserve1: u(10_000),
        };
        assert_eq!(reconcile_reserves(TOKEN_X, &reserves), (u(5_000), u(10_000)));
        assert_eq!(reconcile_reserves(TOKEN_Y, &reserves), (u(10_000), u(5_000)));
    }

    #[test]
    fn test_reconciliation_symmetry() {
        let as_x_first = PairReserves {
            token0: TOKEN_X,
            reserve0: u(123_456),
            reserve1: u(789_012),
        };
        let as_y_first = PairReserves {
            token0: TOKEN_Y,
            reserve0: u(789_012),
            reserve1: u(123_456),
        };
        let request = QuoteRequest {
            token_from: TOKEN_X,
            token_to: TOKEN_Y,
            amount_in: u(4_321),
        };
        assert_eq!(quote(&request, &as_x_first), quote(&request, &as_y_first));
        assert!(quote(&request, &as_x_first).amount_out > U256::ZERO);
    }

    #[test]
    fn test_quote_end_to_end() {
        let reserves = PairReserves {
            token0: TOKEN_X,
            reserve0: u(5_000),
            reserve1: u(10_000),
        };
        let request = QuoteRequest {
            token_from: TOKEN_Y,
            token_to: TOKEN_X,
            amount_in: u(1_000),
        };
        assert_eq!(quote(&request, &reserves).amount_out, u(453));
    }
}
