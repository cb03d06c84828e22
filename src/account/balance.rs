//! Native-unit balances and their display form

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native units per display unit (10^9).
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Decimal places between native and display units.
const NATIVE_SCALE: u32 = 9;

/// Fraction digits shown on the display surface.
pub const DISPLAY_DECIMALS: u32 = 3;

pub const DISPLAY_SYMBOL: &str = "SOL";

/// Raw balance in native units, as returned by the ledger.
pub type Lamports = u64;

/// A fetched balance, exact in native units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Balance {
    lamports: Lamports,
}

impl Balance {
    pub const fn from_lamports(lamports: Lamports) -> Self {
        Self { lamports }
    }

    pub fn lamports(&self) -> Lamports {
        self.lamports
    }

    /// Display-unit value: lamports / 10^9, without float rounding.
    pub fn to_sol(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.lamports as i128, NATIVE_SCALE)
    }

    /// Fixed-point string with three fraction digits, e.g. `2.500`.
    pub fn display_amount(&self) -> String {
        let rounded = self
            .to_sol()
            .round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.*}", DISPLAY_DECIMALS as usize, rounded)
    }
}

impl From<Lamports> for Balance {
    fn from(lamports: Lamports) -> Self {
        Self::from_lamports(lamports)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.display_amount(), DISPLAY_SYMBOL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_three_digits() {
        let balance = Balance::from_lamports(2_500_000_000);
        assert_eq!(balance.display_amount(), "2.500");
        assert_eq!(balance.to_string(), "2.500 SOL");
    }

    #[test]
    fn test_zero_and_dust() {
        assert_eq!(Balance::from_lamports(0).display_amount(), "0.000");
        assert_eq!(Balance::from_lamports(1).display_amount(), "0.000");
        assert_eq!(Balance::from_lamports(500_000).display_amount(), "0.001");
        assert_eq!(Balance::from_lamports(499_999).display_amount(), "0.000");
    }

    #[test]
    fn test_exact_conversion() {
        let balance = Balance::from_lamports(u64::MAX);
        assert_eq!(balance.to_sol().to_string(), "18446744073.709551615");
        assert_eq!(balance.display_amount(), "18446744073.710");
    }

    #[test]
    fn test_one_sol() {
        let balance = Balance::from_lamports(LAMPORTS_PER_SOL);
        assert_eq!(balance.to_sol(), Decimal::ONE);
        assert_eq!(balance.display_amount(), "1.000");
    }
}
