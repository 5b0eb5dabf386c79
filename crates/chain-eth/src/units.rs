//! Conversion between wei and its decimal display units.
//!
//! [`Amount`] holds an exact non-negative wei quantity. [`DisplayAmount`] is the
//! same quantity viewed in ether: since one ether is exactly 10^18 wei, every
//! wei amount has an exact decimal rendering with at most 18 fractional digits,
//! so the display form never rounds. Converting *into* wei truncates sub-wei
//! digits toward zero.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;

use crate::error::EthError;

/// Decimal places of the display unit.
pub const ETHER_DECIMALS: u8 = 18;

/// Decimal places of gwei, the customary gas-price unit.
pub const GWEI_DECIMALS: u8 = 9;

/// 10^18.
pub const WEI_PER_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// A non-negative quantity of wei.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub const fn from_wei(wei: U256) -> Self {
        Self(wei)
    }

    pub const fn as_wei(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Big-endian 32-byte representation, as used in ABI words.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }
}

impl From<u64> for Amount {
    fn from(wei: u64) -> Self {
        Self(U256::from(wei))
    }
}

impl From<u128> for Amount {
    fn from(wei: u128) -> Self {
        Self(U256::from(wei))
    }
}

impl From<U256> for Amount {
    fn from(wei: U256) -> Self {
        Self(wei)
    }
}

impl TryFrom<i64> for Amount {
    type Error = EthError;

    fn try_from(wei: i64) -> Result<Self, Self::Error> {
        Self::try_from(i128::from(wei))
    }
}

impl TryFrom<i128> for Amount {
    type Error = EthError;

    fn try_from(wei: i128) -> Result<Self, Self::Error> {
        u128::try_from(wei)
            .map(Self::from)
            .map_err(|_| EthError::InvalidAmount(format!("negative value {wei}")))
    }
}

/// Parses a decimal wei string. A leading `-` is rejected.
impl FromStr for Amount {
    type Err = EthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if digits.starts_with('-') {
            return Err(EthError::InvalidAmount(format!("negative value {digits}")));
        }
        let digits = digits.strip_prefix('+').unwrap_or(digits);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EthError::InvalidAmount(format!("not a decimal integer: {s:?}")));
        }
        U256::from_str_radix(digits, 10)
            .map(Self)
            .map_err(|e| EthError::InvalidAmount(format!("{s}: {e}")))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// An exact decimal quantity of ether, used for presentation.
///
/// Holds the underlying wei so that `to_base_unit(to_display(w)) == w` for
/// every `w`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayAmount {
    wei: Amount,
}

impl DisplayAmount {
    /// Converts a float amount of ether.
    ///
    /// The float goes through its shortest round-trip decimal rendering, so
    /// `0.1` becomes exactly 10^17 wei. A float carries ~17 significant
    /// digits: anything a user typed beyond that was lost before this call.
    pub fn from_f64(ether: f64) -> Result<Self, EthError> {
        if !ether.is_finite() {
            return Err(EthError::InvalidAmount(format!("non-finite value {ether}")));
        }
        if ether < 0.0 {
            return Err(EthError::InvalidAmount(format!("negative value {ether}")));
        }
        if ether == 0.0 {
            // Also covers -0.0, whose rendering carries a sign.
            return Ok(Self::default());
        }
        format!("{ether}").parse()
    }

    /// Lossy conversion for comparisons and arithmetic in float space.
    pub fn to_f64(&self) -> f64 {
        // A plain decimal rendering always parses.
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    pub fn as_amount(&self) -> Amount {
        self.wei
    }
}

/// Parses a plain decimal ether string such as `"1"`, `"0.5"` or `".25"`.
/// Digits past the 18th fractional place are truncated.
impl FromStr for DisplayAmount {
    type Err = EthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_units(s, ETHER_DECIMALS).map(|wei| Self { wei })
    }
}

/// Renders the minimal decimal form (`1`, `0.5`, `0.001`).
///
/// With an explicit precision (`{:.6}`) the fraction is truncated or
/// zero-padded to exactly that many digits; it is never rounded.
impl fmt::Display for DisplayAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = format_units(&self.wei, ETHER_DECIMALS);
        match f.precision() {
            None => f.pad(&rendered),
            Some(precision) => {
                let (int, frac) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
                if precision == 0 {
                    return f.write_str(int);
                }
                let mut frac: String = frac.chars().take(precision).collect();
                while frac.len() < precision {
                    frac.push('0');
                }
                // `pad` would treat the precision as a maximum string width.
                write!(f, "{int}.{frac}")
            }
        }
    }
}

/// Converts wei into ether. Exact and infallible.
pub fn to_display(amount: &Amount) -> DisplayAmount {
    DisplayAmount { wei: *amount }
}

/// Converts ether into wei, truncating sub-wei fractions.
pub fn to_base_unit(display: &DisplayAmount) -> Amount {
    display.wei
}

/// Converts a float ether value into wei.
///
/// Fails with [`EthError::InvalidAmount`] for negative, NaN or infinite input
/// and for values beyond 256 bits of wei.
pub fn ether_to_wei(ether: f64) -> Result<Amount, EthError> {
    DisplayAmount::from_f64(ether).map(|display| to_base_unit(&display))
}

/// Converts wei into a float ether value. Lossy above 2^53 wei of precision.
pub fn wei_to_ether(amount: &Amount) -> f64 {
    to_display(amount).to_f64()
}

/// Parses a decimal string scaled by `10^decimals` into base units.
///
/// Fractional digits beyond `decimals` are truncated toward zero.
pub fn parse_units(s: &str, decimals: u8) -> Result<Amount, EthError> {
    let text = s.trim();
    if text.starts_with('-') {
        return Err(EthError::InvalidAmount(format!("negative value {text}")));
    }
    let text = text.strip_prefix('+').unwrap_or(text);

    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(EthError::InvalidAmount(format!("not a decimal number: {s:?}")));
    }

    let decimals = usize::from(decimals);
    let mut scaled = String::with_capacity(int_part.len() + decimals);
    scaled.push_str(int_part);
    scaled.extend(frac_part.chars().take(decimals));
    for _ in frac_part.len().min(decimals)..decimals {
        scaled.push('0');
    }

    let digits = scaled.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(Amount::ZERO);
    }
    U256::from_str_radix(digits, 10)
        .map(Amount)
        .map_err(|_| EthError::InvalidAmount(format!("{s} overflows 256 bits")))
}

/// Renders base units as a minimal decimal string scaled by `10^decimals`.
pub fn format_units(amount: &Amount, decimals: u8) -> String {
    let digits = amount.0.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{digits}", "0".repeat(decimals + 1 - digits.len()))
    } else {
        digits
    };
    let (int, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int}.{frac}")
    }
}

/// Renders a wei amount in gwei, e.g. for gas prices.
pub fn format_gwei(amount: &Amount) -> String {
    format_units(amount, GWEI_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn wei_to_display_known_values() {
        let cases: [(u128, f64); 4] = [
            (ONE_ETHER, 1.0),
            (500_000_000_000_000_000, 0.5),
            (1_000_000_000_000_000, 0.001),
            (0, 0.0),
        ];

        for (wei, expected) in cases {
            let display = to_display(&Amount::from(wei));
            assert_eq!(display.to_f64(), expected, "to_display({wei})");
        }
    }

    #[test]
    fn ether_to_wei_known_values() {
        let cases: [(f64, u128); 4] = [
            (1.0, ONE_ETHER),
            (0.5, 500_000_000_000_000_000),
            (0.001, 1_000_000_000_000_000),
            (0.0, 0),
        ];

        for (ether, expected) in cases {
            assert_eq!(ether_to_wei(ether).unwrap(), Amount::from(expected), "ether_to_wei({ether})");
        }
    }

    #[test]
    fn human_entered_decimals_are_exact() {
        assert_eq!(ether_to_wei(0.1).unwrap(), Amount::from(100_000_000_000_000_000u128));
        assert_eq!(ether_to_wei(1.1).unwrap(), Amount::from(1_100_000_000_000_000_000u128));
        assert_eq!(ether_to_wei(0.3).unwrap(), Amount::from(300_000_000_000_000_000u128));
    }

    #[test]
    fn negative_and_non_finite_are_rejected() {
        for bad in [-1.0, -0.000001, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(ether_to_wei(bad), Err(EthError::InvalidAmount(_))),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(ether_to_wei(-0.0).unwrap(), Amount::ZERO);
    }

    #[test]
    fn overflow_is_rejected() {
        assert!(ether_to_wei(1e300).is_err());
        assert!(ether_to_wei(1e50).is_ok());
    }

    #[test]
    fn sub_wei_digits_are_truncated() {
        let display: DisplayAmount = "0.0000000000000000019".parse().unwrap();
        assert_eq!(to_base_unit(&display), Amount::from(1u64));

        let display: DisplayAmount = "0.0000000000000000009".parse().unwrap();
        assert_eq!(to_base_unit(&display), Amount::ZERO);
    }

    #[test]
    fn display_rendering() {
        assert_eq!(to_display(&Amount::from(ONE_ETHER)).to_string(), "1");
        assert_eq!(to_display(&Amount::from(500_000_000_000_000_000u128)).to_string(), "0.5");
        assert_eq!(to_display(&Amount::from(1u64)).to_string(), "0.000000000000000001");
        assert_eq!(to_display(&Amount::ZERO).to_string(), "0");
        assert_eq!(
            to_display(&Amount::from(123 * ONE_ETHER + 45)).to_string(),
            "123.000000000000000045"
        );
    }

    #[test]
    fn display_precision_truncates() {
        let display = to_display(&Amount::from(1_999_999_999_999_999_999u128));
        assert_eq!(format!("{display:.6}"), "1.999999");
        assert_eq!(format!("{display:.0}"), "1");

        let whole = to_display(&Amount::from(2 * ONE_ETHER));
        assert_eq!(format!("{whole:.3}"), "2.000");
    }

    #[test]
    fn large_amounts_keep_full_precision() {
        // 2^53 + 1 wei is not representable as f64 but must survive exactly.
        let wei = Amount::from((1u128 << 53) + 1);
        let round_trip = to_base_unit(&to_display(&wei).to_string().parse().unwrap());
        assert_eq!(round_trip, wei);

        let max = Amount::from_wei(U256::MAX);
        let round_trip = to_base_unit(&to_display(&max).to_string().parse().unwrap());
        assert_eq!(round_trip, max);
    }

    #[test]
    fn random_amounts_round_trip_through_text() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let wei = Amount::from(rng.gen::<u128>());
            let text = to_display(&wei).to_string();
            let parsed: DisplayAmount = text.parse().unwrap();
            assert_eq!(to_base_unit(&parsed), wei, "{text}");
        }
    }

    #[test]
    fn parse_units_rejects_garbage() {
        for bad in ["", ".", "-1", "1.2.3", "abc", "1e18", "0x10", " - 1"] {
            assert!(parse_units(bad, 18).is_err(), "accepted {bad:?}");
        }
        assert_eq!(parse_units(".25", 18).unwrap(), Amount::from(250_000_000_000_000_000u128));
        assert_eq!(parse_units("+7", 0).unwrap(), Amount::from(7u64));
    }

    #[test]
    fn token_decimals() {
        assert_eq!(parse_units("1.5", 6).unwrap(), Amount::from(1_500_000u64));
        assert_eq!(format_units(&Amount::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(&Amount::from(42u64), 0), "42");
        assert_eq!(format_gwei(&Amount::from(20_000_000_000u64)), "20");
        assert_eq!(format_gwei(&Amount::from(1_500_000_000u64)), "1.5");
    }

    #[test]
    fn amount_from_signed() {
        assert_eq!(Amount::try_from(5i64).unwrap(), Amount::from(5u64));
        assert!(matches!(Amount::try_from(-1i64), Err(EthError::InvalidAmount(_))));
        assert!(Amount::try_from(i128::MIN).is_err());
    }

    #[test]
    fn amount_from_str() {
        assert_eq!("1000".parse::<Amount>().unwrap(), Amount::from(1000u64));
        assert!("-1000".parse::<Amount>().is_err());
        assert!("1.5".parse::<Amount>().is_err());
        assert!("".parse::<Amount>().is_err());
        assert_eq!(Amount::from(1000u64).to_string(), "1000");
    }
}
