//! Native token amounts.
//!
//! Amounts are held as integer lamports (u64) to avoid floating-point drift.
//! Human-denominated SOL values are converted with round-half-up at the tenth
//! fractional digit, so `0.0000000005` becomes 1 lamport and `0.00000000049`
//! becomes 0.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::TypesError;

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Fractional digits of one SOL.
const SOL_DECIMALS: usize = 9;

/// An amount of the native token, in lamports.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Lamports(u64);

impl Lamports {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Signed difference `self - other`.
    pub fn signed_diff(self, other: Self) -> i128 {
        self.0 as i128 - other.0 as i128
    }

    /// Parse a decimal SOL quantity such as `"12.5"` or `"0.0001"`.
    ///
    /// Digits beyond the ninth fractional place are rounded half-up. Negative
    /// values, exponents and empty strings are rejected. Zero is accepted;
    /// positivity is the caller's check.
    pub fn from_sol_str(input: &str) -> Result<Self, TypesError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(TypesError::InvalidAmount("empty amount".into()));
        }
        if s.starts_with('-') {
            return Err(TypesError::InvalidAmount(format!("negative amount: {s}")));
        }

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(TypesError::InvalidAmount(format!("not a number: {s}")));
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(TypesError::InvalidAmount(format!("not a decimal number: {s}")));
        }

        let whole: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| TypesError::AmountOverflow)?
        };

        let mut fraction: u64 = 0;
        for i in 0..SOL_DECIMALS {
            let digit = frac_part.as_bytes().get(i).map_or(0, |b| (b - b'0') as u64);
            fraction = fraction * 10 + digit;
        }
        let round_up = frac_part
            .as_bytes()
            .get(SOL_DECIMALS)
            .is_some_and(|b| *b >= b'5');

        whole
            .checked_mul(LAMPORTS_PER_SOL)
            .and_then(|l| l.checked_add(fraction))
            .and_then(|l| l.checked_add(round_up as u64))
            .map(Self)
            .ok_or(TypesError::AmountOverflow)
    }

    /// Convert a floating-point SOL quantity.
    ///
    /// The value goes through its shortest decimal representation first, so
    /// `0.1` converts as the decimal `0.1` rather than its binary expansion.
    pub fn from_sol(sol: f64) -> Result<Self, TypesError> {
        if !sol.is_finite() {
            return Err(TypesError::InvalidAmount(format!("not finite: {sol}")));
        }
        if sol < 0.0 {
            return Err(TypesError::InvalidAmount(format!("negative amount: {sol}")));
        }
        Self::from_sol_str(&format!("{sol}"))
    }

    /// Approximate SOL value, for display and JSON records only.
    pub fn as_sol(&self) -> f64 {
        self.0 as f64 / LAMPORTS_PER_SOL as f64
    }

    /// Format as SOL with exactly `decimals` fractional digits (rounded half-up).
    pub fn to_sol_string(&self, decimals: usize) -> String {
        let decimals = decimals.min(SOL_DECIMALS);
        let unit = 10u128.pow((SOL_DECIMALS - decimals) as u32);
        let scaled = (self.0 as u128 + unit / 2) / unit;
        let divisor = 10u128.pow(decimals as u32);
        let whole = scaled / divisor;
        if decimals == 0 {
            return whole.to_string();
        }
        let frac = scaled % divisor;
        format!("{whole}.{frac:0width$}", width = decimals)
    }
}

impl Add for Lamports {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Lamports {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Lamports {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl FromStr for Lamports {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_sol_str(s)
    }
}

/// Shortest SOL rendering with at least one fractional digit: `12.0`, `0.0001`.
impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / LAMPORTS_PER_SOL;
        let frac = format!("{:09}", self.0 % LAMPORTS_PER_SOL);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            write!(f, "{whole}.0")
        } else {
            write!(f, "{whole}.{frac}")
        }
    }
}

/// Serde adapter writing lamports as a SOL float, for the outbound records.
pub mod sol {
    use super::Lamports;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Lamports, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(amount.as_sol())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Lamports, D::Error> {
        let sol = f64::deserialize(deserializer)?;
        Lamports::from_sol(sol).map_err(serde::de::Error::custom)
    }

    /// Same as the parent adapter, for optional fields.
    pub mod option {
        use super::Lamports;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            amount: &Option<Lamports>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match amount {
                Some(a) => serializer.serialize_some(&a.as_sol()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Lamports>, D::Error> {
            Option::<f64>::deserialize(deserializer)?
                .map(|sol| Lamports::from_sol(sol).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
