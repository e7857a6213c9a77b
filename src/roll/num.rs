use crate::common::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(Int),
    Float(Float),
}

impl Number {
    pub const ZERO: Self = Self::Int(0);
    pub const ONE: Self = Self::Int(1);

    pub fn as_int(self) -> Int {
        match self {
            Self::Int(x) => x,
            Self::Float(x) => x as Int,
        }
    }

    pub fn as_float(self) -> Float {
        match self {
            Self::Int(x) => x as Float,
            Self::Float(x) => x,
        }
    }

    pub fn is_nan(self) -> bool {
        matches!(self, Self::Float(x) if x.is_nan())
    }

    pub(crate) fn floor(self) -> Self {
        match self {
            Self::Int(_) => self,
            Self::Float(x) => Self::Int(x.floor() as Int),
        }
    }

    pub fn pow(self, rhs: Self) -> Self {
        if let (Self::Int(x), Self::Int(y)) = (self, rhs) {
            if let Some(v) = u32::try_from(y).ok().and_then(|y| x.checked_pow(y)) {
                return Self::Int(v);
            }
        }
        Self::Float(self.as_float().powf(rhs.as_float()))
    }

    /// Division that stays integral only when exact.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs == Self::ZERO {
            return None;
        }
        Some(match (self, rhs) {
            (Self::Int(x), Self::Int(y)) if x.checked_rem(y) == Some(0) => Self::Int(x / y),
            (x, y) => Self::Float(x.as_float() / y.as_float()),
        })
    }
}

impl std::ops::Neg for Number {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Self::Int(x) => x.checked_neg().map_or(Self::Float(-(x as Float)), Self::Int),
            Self::Float(x) => Self::Float(-x),
        }
    }
}

macro_rules! val_impl_bin_op {
    ($Name:ident, $fn_name:ident, $checked:ident) => {
        impl std::ops::$Name for Number {
            type Output = Self;

            fn $fn_name(self, rhs: Self) -> Self::Output {
                match (self, rhs) {
                    (Self::Int(x), Self::Int(y)) => x.$checked(y).map_or(
                        Self::Float(std::ops::$Name::$fn_name(x as Float, y as Float)),
                        Self::Int,
                    ),
                    (x, y) => {
                        Self::Float(std::ops::$Name::$fn_name(x.as_float(), y.as_float()))
                    }
                }
            }
        }
    };
}

val_impl_bin_op!(Add, add, checked_add);
val_impl_bin_op!(Sub, sub, checked_sub);
val_impl_bin_op!(Mul, mul, checked_mul);

impl std::iter::Sum for Number {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |a, b| a + b)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.as_float().eq(&other.as_float())
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.as_float().partial_cmp(&other.as_float())
    }
}

impl From<Int> for Number {
    fn from(x: Int) -> Self {
        Self::Int(x)
    }
}

impl From<i32> for Number {
    fn from(x: i32) -> Self {
        Self::Int(x.into())
    }
}

impl From<Float> for Number {
    fn from(x: Float) -> Self {
        Self::Float(x)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => fmt::Display::fmt(x, f),
            Self::Float(x) => fmt::Display::fmt(x, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arith() {
        assert_eq!(Number::Int(2) + Number::Int(3), Number::Int(5));
        assert!(matches!(Number::Int(6).checked_div(3.into()), Some(Number::Int(2))));
        assert_eq!(Number::Int(7).checked_div(2.into()), Some(Number::Float(3.5)));
        assert_eq!(Number::Int(1).checked_div(Number::ZERO), None);
        assert!(matches!(Number::Int(2).pow(10.into()), Number::Int(1024)));
        assert_eq!(Number::Int(4).pow(Number::Float(0.5)), Number::Float(2.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Number::Float(2.0).to_string(), "2");
        assert_eq!(Number::Float(3.5).to_string(), "3.5");
        assert_eq!((-Number::Int(4)).to_string(), "-4");
        assert_eq!(Number::Float(2.7).floor().to_string(), "2");
    }
}
