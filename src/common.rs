use crate::roll::Number;
use std::fmt::{self, Write};
use std::str::FromStr;
pub use vec1::vec1;

pub type Int = i64;
pub type Float = f64;

pub type NonEmpty<T> = vec1::Vec1<T>;

/// Upper bound for modifiers written without a count (`!`, `r`) or with `i`.
pub const UNBOUNDED_REPEATS: u32 = 100;

/// The inclusive face range of one die.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DieFaces {
    pub min: Int,
    pub max: Int,
    pub fudge: bool,
}

impl DieFaces {
    pub fn new(min: Int, max: Int) -> Self {
        let (min, max) = if max < min { (max, min) } else { (min, max) };
        Self {
            min,
            max,
            fudge: false,
        }
    }

    pub fn poly(sides: Int) -> Self {
        Self::new(1, sides)
    }

    pub fn percent() -> Self {
        Self::new(1, 100)
    }

    pub fn fudge() -> Self {
        Self {
            fudge: true,
            ..Self::new(-1, 1)
        }
    }

    pub fn average(&self) -> Float {
        (self.min + self.max) as Float / 2.0
    }
}

impl fmt::Display for DieFaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fudge {
            f.write_char('F')
        } else if self.min == 1 {
            fmt::Display::fmt(&self.max, f)
        } else {
            write!(f, "[{},{}]", self.min, self.max)
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOperator {
    pub(crate) const fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 3,
        }
    }

    pub(crate) const fn right_assoc(self) -> bool {
        matches!(self, Self::Pow)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Pow => '^',
        };
        f.write_char(c)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// `-=`: matching dice count as a failure (-1) in a success pool.
    Negate,
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Negate => "-=",
        };
        f.write_str(s)
    }
}

impl FromStr for ConditionOperator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "=" => Self::Equal,
            "!=" | "=!" => Self::NotEqual,
            "<" => Self::Less,
            "<=" => Self::LessEqual,
            ">" => Self::Greater,
            ">=" => Self::GreaterEqual,
            "-=" | "=-" => Self::Negate,
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Conditional {
    pub operator: ConditionOperator,
    pub comparer: Number,
}

impl Conditional {
    pub fn new(operator: ConditionOperator, comparer: impl Into<Number>) -> Self {
        Self {
            operator,
            comparer: comparer.into(),
        }
    }

    pub fn equal(comparer: impl Into<Number>) -> Self {
        Self::new(ConditionOperator::Equal, comparer)
    }

    pub fn matches(&self, value: Number) -> bool {
        use ConditionOperator::*;

        if value.is_nan() || self.comparer.is_nan() {
            return false;
        }
        match self.operator {
            Equal => value == self.comparer,
            NotEqual => value != self.comparer,
            Less => value < self.comparer,
            LessEqual => value <= self.comparer,
            Greater => value > self.comparer,
            GreaterEqual => value >= self.comparer,
            // Only consulted by success counting, never as a pass condition.
            Negate => false,
        }
    }

    pub fn is_negate(&self) -> bool {
        self.operator == ConditionOperator::Negate
    }
}

impl fmt::Display for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.comparer)
    }
}

/// An empty list always passes.
pub fn check_conditions(value: Number, conditions: &[Conditional]) -> bool {
    conditions.is_empty() || conditions.iter().any(|c| c.matches(value))
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ModifierKind {
    KeepHigh,
    KeepLow,
    Explode,
    ExplodeCombine,
    Reroll,
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::KeepHigh => "kh",
            Self::KeepLow => "kl",
            Self::Explode => "!",
            Self::ExplodeCombine => "!!",
            Self::Reroll => "r",
        };
        f.write_str(s)
    }
}

/// A post-roll rule attached to one die group.
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub count: u32,
    pub conditionals: Vec<Conditional>,
}

impl Modifier {
    pub fn new(kind: ModifierKind, count: u32) -> Self {
        Self {
            kind,
            count,
            conditionals: Vec::new(),
        }
    }

    pub fn keep_high(n: u32) -> Self {
        Self::new(ModifierKind::KeepHigh, n)
    }

    pub fn keep_low(n: u32) -> Self {
        Self::new(ModifierKind::KeepLow, n)
    }

    pub fn explode(times: u32) -> Self {
        Self::new(ModifierKind::Explode, times)
    }

    pub fn explode_combine(times: u32) -> Self {
        Self::new(ModifierKind::ExplodeCombine, times)
    }

    pub fn reroll(times: u32) -> Self {
        Self::new(ModifierKind::Reroll, times)
    }

    pub fn with_conditionals(mut self, conditionals: Vec<Conditional>) -> Self {
        self.conditionals = conditionals;
        self
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.count)?;
        for c in &self.conditionals {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Annotation appended to a die's display text.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Tag {
    Dropped,
    Rerolled,
    Exploded,
    Success,
    Failure,
}

impl Tag {
    pub const fn as_char(self) -> char {
        match self {
            Self::Dropped => 'd',
            Self::Rerolled => 'r',
            Self::Exploded => '!',
            Self::Success => '*',
            Self::Failure => '-',
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faces_swap_inverted() {
        assert_eq!(DieFaces::new(6, 2), DieFaces::new(2, 6));
        assert_eq!(DieFaces::fudge().min, -1);
        assert_eq!(DieFaces::poly(20).average(), 10.5);
    }

    #[test]
    fn test_conditions() {
        let conds = [
            Conditional::new(ConditionOperator::GreaterEqual, 5),
            Conditional::equal(1),
        ];
        assert!(check_conditions(5.into(), &conds));
        assert!(check_conditions(1.into(), &conds));
        assert!(!check_conditions(3.into(), &conds));
        assert!(check_conditions(0.into(), &[]));
        assert!(!Conditional::new(ConditionOperator::Negate, 1).matches(1.into()));
    }

    #[test]
    fn test_condition_operator_from_str() {
        assert_eq!("=!".parse(), Ok(ConditionOperator::NotEqual));
        assert_eq!("=-".parse(), Ok(ConditionOperator::Negate));
        assert_eq!("<>".parse::<ConditionOperator>(), Err(()));
    }
}
