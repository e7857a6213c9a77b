use super::ParseError;
use crate::common::*;
use crate::roll::Number;
use std::ops::Range;

pub type Span = Range<usize>;

/// How many times an explode or reroll may repeat.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Repeat {
    Unbounded,
    Times(u32),
}

impl Repeat {
    pub fn times(self) -> u32 {
        match self {
            Self::Unbounded => UNBOUNDED_REPEATS,
            Self::Times(n) => n,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ModifierOp {
    KeepHigh(u32),
    KeepLow(u32),
    DropHigh(u32),
    DropLow(u32),
    Explode(Repeat),
    ExplodeCombine(Repeat),
    Reroll(Repeat),
}

impl ModifierOp {
    pub(crate) fn takes_conditions(self) -> bool {
        matches!(
            self,
            Self::Explode(_) | Self::ExplodeCombine(_) | Self::Reroll(_)
        )
    }

    /// Resolves drop modifiers against the number of dice in the group.
    pub fn into_modifier(self, rolls: usize, conditions: Vec<Conditional>) -> Modifier {
        let rolls = u32::try_from(rolls).unwrap_or(u32::MAX);
        let ret = match self {
            Self::KeepHigh(n) => Modifier::keep_high(n),
            Self::KeepLow(n) => Modifier::keep_low(n),
            Self::DropHigh(n) => Modifier::keep_low(rolls.saturating_sub(n)),
            Self::DropLow(n) => Modifier::keep_high(rolls.saturating_sub(n)),
            Self::Explode(r) => Modifier::explode(r.times()),
            Self::ExplodeCombine(r) => Modifier::explode_combine(r.times()),
            Self::Reroll(r) => Modifier::reroll(r.times()),
        };
        ret.with_conditionals(conditions)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostfixToken {
    Number {
        value: Number,
        span: Span,
    },
    Dice {
        rolls: usize,
        faces: DieFaces,
        conditions: Vec<Conditional>,
        span: Span,
    },
    Percentile {
        rolls: usize,
        digits: NonEmpty<Int>,
        span: Span,
    },
    Stunt {
        span: Span,
    },
    Modifier {
        op: ModifierOp,
        conditions: Vec<Conditional>,
        span: Span,
    },
    Operator {
        op: BinaryOperator,
        span: Span,
    },
}

impl PostfixToken {
    pub fn span(&self) -> &Span {
        match self {
            Self::Number { span, .. }
            | Self::Dice { span, .. }
            | Self::Percentile { span, .. }
            | Self::Stunt { span }
            | Self::Modifier { span, .. }
            | Self::Operator { span, .. } => span,
        }
    }

    pub fn number(value: impl Into<Number>, span: Span) -> Self {
        Self::Number {
            value: value.into(),
            span,
        }
    }

    pub fn dice(rolls: usize, faces: DieFaces, span: Span) -> Self {
        Self::Dice {
            rolls,
            faces,
            conditions: Vec::new(),
            span,
        }
    }

    pub fn modifier(op: ModifierOp, span: Span) -> Self {
        Self::Modifier {
            op,
            conditions: Vec::new(),
            span,
        }
    }

    pub fn operator(op: BinaryOperator, span: Span) -> Self {
        Self::Operator { op, span }
    }
}

/// A formula together with its postfix form.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStream {
    pub original: String,
    pub tokens: Vec<PostfixToken>,
}

impl TokenStream {
    pub fn new(original: impl Into<String>, tokens: Vec<PostfixToken>) -> Self {
        Self {
            original: original.into(),
            tokens,
        }
    }
}

/// Turns raw notation into a postfix token stream.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<TokenStream, ParseError>;
}
