use super::Span;
use crate::common::NonEmpty;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct SourcePosition {
    pub span: Span,
    pub slice: String,
}

impl SourcePosition {
    pub fn new(span: Span, slice: impl Into<String>) -> Self {
        Self {
            span,
            slice: slice.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("(at position {}): unexpected token; found {:?}, expected {}", .pos.span.start, .pos.slice, .expected.fmt_expected())]
    UnexpectedToken {
        pos: SourcePosition,
        expected: NonEmpty<String>,
    },
    #[error("(at position {}): {:?} is not valid dice notation", .0.span.start, .0.slice)]
    InvalidToken(SourcePosition),
    #[error("(at position {}): {:?} must follow a dice group", .0.span.start, .0.slice)]
    DanglingModifier(SourcePosition),
    #[error("(at position {}): unbalanced parenthesis", .0.span.start)]
    UnbalancedParens(SourcePosition),
    #[error("empty formula")]
    Empty,
    #[error("malformed token stream: {0}")]
    MalformedStream(String),
    #[error("could not parse table reference {0:?}")]
    InvalidTableReference(String),
}

impl ParseError {
    pub(crate) fn malformed(msg: impl ToString) -> Self {
        Self::MalformedStream(msg.to_string())
    }
}

trait FormatExpected {
    fn fmt_expected(&self) -> String;
}

impl FormatExpected for [String] {
    fn fmt_expected(&self) -> String {
        match self {
            [] => unreachable!("NonEmpty cannot be empty"),
            [a] => a.to_owned(),
            [a, b] => format!("{} or {}", a, b),
            s => format!("{}, or {}", s[..s.len() - 1].join(", "), &s[s.len() - 1]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::vec1;

    #[test]
    fn test_expected_lists() {
        let err = ParseError::UnexpectedToken {
            pos: SourcePosition::new(3..4, ")"),
            expected: vec1!["<number>".to_string(), "<dice>".to_string(), "'('".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "(at position 3): unexpected token; found \")\", expected <number>, <dice>, or '('"
        );
    }
}
