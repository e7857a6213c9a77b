use super::{error::*, lexer::*, token::*};
use crate::common::*;
use logos_iter::LogosIter;

type PResult<T = ()> = Result<T, ParseError>;

/// Tokenizer for the dice notation understood by [`crate::roll::ExpressionEvaluator`].
#[derive(Debug, Default, Copy, Clone)]
pub struct NotationTokenizer;

impl Tokenizer for NotationTokenizer {
    fn tokenize(&self, text: &str) -> PResult<TokenStream> {
        Parser::new(text).parse()
    }
}

enum Pending {
    Binary(BinaryOperator, Span),
    Negate(Span),
    Open(Span),
}

impl Pending {
    // negation sits between '*' and '^'
    fn precedence(&self) -> u8 {
        match self {
            Self::Binary(op, _) => op.precedence() * 2,
            Self::Negate(_) => 5,
            Self::Open(_) => 0,
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    output: Vec<PostfixToken>,
    pending: Vec<Pending>,
    expect_operand: bool,
    group_open: bool,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            lexer: lexer(source),
            output: Vec::new(),
            pending: Vec::new(),
            expect_operand: true,
            group_open: false,
        }
    }

    fn parse(mut self) -> PResult<TokenStream> {
        if self.source.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        while let Some(lexeme) = self.lexer.next() {
            let span = self.lexer.span();
            log::trace!("lexeme {} at {:?}", lexeme, span);
            match lexeme {
                Lexeme::Error => return Err(ParseError::InvalidToken(self.position(span))),
                Lexeme::Number(value) => {
                    self.operand(&span)?;
                    self.output.push(PostfixToken::number(value, span));
                    self.group_open = true;
                }
                Lexeme::Dice((rolls, faces)) => {
                    self.operand(&span)?;
                    let (conditions, span) = self.conditions(span);
                    self.output.push(PostfixToken::Dice {
                        rolls,
                        faces,
                        conditions,
                        span,
                    });
                    self.group_open = true;
                }
                Lexeme::Percentile((rolls, digits)) => {
                    self.operand(&span)?;
                    self.output.push(PostfixToken::Percentile {
                        rolls,
                        digits,
                        span,
                    });
                    self.group_open = true;
                }
                Lexeme::Stunt => {
                    self.operand(&span)?;
                    self.output.push(PostfixToken::Stunt { span });
                    self.group_open = true;
                }
                Lexeme::Modifier(op) => {
                    if !self.group_open {
                        return Err(ParseError::DanglingModifier(self.position(span)));
                    }
                    let (conditions, span) = if op.takes_conditions() {
                        self.conditions(span)
                    } else {
                        (Vec::new(), span)
                    };
                    self.output.push(PostfixToken::Modifier {
                        op,
                        conditions,
                        span,
                    });
                }
                Lexeme::Conditional(_) => {
                    return Err(self.unexpected(span, &["<dice>", "<modifier>"]));
                }
                Lexeme::LeftParen => {
                    self.operand(&span)?;
                    self.expect_operand = true;
                    self.group_open = false;
                    self.pending.push(Pending::Open(span));
                }
                Lexeme::RightParen => {
                    if self.expect_operand {
                        return Err(self.unexpected(span, &["<number>", "<dice>", "'('"]));
                    }
                    self.group_open = false;
                    self.close(span)?;
                }
                Lexeme::Minus if self.expect_operand => {
                    self.output
                        .push(PostfixToken::number(0, span.start..span.start));
                    self.pending.push(Pending::Negate(span));
                }
                Lexeme::Plus if self.expect_operand => {}
                _ => {
                    let op = match lexeme.as_binary_op() {
                        Some(op) if !self.expect_operand => op,
                        _ => return Err(self.unexpected(span, &["<number>", "<dice>", "'('"])),
                    };
                    self.binary(op, span);
                    self.expect_operand = true;
                    self.group_open = false;
                }
            }
        }

        if self.expect_operand {
            let end = self.source.len();
            return Err(self.unexpected(end..end, &["<number>", "<dice>", "'('"]));
        }
        while let Some(pending) = self.pending.pop() {
            match pending {
                Pending::Open(span) => {
                    return Err(ParseError::UnbalancedParens(self.position(span)))
                }
                Pending::Binary(op, span) => self.output.push(PostfixToken::operator(op, span)),
                Pending::Negate(span) => self
                    .output
                    .push(PostfixToken::operator(BinaryOperator::Sub, span)),
            }
        }

        Ok(TokenStream::new(self.source, self.output))
    }

    fn operand(&mut self, span: &Span) -> PResult {
        if !self.expect_operand {
            return Err(self.unexpected(span.clone(), &["<operator>", "')'"]));
        }
        self.expect_operand = false;
        Ok(())
    }

    /// Gathers the conditionals directly following the current token.
    fn conditions(&mut self, mut span: Span) -> (Vec<Conditional>, Span) {
        let mut conditions = Vec::new();
        while let Some(&Lexeme::Conditional(c)) = self.lexer.peek() {
            self.lexer.next();
            span.end = self.lexer.span().end;
            conditions.push(c);
        }
        (conditions, span)
    }

    fn binary(&mut self, op: BinaryOperator, span: Span) {
        let incoming = op.precedence() * 2;
        while let Some(top) = self.pending.last() {
            let stacked = top.precedence();
            if stacked > incoming || (stacked == incoming && !op.right_assoc()) {
                match self.pending.pop() {
                    Some(Pending::Binary(op, span)) => {
                        self.output.push(PostfixToken::operator(op, span))
                    }
                    Some(Pending::Negate(span)) => self
                        .output
                        .push(PostfixToken::operator(BinaryOperator::Sub, span)),
                    _ => break,
                }
            } else {
                break;
            }
        }
        self.pending.push(Pending::Binary(op, span));
    }

    fn close(&mut self, span: Span) -> PResult {
        loop {
            match self.pending.pop() {
                Some(Pending::Open(_)) => return Ok(()),
                Some(Pending::Binary(op, span)) => {
                    self.output.push(PostfixToken::operator(op, span))
                }
                Some(Pending::Negate(span)) => self
                    .output
                    .push(PostfixToken::operator(BinaryOperator::Sub, span)),
                None => return Err(ParseError::UnbalancedParens(self.position(span))),
            }
        }
    }

    fn position(&self, span: Span) -> SourcePosition {
        let slice = self.source.get(span.clone()).unwrap_or_default();
        SourcePosition::new(span, slice)
    }

    fn unexpected(&self, span: Span, expected: &[&str]) -> ParseError {
        let expected = expected.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        ParseError::UnexpectedToken {
            pos: self.position(span),
            expected: NonEmpty::try_from_vec(expected)
                .unwrap_or_else(|_| vec1!["<token>".to_string()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roll::Number;

    fn tokenize(s: &str) -> PResult<TokenStream> {
        NotationTokenizer.tokenize(s)
    }

    fn shape(s: &str) -> Vec<String> {
        tokenize(s)
            .unwrap()
            .tokens
            .iter()
            .map(|t| match t {
                PostfixToken::Number { value, .. } => value.to_string(),
                PostfixToken::Operator { op, .. } => op.to_string(),
                t => s[t.span().clone()].to_string(),
            })
            .collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(shape("1 + 2 * 3"), ["1", "2", "3", "*", "+"]);
        assert_eq!(shape("(1 + 2) * 3"), ["1", "2", "+", "3", "*"]);
        assert_eq!(shape("2 ^ 3 ^ 2"), ["2", "3", "2", "^", "^"]);
        assert_eq!(shape("8 - 2 - 1"), ["8", "2", "-", "1", "-"]);
        assert_eq!(shape("4d6kh3 + 2"), ["4d6", "kh3", "2", "+"]);
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(shape("-2"), ["0", "2", "-"]);
        assert_eq!(shape("3 * -2"), ["3", "0", "2", "-", "*"]);
        assert_eq!(shape("-2 ^ 2"), ["0", "2", "2", "^", "-"]);
        assert_eq!(shape("+5"), ["5"]);
    }

    #[test]
    fn test_spans_cover_conditions() {
        let stream = tokenize("10d10>=8 + 2d6!>5").unwrap();
        assert_eq!(stream.original, "10d10>=8 + 2d6!>5");
        match &stream.tokens[0] {
            PostfixToken::Dice {
                rolls,
                conditions,
                span,
                ..
            } => {
                assert_eq!(*rolls, 10);
                assert_eq!(conditions.len(), 1);
                assert_eq!(*span, 0..8);
            }
            t => panic!("unexpected {:?}", t),
        }
        match &stream.tokens[2] {
            PostfixToken::Modifier {
                op: ModifierOp::Explode(Repeat::Unbounded),
                conditions,
                span,
            } => {
                assert_eq!(conditions[0].comparer, Number::Int(5));
                assert_eq!(*span, 14..17);
            }
            t => panic!("unexpected {:?}", t),
        }
    }

    #[test]
    fn test_errors() {
        assert_eq!(tokenize("  "), Err(ParseError::Empty));
        assert!(matches!(
            tokenize("(1 + 2"),
            Err(ParseError::UnbalancedParens(_))
        ));
        assert!(matches!(
            tokenize("1 + 2)"),
            Err(ParseError::UnbalancedParens(_))
        ));
        assert!(matches!(
            tokenize("kh3"),
            Err(ParseError::DanglingModifier(_))
        ));
        assert!(matches!(
            tokenize("1 +"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            tokenize("2 3"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            tokenize("4d6kh3>2"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(tokenize("2 $ 3"), Err(ParseError::InvalidToken(_))));
    }

    #[test]
    fn test_modifier_on_literal_is_allowed() {
        assert_eq!(shape("5kh1"), ["5", "kh1"]);
    }
}
