use super::token::{ModifierOp, Repeat};
use crate::common::*;
use crate::roll::Number;
use logos::{Lexer as LogosLexer, Logos};
use logos_iter::{LogosIter, PeekableLexer};
use std::fmt;

pub type Lexer<'a> = PeekableLexer<'a, LogosLexer<'a, Lexeme>, Lexeme>;

pub fn lexer(s: &str) -> Lexer {
    Lexeme::lexer(s).peekable_lexer()
}

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Lexeme {
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<Int>().ok().map(Number::Int))]
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<Float>().ok().map(Number::Float))]
    Number(Number),

    #[regex(r"[0-9]*[dD]([0-9]+|%|F|\[ *-?[0-9]+ *, *-?[0-9]+ *\])", |lex| parse_dice(lex.slice()))]
    Dice((usize, DieFaces)),

    #[regex(r"[0-9]*[dD]%[0-9]+", |lex| parse_percentile(lex.slice()))]
    Percentile((usize, NonEmpty<Int>)),

    #[regex(r"1?[dD]S")]
    Stunt,

    #[regex(r"kh[0-9]*", |lex| keep_count(&lex.slice()[2..]).map(ModifierOp::KeepHigh))]
    #[regex(r"kl[0-9]*", |lex| keep_count(&lex.slice()[2..]).map(ModifierOp::KeepLow))]
    #[regex(r"dh[0-9]*", |lex| keep_count(&lex.slice()[2..]).map(ModifierOp::DropHigh))]
    #[regex(r"dl[0-9]*", |lex| keep_count(&lex.slice()[2..]).map(ModifierOp::DropLow))]
    #[regex(r"!!(i|[0-9]+)?", |lex| repeat(&lex.slice()[2..], 1).map(ModifierOp::ExplodeCombine))]
    #[regex(r"!(i|[0-9]+)?", |lex| repeat_chained(&lex.slice()[1..]).map(ModifierOp::Explode))]
    #[regex(r"r(i|[0-9]+)?", |lex| repeat(&lex.slice()[1..], 1).map(ModifierOp::Reroll))]
    Modifier(ModifierOp),

    #[regex(r"(=|!=|=!|<|<=|>|>=|-=|=-)-?[0-9]+(\.[0-9]+)?", |lex| parse_conditional(lex.slice()))]
    Conditional(Conditional),

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,

    #[regex(r"[ \t\r\n]+", logos::skip)]
    #[error]
    Error,
}

impl Lexeme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number(_) => "<number>",
            Self::Dice(_) => "<dice>",
            Self::Percentile(_) => "<percentile>",
            Self::Stunt => "<stunt>",
            Self::Modifier(_) => "<modifier>",
            Self::Conditional(_) => "<conditional>",
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Caret => "'^'",
            Self::Error => "<error>",
        }
    }

    pub fn as_binary_op(&self) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        Some(match self {
            Self::Plus => Add,
            Self::Minus => Sub,
            Self::Star => Mul,
            Self::Slash => Div,
            Self::Caret => Pow,
            _ => return None,
        })
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_count(s: &str) -> Option<usize> {
    if s.is_empty() {
        Some(1)
    } else {
        s.parse().ok().filter(|&n| n > 0)
    }
}

fn parse_dice(s: &str) -> Option<(usize, DieFaces)> {
    let d = s.find(['d', 'D'])?;
    let rolls = parse_count(&s[..d])?;
    let sides = &s[d + 1..];
    let faces = match sides {
        "%" => DieFaces::percent(),
        "F" => DieFaces::fudge(),
        _ if sides.starts_with('[') => {
            let (lo, hi) = sides[1..sides.len() - 1].split_once(',')?;
            DieFaces::new(lo.trim().parse().ok()?, hi.trim().parse().ok()?)
        }
        _ => match sides.parse::<Int>().ok()? {
            0 => return None,
            n => DieFaces::poly(n),
        },
    };
    Some((rolls, faces))
}

fn parse_percentile(s: &str) -> Option<(usize, NonEmpty<Int>)> {
    let d = s.find(['d', 'D'])?;
    let rolls = parse_count(&s[..d])?;
    let digits = s[d + 2..]
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(Int::from)
        .collect::<Vec<_>>();
    Some((rolls, NonEmpty::try_from_vec(digits).ok()?))
}

fn keep_count(s: &str) -> Option<u32> {
    if s.is_empty() {
        Some(1)
    } else {
        s.parse().ok()
    }
}

fn repeat(s: &str, default: u32) -> Option<Repeat> {
    match s {
        "" => Some(Repeat::Times(default)),
        "i" => Some(Repeat::Unbounded),
        n => n.parse().ok().map(Repeat::Times),
    }
}

// a bare `!` keeps chaining while the new die still matches
fn repeat_chained(s: &str) -> Option<Repeat> {
    match s {
        "" => Some(Repeat::Unbounded),
        s => repeat(s, 1),
    }
}

fn parse_conditional(s: &str) -> Option<Conditional> {
    // two-character operators win, so "=-3" negates on 3
    let split = if s.len() > 2 && s[..2].parse::<ConditionOperator>().is_ok() {
        2
    } else {
        1
    };
    let operator = s[..split].parse().ok()?;
    let rest = &s[split..];
    let comparer = match rest.parse::<Int>() {
        Ok(n) => Number::Int(n),
        Err(_) => Number::Float(rest.parse().ok()?),
    };
    Some(Conditional::new(operator, comparer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(s: &str) -> Vec<Lexeme> {
        Lexeme::lexer(s).collect()
    }

    #[test]
    fn test_dice_forms() {
        assert_eq!(
            lexemes("4d6 d20 2d% 3dF 2d[-1, 3]"),
            vec![
                Lexeme::Dice((4, DieFaces::poly(6))),
                Lexeme::Dice((1, DieFaces::poly(20))),
                Lexeme::Dice((2, DieFaces::percent())),
                Lexeme::Dice((3, DieFaces::fudge())),
                Lexeme::Dice((2, DieFaces::new(-1, 3))),
            ]
        );
        assert_eq!(lexemes("0d6"), vec![Lexeme::Error]);
        assert_eq!(lexemes("1dS"), vec![Lexeme::Stunt]);
        assert_eq!(
            lexemes("1d%66"),
            vec![Lexeme::Percentile((1, vec1![6, 6]))]
        );
        assert_eq!(
            lexemes("1d%60 2d%100"),
            vec![
                Lexeme::Percentile((1, vec1![6, 0])),
                Lexeme::Percentile((2, vec1![1, 0, 0])),
            ]
        );
    }

    #[test]
    fn test_repeat_defaults() {
        assert_eq!(
            lexemes("r ri ! !! !!i"),
            vec![
                Lexeme::Modifier(ModifierOp::Reroll(Repeat::Times(1))),
                Lexeme::Modifier(ModifierOp::Reroll(Repeat::Unbounded)),
                Lexeme::Modifier(ModifierOp::Explode(Repeat::Unbounded)),
                Lexeme::Modifier(ModifierOp::ExplodeCombine(Repeat::Times(1))),
                Lexeme::Modifier(ModifierOp::ExplodeCombine(Repeat::Unbounded)),
            ]
        );
    }

    #[test]
    fn test_modifiers_and_conditions() {
        assert_eq!(
            lexemes("4d6kh3!!r2 dl"),
            vec![
                Lexeme::Dice((4, DieFaces::poly(6))),
                Lexeme::Modifier(ModifierOp::KeepHigh(3)),
                Lexeme::Modifier(ModifierOp::ExplodeCombine(Repeat::Times(1))),
                Lexeme::Modifier(ModifierOp::Reroll(Repeat::Times(2))),
                Lexeme::Modifier(ModifierOp::DropLow(1)),
            ]
        );
        assert_eq!(
            lexemes("!i>=5 !=3 =-1"),
            vec![
                Lexeme::Modifier(ModifierOp::Explode(Repeat::Unbounded)),
                Lexeme::Conditional(Conditional::new(ConditionOperator::GreaterEqual, 5)),
                Lexeme::Conditional(Conditional::new(ConditionOperator::NotEqual, 3)),
                Lexeme::Conditional(Conditional::new(ConditionOperator::Negate, 1)),
            ]
        );
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            lexemes("(2.5 + 3) ^ 2"),
            vec![
                Lexeme::LeftParen,
                Lexeme::Number(Number::Float(2.5)),
                Lexeme::Plus,
                Lexeme::Number(Number::Int(3)),
                Lexeme::RightParen,
                Lexeme::Caret,
                Lexeme::Number(Number::Int(2)),
            ]
        );
    }
}
