use crate::common::ModifierKind;
use crate::parse::ParseError;
use crate::replay::ResultKind;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RollError {
    #[error("{0}")]
    ParseError(#[from] ParseError),
    #[error("could not find {}", describe_reference(.path, .block, .header.as_deref()))]
    MissingReference {
        path: String,
        block: String,
        header: Option<String>,
    },
    #[error("nested formulas exceeded the recursion limit of {depth}")]
    RecursionLimitExceeded { depth: usize },
    #[error("too many dice rolled")]
    TooManyRolls,
    #[error("cannot divide by zero")]
    ZeroDivision,
    #[error("{formula:?} did not produce a number")]
    NotANumber { formula: String },
    #[error("cannot apply a {found} result to a {expected} roller")]
    ReplayKindMismatch {
        expected: ResultKind,
        found: ResultKind,
    },
}

impl RollError {
    pub fn missing(path: impl ToString, block: impl ToString, header: Option<&str>) -> Self {
        Self::MissingReference {
            path: path.to_string(),
            block: block.to_string(),
            header: header.map(str::to_string),
        }
    }
}

fn describe_reference(path: &str, block: &str, header: Option<&str>) -> String {
    match header {
        Some(header) => format!("header {:?} in {} > {}", header, path, block),
        None => format!("block reference {} > {}", path, block),
    }
}

/// Non-fatal problems noticed while rolling; evaluation carries on.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Advisory {
    #[error("modifiers are only allowed on dice rolls ({modifier} on {notation:?})")]
    ModifierMisuse {
        notation: String,
        modifier: ModifierKind,
    },
    #[error("lookup value {value} matched no range of {formula:?}")]
    LookupRangeMiss { formula: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            RollError::missing("Loot", "weapons", Some("Name")).to_string(),
            "could not find header \"Name\" in Loot > weapons"
        );
        assert_eq!(
            RollError::missing("Loot", "weapons", None).to_string(),
            "could not find block reference Loot > weapons"
        );
        assert_eq!(
            Advisory::ModifierMisuse {
                notation: "5".into(),
                modifier: ModifierKind::KeepHigh
            }
            .to_string(),
            "modifiers are only allowed on dice rolls (kh on \"5\")"
        );
    }
}
