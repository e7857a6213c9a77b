//! The persisted record of a finished roll.

use crate::roll::Number;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Expression,
    Table,
    Multi,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Expression => "expression",
            Self::Table => "table",
            Self::Multi => "multi",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RollValue {
    Number(Number),
    Text(String),
}

impl RollValue {
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for RollValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => fmt::Display::fmt(n, f),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<Number> for RollValue {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

impl From<String> for RollValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedResult {
    pub kind: ResultKind,
    pub value: RollValue,
    pub trace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stunt_points: Option<Number>,
    /// Single-line trace used when the result is nested in a table or multi trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl SerializedResult {
    pub fn new(kind: ResultKind, value: impl Into<RollValue>, trace: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            trace: trace.into(),
            stunt_points: None,
            fragment: None,
        }
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// The saved fragment, or the trace folded onto one line for older records.
    pub fn fragment_or_trace(&self) -> String {
        match &self.fragment {
            Some(fragment) => fragment.clone(),
            None => self.trace.lines().map(str::trim).collect::<Vec<_>>().join(" "),
        }
    }
}

impl SerializedResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let r = SerializedResult::new(ResultKind::Expression, Number::Int(13), "4d6kh3\n[2, 5, 6, 1d]");
        let json = r.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"kind":"expression","value":13,"trace":"4d6kh3\n[2, 5, 6, 1d]"}"#
        );
        assert_eq!(SerializedResult::from_json(&json).unwrap(), r);

        let t = SerializedResult::from_json(r#"{"kind":"table","value":"Sword||Axe","trace":""}"#)
            .unwrap();
        assert_eq!(t.value, RollValue::Text("Sword||Axe".into()));
        let f = SerializedResult::from_json(r#"{"kind":"expression","value":3.5,"trace":""}"#)
            .unwrap();
        assert_eq!(f.value.as_number(), Some(Number::Float(3.5)));

        let mut stunt = SerializedResult::new(ResultKind::Expression, Number::Int(10), "1dS");
        stunt.stunt_points = Some(Number::Int(4));
        let json = stunt.to_json().unwrap();
        assert!(json.ends_with(r#""stunt_points":4}"#));
        assert_eq!(SerializedResult::from_json(&json).unwrap(), stunt);
    }

    #[test]
    fn test_fragment() {
        let t = SerializedResult::new(ResultKind::Table, "Ruby||Opal".to_string(), "x ==> (\n\ta ||\n\tb\n)")
            .with_fragment("x ==> (a ||b)");
        let json = t.to_json().unwrap();
        assert!(json.ends_with(r#""fragment":"x ==> (a ||b)"}"#));
        assert_eq!(SerializedResult::from_json(&json).unwrap().fragment_or_trace(), "x ==> (a ||b)");

        let old = SerializedResult::new(ResultKind::Table, "Ruby".to_string(), "x ==> (\n\ta ||\n\tb\n)");
        assert_eq!(old.fragment_or_trace(), "x ==> ( a || b )");
    }
}
