use crate::parse::ParseError;
use std::fmt;
use std::str::FromStr;

/// `[N][[path]]^block[|header]`, e.g. `3[[Loot]]^weapons|Name`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TableReference {
    pub count: usize,
    pub path: String,
    pub block: String,
    pub header: Option<String>,
}

impl TableReference {
    pub fn new(path: impl Into<String>, block: impl Into<String>) -> Self {
        Self {
            count: 1,
            path: path.into(),
            block: block.into(),
            header: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }
}

impl FromStr for TableReference {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidTableReference(s.to_string());
        let text = s.trim();

        let digits = text.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        let count = match &text[..digits] {
            "" => 1,
            n => n.parse().ok().filter(|&n| n > 0).ok_or_else(invalid)?,
        };

        let rest = text[digits..].strip_prefix("[[").ok_or_else(invalid)?;
        let (path, rest) = rest.split_once("]]").ok_or_else(invalid)?;
        let rest = rest.strip_prefix('^').ok_or_else(invalid)?;
        let (block, header) = match rest.split_once('|') {
            Some((block, header)) => (block, Some(header.trim())),
            None => (rest, None),
        };

        let path = path.trim();
        let block = block.trim().to_lowercase();
        if path.is_empty() || block.is_empty() || block.contains(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self {
            count,
            path: path.to_string(),
            block,
            header: header.filter(|h| !h.is_empty()).map(str::to_string),
        })
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count != 1 {
            write!(f, "{}", self.count)?;
        }
        write!(f, "[[{}]]^{}", self.path, self.block)?;
        if let Some(header) = &self.header {
            write!(f, "|{}", header)?;
        }
        Ok(())
    }
}
