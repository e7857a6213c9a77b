use crate::common::Int;
use crate::roll::Number;

/// A markdown table split into headers, row texts and columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedTable {
    pub headers: Vec<String>,
    /// Non-empty cells of each row.
    pub rows: Vec<Vec<String>>,
    pub columns: Vec<Vec<String>>,
}

impl ExtractedTable {
    /// Row texts, non-empty cells joined by `" | "`.
    pub fn row_texts(&self) -> Vec<String> {
        self.rows.iter().map(|cells| cells.join(" | ")).collect()
    }

    pub fn column(&self, header: &str) -> Option<&[String]> {
        let i = self.headers.iter().position(|h| h == header)?;
        self.columns.get(i).map(Vec::as_slice)
    }

    /// The formula of a `dice: <formula>` first header on a two-column table.
    pub fn lookup_formula(&self) -> Option<&str> {
        match self.headers.as_slice() {
            [first, _] => {
                let formula = first.split_once("dice:")?.1;
                let formula = formula.rsplit(':').next()?.trim();
                (!formula.is_empty()).then_some(formula)
            }
            _ => None,
        }
    }

    pub fn lookup_ranges(&self) -> Vec<LookupRange> {
        self.rows
            .iter()
            .filter_map(|cells| match cells.as_slice() {
                [range, option, ..] => LookupRange::parse(range, option),
                _ => None,
            })
            .collect()
    }
}

/// Splits on `|` unless escaped as `\|`; escapes are kept in the cell text.
pub fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in line.chars() {
        match c {
            '|' if !escaped => cells.push(std::mem::take(&mut current)),
            c => {
                escaped = c == '\\';
                current.push(c);
            }
        }
    }
    cells.push(current);
    cells.into_iter().map(|c| c.trim().to_string()).collect()
}

fn strip_outer_pipes(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    match line.strip_suffix('|') {
        Some(inner) if !inner.ends_with('\\') => inner,
        _ => line,
    }
}

/// First line holds the headers, the second the separator, the rest rows.
pub fn extract(content: &str) -> ExtractedTable {
    let mut lines = content.lines();
    let headers: Vec<String> = lines
        .next()
        .map(|l| split_cells(strip_outer_pipes(l)))
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, h)| if h.is_empty() { i.to_string() } else { h })
        .collect();
    let mut columns = vec![Vec::new(); headers.len()];
    let mut rows = Vec::new();

    for line in lines.skip(1) {
        let cells = split_cells(strip_outer_pipes(line));
        for (column, cell) in columns.iter_mut().zip(&cells) {
            if !cell.is_empty() {
                column.push(cell.clone());
            }
        }
        let cells: Vec<String> = cells.into_iter().filter(|c| !c.is_empty()).collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    ExtractedTable {
        headers,
        rows,
        columns,
    }
}

/// Rows of a lookup table: `min` alone matches exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRange {
    pub min: Int,
    pub max: Option<Int>,
    pub option: String,
}

impl LookupRange {
    /// Reads the first integer and an optional second one, so `1-3`, `4–6`
    /// and `7` all work. Cells without digits give `None`.
    pub fn parse(range: &str, option: &str) -> Option<Self> {
        let mut runs = range
            .split(|c: char| !c.is_ascii_digit())
            .filter(|s| !s.is_empty());
        let min = runs.next()?.parse().ok()?;
        let max = runs.next().and_then(|s| s.parse().ok());
        Some(Self {
            min,
            max,
            option: option.to_string(),
        })
    }

    pub fn contains(&self, value: Number) -> bool {
        match self.max {
            None => value == Number::Int(self.min),
            Some(max) => Number::Int(self.min) <= value && value <= Number::Int(max),
        }
    }
}
