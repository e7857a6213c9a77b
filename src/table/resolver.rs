use super::{extract, LookupRange, RowPoolProvider, TableReference, TableSource};
use crate::engine::{Roller, SubRollerFactory};
use crate::error::{Advisory, RollError};
use crate::replay::{ResultKind, RollValue, SerializedResult};
use crate::roll::{RResult, RandomSource};
use crate::settings::Settings;
use crate::trace::prettify;
use async_trait::async_trait;
use std::sync::Arc;

const MARKER: &str = "`dice:";

struct Lookup {
    roller: Box<dyn Roller>,
    ranges: Vec<LookupRange>,
}

/// Draws rows from a loaded table and expands the sub-formulas they embed.
pub struct TableResolver<R> {
    original: String,
    reference: TableReference,
    pool: Vec<String>,
    lookup: Option<Lookup>,
    factory: Arc<dyn SubRollerFactory>,
    source: R,
    max_depth: usize,
    result: Option<String>,
    combined: String,
    trace: String,
    advisories: Vec<Advisory>,
}

impl<R: RandomSource + Send> TableResolver<R> {
    /// Fetches the referenced block and decides between lookup and plain mode.
    pub async fn load(
        original: &str,
        provider: &dyn RowPoolProvider,
        factory: Arc<dyn SubRollerFactory>,
        settings: &Settings,
        source: R,
        depth: usize,
    ) -> RResult<Self> {
        let original = original.trim();
        let reference: TableReference = original.parse()?;
        let table = provider.fetch(&reference.path, &reference.block).await?;

        let mut lookup = None;
        let pool = match table {
            TableSource::List(rows) => rows,
            TableSource::Table(text) => {
                let table = extract::extract(&text);
                if let Some(formula) = table.lookup_formula() {
                    let roller = factory.build_at_depth(formula, depth + 1).await?;
                    if roller.kind() == ResultKind::Expression {
                        let ranges = table.lookup_ranges();
                        log::debug!("{} is a lookup table with {} ranges", reference, ranges.len());
                        lookup = Some(Lookup { roller, ranges });
                    } else {
                        log::debug!("lookup formula {:?} is not an expression", formula);
                    }
                }
                match &reference.header {
                    Some(header) => table
                        .column(header)
                        .map(<[String]>::to_vec)
                        .ok_or_else(|| {
                            RollError::missing(&reference.path, &reference.block, Some(header.as_str()))
                        })?,
                    None => table.row_texts(),
                }
            }
        };
        log::debug!("loaded {} rows from {}", pool.len(), reference);

        Ok(Self {
            original: original.to_string(),
            reference,
            pool,
            lookup,
            factory,
            source,
            max_depth: settings.max_depth,
            result: None,
            combined: String::new(),
            trace: String::new(),
            advisories: Vec::new(),
        })
    }

    pub fn reference(&self) -> &TableReference {
        &self.reference
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn is_lookup(&self) -> bool {
        self.lookup.is_some()
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// One selection: a trace fragment and the chosen text.
    async fn select(
        &mut self,
        remaining: &mut Vec<usize>,
        depth: usize,
    ) -> RResult<Option<(String, String)>> {
        if let Some(lookup) = &mut self.lookup {
            let value = lookup.roller.roll_at_depth(depth + 1).await?;
            let value = value.as_number().ok_or_else(|| RollError::NotANumber {
                formula: lookup.roller.original().to_string(),
            })?;
            return Ok(match lookup.ranges.iter().find(|r| r.contains(value)) {
                Some(range) => {
                    let mut fragment = lookup.roller.trace_fragment();
                    if let Some(header) = &self.reference.header {
                        fragment.push_str(" | ");
                        fragment.push_str(header);
                    }
                    Some((fragment, range.option.clone()))
                }
                None => {
                    let advisory = Advisory::LookupRangeMiss {
                        formula: lookup.roller.original().to_string(),
                        value: value.to_string(),
                    };
                    log::warn!("{}", advisory);
                    self.advisories.push(advisory);
                    None
                }
            });
        }

        if self.pool.is_empty() {
            log::warn!("{} has no rows", self.reference);
            return Ok(None);
        }
        if remaining.is_empty() {
            remaining.extend(0..self.pool.len());
        }
        let last = remaining.len() as i64 - 1;
        let pick = self.source.between(0, last).clamp(0, last) as usize;
        let fragment = format!("{} rows --> [row {}]", remaining.len(), remaining[pick] + 1);
        let row = remaining.remove(pick);
        Ok(Some((fragment, self.pool[row].clone())))
    }

    fn combine(&self, fragments: &[String]) -> String {
        match fragments {
            [] => self.original.clone(),
            [one] => format!("{} {}", self.original, one),
            many => format!("{} ==> ({})", self.original, many.join(" ||")),
        }
    }
}

/// Replaces each `` `dice: formula` `` in `text` with the formula's rolled value.
pub(crate) async fn expand(
    factory: &dyn SubRollerFactory,
    text: &str,
    depth: usize,
) -> RResult<(String, Vec<String>)> {
    let mut out = String::with_capacity(text.len());
    let mut fragments = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(MARKER) {
        let body = &rest[start + MARKER.len()..];
        let Some(end) = body.find('`') else {
            break;
        };
        let formula = body[..end].trim();
        log::debug!("expanding {:?} at depth {}", formula, depth);

        let mut roller = factory.build_at_depth(formula, depth + 1).await?;
        let value = roller.roll_at_depth(depth + 1).await?;
        out.push_str(&rest[..start]);
        out.push_str(&value.to_string());
        fragments.push(roller.trace_fragment());
        rest = &body[end + 1..];
    }
    out.push_str(rest);
    Ok((out, fragments))
}

#[async_trait]
impl<R: RandomSource + Send> Roller for TableResolver<R> {
    fn kind(&self) -> ResultKind {
        ResultKind::Table
    }

    fn original(&self) -> &str {
        &self.original
    }

    async fn roll_at_depth(&mut self, depth: usize) -> RResult<RollValue> {
        if depth > self.max_depth {
            return Err(RollError::RecursionLimitExceeded {
                depth: self.max_depth,
            });
        }
        self.advisories.clear();
        let factory = Arc::clone(&self.factory);
        let mut remaining = Vec::new();
        let mut results = Vec::with_capacity(self.reference.count);
        let mut fragments = Vec::with_capacity(self.reference.count);

        for _ in 0..self.reference.count {
            let Some((mut fragment, selected)) = self.select(&mut remaining, depth).await? else {
                continue;
            };
            let (text, nested) = expand(factory.as_ref(), &selected, depth).await?;
            if !nested.is_empty() {
                fragment.push_str(&format!(" > ({})", nested.join(";")));
            }
            results.push(text);
            fragments.push(fragment);
        }

        let result = results.join("||");
        self.combined = self.combine(&fragments);
        self.trace = prettify(&self.combined);
        self.result = Some(result.clone());
        Ok(RollValue::Text(result))
    }

    fn value(&self) -> Option<RollValue> {
        self.result.clone().map(RollValue::Text)
    }

    fn rendered(&self) -> String {
        self.result.clone().unwrap_or_default()
    }

    fn trace(&self) -> String {
        self.trace.clone()
    }

    fn trace_fragment(&self) -> String {
        self.combined.clone()
    }

    fn to_result(&self) -> SerializedResult {
        SerializedResult::new(ResultKind::Table, self.rendered(), self.trace())
            .with_fragment(self.combined.clone())
    }

    fn apply_result(&mut self, result: &SerializedResult) -> RResult<()> {
        if result.kind != ResultKind::Table {
            return Err(RollError::ReplayKindMismatch {
                expected: ResultKind::Table,
                found: result.kind,
            });
        }
        self.result = Some(result.value.to_string());
        self.trace = result.trace.clone();
        self.combined = result.fragment_or_trace();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DiceEngine;
    use crate::roll::ScriptedSource;
    use crate::table::MemoryTables;

    fn tables() -> MemoryTables {
        let mut t = MemoryTables::new();
        t.insert_list("Loot", "gems", ["Ruby", "Opal", "Jade"]);
        t.insert_table(
            "Loot",
            "weapons",
            "| Name | Damage |\n|--|--|\n| Sword | 1d8 |\n| Axe | 1d6 |",
        );
        t.insert_table(
            "Loot",
            "encounter",
            "| dice: 1d6 | Result |\n|--|--|\n| 1-3 | Goblin |\n| 4-6 | `dice: 1d4` Orcs |",
        );
        t.insert_list("Loot", "coins", ["`dice: 2d6` gold and `dice: [[Loot]]^gems`"]);
        t.insert_list("Loop", "self", ["again `dice: [[Loop]]^self`"]);
        t.insert_table("Loop", "lookup", "| dice: [[Loop]]^lookup | R |\n|--|--|\n| 1 | a |");
        t
    }

    async fn load(
        formula: &str,
        engine: &DiceEngine,
        rolls: &[i64],
    ) -> RResult<TableResolver<ScriptedSource>> {
        TableResolver::load(
            formula,
            engine.provider().as_ref(),
            Arc::new(engine.clone()),
            engine.settings(),
            ScriptedSource::new(rolls.to_vec()),
            0,
        )
        .await
    }

    #[tokio::test]
    async fn test_plain_selection_without_replacement() {
        let engine = DiceEngine::with_seed(tables(), 7);
        let mut t = load("3[[Loot]]^gems", &engine, &[2, 0, 0]).await.unwrap();
        let value = t.roll().await.unwrap();
        assert_eq!(value, RollValue::Text("Jade||Ruby||Opal".into()));
        assert_eq!(
            t.trace_fragment(),
            "3[[Loot]]^gems ==> (3 rows --> [row 3] ||2 rows --> [row 1] ||1 rows --> [row 2])"
        );
        assert_eq!(
            t.trace(),
            "3[[Loot]]^gems ==> (\n\t3 rows --> [row 3] ||\n\t2 rows --> [row 1] ||\n\t1 rows --> [row 2]\n)"
        );
    }

    #[tokio::test]
    async fn test_pool_refills_when_exhausted() {
        let engine = DiceEngine::with_seed(tables(), 7);
        let mut t = load("4[[Loot]]^gems", &engine, &[0, 0, 0, 1]).await.unwrap();
        t.roll().await.unwrap();
        assert_eq!(t.rendered(), "Ruby||Opal||Jade||Opal");
    }

    #[tokio::test]
    async fn test_header_column() {
        let engine = DiceEngine::with_seed(tables(), 7);
        let mut t = load("[[Loot]]^weapons|Damage", &engine, &[1]).await.unwrap();
        assert_eq!(t.pool(), ["1d8", "1d6"]);
        t.roll().await.unwrap();
        assert_eq!(t.rendered(), "1d6");
        assert_eq!(t.trace(), "[[Loot]]^weapons|Damage 2 rows --> [row 2]");

        let err = load("[[Loot]]^weapons|Weight", &engine, &[]).await.err();
        assert_eq!(
            err,
            Some(RollError::missing("Loot", "weapons", Some("Weight")))
        );
        let err = load("[[Loot]]^armor", &engine, &[]).await.err();
        assert_eq!(err, Some(RollError::missing("Loot", "armor", None)));
    }

    #[tokio::test]
    async fn test_row_texts_without_header() {
        let engine = DiceEngine::with_seed(tables(), 7);
        let mut t = load("[[Loot]]^weapons", &engine, &[0]).await.unwrap();
        t.roll().await.unwrap();
        assert_eq!(t.rendered(), "Sword | 1d8");
    }

    #[tokio::test]
    async fn test_lookup_table() {
        let engine = DiceEngine::with_seed(tables(), 7);
        let mut t = load("2[[Loot]]^encounter", &engine, &[]).await.unwrap();
        assert!(t.is_lookup());
        t.roll().await.unwrap();
        for part in t.rendered().split("||") {
            assert!(
                part == "Goblin" || part.ends_with(" Orcs"),
                "unexpected {:?}",
                part
            );
        }
        assert!(t.trace_fragment().starts_with("2[[Loot]]^encounter ==> (1d6 --> ["));
    }

    #[tokio::test]
    async fn test_nested_formulas() {
        let engine = DiceEngine::with_seed(tables(), 7);
        let mut t = load("[[Loot]]^coins", &engine, &[0]).await.unwrap();
        t.roll().await.unwrap();
        let rendered = t.rendered();
        let (gold, gem) = rendered.split_once(" gold and ").unwrap();
        assert!((2..=12).contains(&gold.parse::<i64>().unwrap()));
        assert!(["Ruby", "Opal", "Jade"].contains(&gem));

        let fragment = t.trace_fragment();
        assert!(fragment.starts_with("[[Loot]]^coins 1 rows --> [row 1] > (2d6 --> ["));
        assert!(fragment.contains(";[[Loot]]^gems 3 rows --> [row "));
    }

    #[tokio::test]
    async fn test_recursion_limit() {
        let engine = DiceEngine::with_seed(tables(), 7);
        let mut t = load("[[Loop]]^self", &engine, &[0]).await.unwrap();
        assert_eq!(
            t.roll().await,
            Err(RollError::RecursionLimitExceeded { depth: 20 })
        );

        let err = load("[[Loop]]^lookup", &engine, &[]).await.err();
        assert_eq!(err, Some(RollError::RecursionLimitExceeded { depth: 20 }));
    }

    #[tokio::test]
    async fn test_replay() {
        let engine = DiceEngine::with_seed(tables(), 7);
        let mut t = load("2[[Loot]]^gems", &engine, &[1, 1]).await.unwrap();
        t.roll().await.unwrap();
        let saved = t.to_result();
        assert_eq!(saved.value, RollValue::Text("Opal||Jade".into()));

        let mut fresh = load("2[[Loot]]^gems", &engine, &[]).await.unwrap();
        fresh.apply_result(&saved).unwrap();
        assert_eq!(fresh.rendered(), t.rendered());
        assert_eq!(fresh.trace(), t.trace());
        assert_eq!(fresh.trace_fragment(), t.trace_fragment());
        assert!(!fresh.trace_fragment().contains('\n'));

        let wrong = SerializedResult::new(ResultKind::Multi, "x".to_string(), "");
        assert!(matches!(
            fresh.apply_result(&wrong),
            Err(RollError::ReplayKindMismatch { .. })
        ));
    }
}
