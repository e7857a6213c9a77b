use crate::engine::{Roller, SubRollerFactory};
use crate::error::RollError;
use crate::replay::{ResultKind, RollValue, SerializedResult};
use crate::roll::RResult;
use crate::trace::prettify;
use async_trait::async_trait;
use futures_util::future::try_join_all;

/// Several `;`-separated formulas rolled together.
pub struct MultiExpression {
    original: String,
    rollers: Vec<Box<dyn Roller>>,
    result: Option<String>,
    restored: Option<(String, String)>,
}

impl MultiExpression {
    pub async fn build(formula: &str, factory: &dyn SubRollerFactory) -> RResult<Self> {
        Self::build_at_depth(formula, factory, 0).await
    }

    pub async fn build_at_depth(
        formula: &str,
        factory: &dyn SubRollerFactory,
        depth: usize,
    ) -> RResult<Self> {
        let parts = formula
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| factory.build_at_depth(part, depth));
        let rollers = try_join_all(parts).await?;
        log::debug!("{:?} split into {} formulas", formula, rollers.len());
        Ok(Self {
            original: formula.trim().to_string(),
            rollers,
            result: None,
            restored: None,
        })
    }

    pub fn rollers(&self) -> &[Box<dyn Roller>] {
        &self.rollers
    }
}

#[async_trait]
impl Roller for MultiExpression {
    fn kind(&self) -> ResultKind {
        ResultKind::Multi
    }

    fn original(&self) -> &str {
        &self.original
    }

    async fn roll_at_depth(&mut self, depth: usize) -> RResult<RollValue> {
        try_join_all(self.rollers.iter_mut().map(|r| r.roll_at_depth(depth))).await?;
        let result = self
            .rollers
            .iter()
            .map(|r| r.rendered())
            .collect::<Vec<_>>()
            .join(", ");
        self.restored = None;
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
        match &self.restored {
            Some((trace, _)) => trace.clone(),
            None => prettify(&self.trace_fragment()),
        }
    }

    fn trace_fragment(&self) -> String {
        if let Some((_, fragment)) = &self.restored {
            return fragment.clone();
        }
        self.rollers
            .iter()
            .map(|r| r.trace_fragment())
            .collect::<Vec<_>>()
            .join(" ;")
    }

    fn to_result(&self) -> SerializedResult {
        SerializedResult::new(ResultKind::Multi, self.rendered(), self.trace())
            .with_fragment(self.trace_fragment())
    }

    fn apply_result(&mut self, result: &SerializedResult) -> RResult<()> {
        if result.kind != ResultKind::Multi {
            return Err(RollError::ReplayKindMismatch {
                expected: ResultKind::Multi,
                found: result.kind,
            });
        }
        self.result = Some(result.value.to_string());
        self.restored = Some((result.trace.clone(), result.fragment_or_trace()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DiceEngine;
    use crate::table::MemoryTables;

    fn engine() -> DiceEngine {
        let mut t = MemoryTables::new();
        t.insert_list("Loot", "gems", ["Ruby", "Opal", "Jade"]);
        DiceEngine::with_seed(t, 11)
    }

    #[tokio::test]
    async fn test_fan_out() {
        let engine = engine();
        let mut multi = MultiExpression::build("1d6; 5; [[Loot]]^gems", &engine)
            .await
            .unwrap();
        assert_eq!(multi.rollers().len(), 3);
        multi.roll().await.unwrap();

        let rendered = multi.rendered();
        let parts: Vec<&str> = rendered.split(", ").collect();
        assert_eq!(parts.len(), 3);
        assert!((1..=6).contains(&parts[0].parse::<i64>().unwrap()));
        assert_eq!(parts[1], "5");
        assert!(["Ruby", "Opal", "Jade"].contains(&parts[2]));

        let fragment = multi.trace_fragment();
        assert!(fragment.starts_with("1d6 --> ["));
        assert!(fragment.contains(" ;5 --> 5 ;[[Loot]]^gems 3 rows --> [row "));
        assert!(multi.trace().contains(",\n5 --> 5 ,\n"));
    }

    #[tokio::test]
    async fn test_any_failure_fails_all() {
        let engine = engine();
        let err = MultiExpression::build("1d6; [[Loot]]^coins", &engine).await.err();
        assert_eq!(err, Some(RollError::missing("Loot", "coins", None)));

        let mut multi = MultiExpression::build("1d6; 1/0", &engine).await.unwrap();
        assert_eq!(multi.roll().await, Err(RollError::ZeroDivision));
    }

    #[tokio::test]
    async fn test_replay() {
        let engine = engine();
        let mut multi = MultiExpression::build("2d4; 1d8", &engine).await.unwrap();
        multi.roll().await.unwrap();
        let saved = multi.to_result();

        let mut fresh = MultiExpression::build("2d4; 1d8", &engine).await.unwrap();
        fresh.apply_result(&saved).unwrap();
        assert_eq!(fresh.rendered(), multi.rendered());
        assert_eq!(fresh.trace(), multi.trace());
        assert_eq!(fresh.trace_fragment(), multi.trace_fragment());
    }
}
