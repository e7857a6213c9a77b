use crate::error::RollError;
use crate::multi::MultiExpression;
use crate::parse::{NotationTokenizer, Tokenizer};
use crate::replay::{ResultKind, RollValue, SerializedResult};
use crate::roll::{ExpressionEvaluator, RResult, RandomSource};
use crate::settings::Settings;
use crate::table::{RowPoolProvider, TableReference, TableResolver};
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// Anything that can be rolled, rendered and replayed.
#[async_trait]
pub trait Roller: Send {
    fn kind(&self) -> ResultKind;

    fn original(&self) -> &str;

    /// Rolls with `depth` levels of enclosing tables above this one.
    async fn roll_at_depth(&mut self, depth: usize) -> RResult<RollValue>;

    async fn roll(&mut self) -> RResult<RollValue> {
        self.roll_at_depth(0).await
    }

    fn value(&self) -> Option<RollValue>;

    fn rendered(&self) -> String;

    fn trace(&self) -> String;

    /// The single-line form used inside table and multi traces.
    fn trace_fragment(&self) -> String;

    fn to_result(&self) -> SerializedResult;

    fn apply_result(&mut self, result: &SerializedResult) -> RResult<()>;
}

/// Builds a ready-to-roll [`Roller`] for a formula.
#[async_trait]
pub trait SubRollerFactory: Send + Sync {
    /// Builds `formula` nested `depth` tables deep. Loading a lookup table
    /// builds its formula one level deeper.
    async fn build_at_depth(&self, formula: &str, depth: usize) -> RResult<Box<dyn Roller>>;

    async fn build(&self, formula: &str) -> RResult<Box<dyn Roller>> {
        self.build_at_depth(formula, 0).await
    }
}

#[async_trait]
impl<R: RandomSource + Send> Roller for ExpressionEvaluator<R> {
    fn kind(&self) -> ResultKind {
        ResultKind::Expression
    }

    fn original(&self) -> &str {
        ExpressionEvaluator::original(self)
    }

    async fn roll_at_depth(&mut self, _depth: usize) -> RResult<RollValue> {
        self.evaluate().map(RollValue::Number)
    }

    fn value(&self) -> Option<RollValue> {
        ExpressionEvaluator::value(self).map(RollValue::Number)
    }

    fn rendered(&self) -> String {
        ExpressionEvaluator::rendered(self)
    }

    fn trace(&self) -> String {
        ExpressionEvaluator::trace(self)
    }

    fn trace_fragment(&self) -> String {
        ExpressionEvaluator::trace_fragment(self)
    }

    fn to_result(&self) -> SerializedResult {
        ExpressionEvaluator::to_result(self)
    }

    fn apply_result(&mut self, result: &SerializedResult) -> RResult<()> {
        ExpressionEvaluator::apply_result(self, result)
    }
}

struct Inner {
    settings: Settings,
    provider: Arc<dyn RowPoolProvider>,
    tokenizer: Box<dyn Tokenizer>,
    rng: Mutex<StdRng>,
}

/// The bundled [`SubRollerFactory`]. Cloning is cheap and clones share one
/// seeded generator; every built roller gets its own generator forked from it.
#[derive(Clone)]
pub struct DiceEngine {
    inner: Arc<Inner>,
}

impl DiceEngine {
    pub fn new(settings: Settings, provider: impl RowPoolProvider + 'static) -> Self {
        Self::with_tokenizer(settings, provider, NotationTokenizer)
    }

    pub fn with_seed(provider: impl RowPoolProvider + 'static, seed: u64) -> Self {
        Self::new(Settings::default().with_seed(seed), provider)
    }

    pub fn with_tokenizer(
        settings: Settings,
        provider: impl RowPoolProvider + 'static,
        tokenizer: impl Tokenizer + 'static,
    ) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Arc::new(Inner {
                settings,
                provider: Arc::new(provider),
                tokenizer: Box::new(tokenizer),
                rng: Mutex::new(rng),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn provider(&self) -> &Arc<dyn RowPoolProvider> {
        &self.inner.provider
    }

    fn fork(&self) -> StdRng {
        let mut rng = self.inner.rng.lock().unwrap_or_else(|e| e.into_inner());
        StdRng::seed_from_u64(rng.gen())
    }

    /// Builds and rolls `formula`.
    pub async fn roll(&self, formula: &str) -> RResult<Box<dyn Roller>> {
        let mut roller = self.build(formula).await?;
        roller.roll().await?;
        Ok(roller)
    }

    /// Builds `formula` and restores a saved result into it without rolling.
    pub async fn restore(
        &self,
        formula: &str,
        result: &SerializedResult,
    ) -> RResult<Box<dyn Roller>> {
        let mut roller = self.build(formula).await?;
        roller.apply_result(result)?;
        Ok(roller)
    }
}

#[async_trait]
impl SubRollerFactory for DiceEngine {
    async fn build_at_depth(&self, formula: &str, depth: usize) -> RResult<Box<dyn Roller>> {
        let max_depth = self.inner.settings.max_depth;
        if depth > max_depth {
            return Err(RollError::RecursionLimitExceeded { depth: max_depth });
        }
        let formula = formula.trim();
        if formula.contains(';') {
            let multi = MultiExpression::build_at_depth(formula, self, depth).await?;
            return Ok(Box::new(multi));
        }
        if formula.parse::<TableReference>().is_ok() {
            let table = TableResolver::load(
                formula,
                self.inner.provider.as_ref(),
                Arc::new(self.clone()),
                &self.inner.settings,
                self.fork(),
                depth,
            )
            .await?;
            return Ok(Box::new(table));
        }
        let stream = self.inner.tokenizer.tokenize(formula)?;
        Ok(Box::new(ExpressionEvaluator::new(
            stream,
            self.inner.settings.clone(),
            self.fork(),
        )))
    }
}
