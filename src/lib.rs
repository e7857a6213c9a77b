//! Dice notation, random tables and their replayable results.
//!
//! ```no_run
//! # async fn demo() -> dice_stack::RResult<()> {
//! use dice_stack::{DiceEngine, MemoryTables, Roller, Settings};
//!
//! let engine = DiceEngine::new(Settings::default(), MemoryTables::new());
//! let roller = engine.roll("4d6kh3 + 2").await?;
//! println!("{}\n{}", roller.rendered(), roller.trace());
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod engine;
pub mod error;
pub mod multi;
pub mod parse;
pub mod replay;
pub mod roll;
pub mod settings;
pub mod table;
pub mod trace;

pub use engine::{DiceEngine, Roller, SubRollerFactory};
pub use error::{Advisory, RollError};
pub use multi::MultiExpression;
pub use replay::{ResultKind, RollValue, SerializedResult};
pub use roll::{ExpressionEvaluator, Number, RResult};
pub use settings::{EvalMode, Round, Settings};
pub use table::{MemoryTables, RowPoolProvider, TableReference, TableResolver, TableSource};

/// Tokenizes and evaluates `formula` once with a fresh generator.
pub fn roll(formula: &str) -> RResult<Number> {
    roll_with(formula, Settings::default(), rand::thread_rng())
}

pub fn roll_with<R: roll::RandomSource>(
    formula: &str,
    settings: Settings,
    source: R,
) -> RResult<Number> {
    ExpressionEvaluator::from_formula(formula, settings, source)?.evaluate()
}
