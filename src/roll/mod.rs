mod ctx;
mod expr;
mod group;
mod modifiers;
mod num;
mod results;
mod roller;

use crate::error::RollError;

pub type RResult<T> = Result<T, RollError>;

pub use ctx::RollContext;
pub use expr::ExpressionEvaluator;
pub use group::{DieGroup, GroupEval, PercentileGroup, PlainGroup, StuntGroup};
pub use num::Number;
pub use results::{EntryId, ResultEntry, ResultSequence};
pub use roller::{RandomSource, ScriptedSource};
