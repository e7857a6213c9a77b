use super::{num::Number, roller::RandomSource, RResult};
use crate::common::*;
use crate::error::RollError;

/// Owns the random source for one evaluation and enforces the roll budget.
pub struct RollContext<R> {
    max_rolls: Option<usize>,
    rolls: usize,
    source: R,
}

impl<R: RandomSource> RollContext<R> {
    pub fn new(max_rolls: Option<usize>, source: R) -> Self {
        Self {
            max_rolls,
            rolls: 0,
            source,
        }
    }

    pub fn new_bounded(max_rolls: usize, source: R) -> Self {
        Self::new(Some(max_rolls), source)
    }

    pub fn new_unbounded(source: R) -> Self {
        Self::new(None, source)
    }

    pub fn reset(&mut self) {
        self.rolls = 0;
    }

    pub fn rolls(&self) -> usize {
        self.rolls
    }

    pub fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }

    fn count_rolls(&mut self, n: usize) -> RResult<()> {
        self.rolls += n;
        if self.max_rolls.map_or(false, |max| self.rolls > max) {
            Err(RollError::TooManyRolls)
        } else {
            Ok(())
        }
    }

    pub fn between(&mut self, min: Int, max: Int) -> RResult<Int> {
        self.count_rolls(1)?;
        Ok(self.source.between(min, max))
    }

    pub fn roll_one(&mut self, faces: DieFaces) -> RResult<Number> {
        self.between(faces.min, faces.max).map(Number::Int)
    }

    pub fn roll(&mut self, num: usize, faces: DieFaces) -> RResult<Vec<Number>> {
        self.count_rolls(num)?;
        Ok((0..num)
            .map(|_| Number::Int(self.source.between(faces.min, faces.max)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roll::ScriptedSource;

    #[test]
    fn test_budget() {
        let mut ctx = RollContext::new_bounded(3, ScriptedSource::new([1, 2, 3, 4]));
        assert_eq!(
            ctx.roll(2, DieFaces::poly(6)).unwrap(),
            vec![Number::Int(1), Number::Int(2)]
        );
        assert_eq!(ctx.roll_one(DieFaces::poly(6)).unwrap(), Number::Int(3));
        assert_eq!(ctx.roll_one(DieFaces::poly(6)), Err(RollError::TooManyRolls));

        ctx.reset();
        assert_eq!(ctx.rolls(), 0);
        assert_eq!(ctx.between(1, 6).unwrap(), 4);
    }
}
