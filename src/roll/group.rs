use super::{ctx::RollContext, modifiers, num::Number, results::*, roller::RandomSource, RResult};
use crate::common::*;
use crate::error::Advisory;

/// Capabilities shared by every kind of die group.
#[enum_dispatch::enum_dispatch]
pub trait GroupEval {
    fn rolls(&self) -> usize;

    fn is_static(&self) -> bool {
        false
    }

    fn supports_average(&self) -> bool;

    fn average(&self) -> Float;

    /// Rolls every die afresh, then applies modifiers and conditionals.
    fn roll<R: RandomSource>(&mut self, ctx: &mut RollContext<R>) -> RResult<()>;

    /// Re-runs modifiers and conditionals over the current raw values.
    fn reapply<R: RandomSource>(&mut self, ctx: &mut RollContext<R>) -> RResult<()>;

    /// Replaces the raw values without touching the random source.
    fn set_results(&mut self, values: Vec<Number>);

    fn attach(&mut self, modifier: Modifier);

    fn result(&self) -> Number;

    fn display(&self) -> String;

    fn advisories(&self) -> &[Advisory];
}

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch::enum_dispatch(GroupEval)]
pub enum DieGroup {
    Plain(PlainGroup),
    Percentile(PercentileGroup),
    Stunt(StuntGroup),
}

impl DieGroup {
    pub fn constant(value: impl Into<Number>) -> Self {
        Self::Plain(PlainGroup::constant(value))
    }

    pub fn dice(rolls: usize, faces: DieFaces) -> Self {
        Self::Plain(PlainGroup::new(rolls, faces))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlainGroup {
    pub faces: DieFaces,
    rolls: usize,
    constant: Option<Number>,
    modifiers: Vec<Modifier>,
    conditions: Vec<Conditional>,
    base: Vec<Number>,
    results: ResultSequence,
    advisories: Vec<Advisory>,
}

impl PlainGroup {
    pub fn new(rolls: usize, faces: DieFaces) -> Self {
        Self {
            faces,
            rolls,
            constant: None,
            modifiers: Vec::new(),
            conditions: Vec::new(),
            base: Vec::new(),
            results: ResultSequence::new(),
            advisories: Vec::new(),
        }
    }

    /// A literal that parses like dice but never rolls.
    pub fn constant(value: impl Into<Number>) -> Self {
        let value = value.into();
        let mut ret = Self::new(1, DieFaces::new(0, 0));
        ret.constant = Some(value);
        ret.base = vec![value];
        ret.results = ResultSequence::from_values([value]);
        ret
    }

    pub fn with_conditions(mut self, conditions: Vec<Conditional>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn results(&self) -> &ResultSequence {
        &self.results
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    fn notation(&self) -> String {
        match self.constant {
            Some(value) => value.to_string(),
            None => format!("{}d{}", self.rolls, self.faces),
        }
    }

    fn build<R: RandomSource>(&self, ctx: &mut RollContext<R>) -> RResult<ResultSequence> {
        let mut seq = ResultSequence::from_values(self.base.iter().copied());
        for modifier in &self.modifiers {
            modifiers::apply(ctx, &mut seq, self.faces, modifier)?;
        }
        if !self.conditions.is_empty() {
            modifiers::apply_conditions(&mut seq, &self.conditions);
        }
        Ok(seq)
    }
}

impl GroupEval for PlainGroup {
    fn rolls(&self) -> usize {
        self.rolls
    }

    fn is_static(&self) -> bool {
        self.constant.is_some()
    }

    fn supports_average(&self) -> bool {
        true
    }

    fn average(&self) -> Float {
        self.faces.average()
    }

    fn roll<R: RandomSource>(&mut self, ctx: &mut RollContext<R>) -> RResult<()> {
        if self.constant.is_some() {
            return Ok(());
        }
        let base = ctx.roll(self.rolls, self.faces)?;
        let previous = std::mem::replace(&mut self.base, base);
        match self.build(ctx) {
            Ok(seq) => {
                self.results = seq;
                Ok(())
            }
            Err(e) => {
                self.base = previous;
                Err(e)
            }
        }
    }

    fn reapply<R: RandomSource>(&mut self, ctx: &mut RollContext<R>) -> RResult<()> {
        if self.constant.is_none() {
            self.results = self.build(ctx)?;
        }
        Ok(())
    }

    fn set_results(&mut self, values: Vec<Number>) {
        if self.constant.is_none() {
            self.results = ResultSequence::from_values(values.iter().copied());
            self.base = values;
        }
    }

    fn attach(&mut self, modifier: Modifier) {
        if self.constant.is_some() {
            let advisory = Advisory::ModifierMisuse {
                notation: self.notation(),
                modifier: modifier.kind,
            };
            log::warn!("{}", advisory);
            self.advisories.push(advisory);
            return;
        }
        match self.modifiers.iter_mut().find(|m| m.kind == modifier.kind) {
            Some(existing) => *existing = modifier,
            None => self.modifiers.push(modifier),
        }
    }

    fn result(&self) -> Number {
        match self.constant {
            Some(value) => value,
            None => self.results.sum(),
        }
    }

    fn display(&self) -> String {
        match self.constant {
            Some(value) => value.to_string(),
            None => self.results.render(),
        }
    }

    fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }
}

/// A fixed 3d6 pool; a repeated value marks a stunt.
#[derive(Debug, Clone, PartialEq)]
pub struct StuntGroup {
    dice: PlainGroup,
}

impl StuntGroup {
    pub fn new() -> Self {
        Self {
            dice: PlainGroup::new(3, DieFaces::poly(6)),
        }
    }

    pub fn doubles(&self) -> bool {
        let mut seen: Vec<Number> = Vec::with_capacity(3);
        for entry in self.dice.results.iter() {
            let value = entry.total();
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
        seen.len() < 3
    }

    /// The stunt die is the first one rolled.
    pub fn stunt_points(&self) -> Option<Number> {
        if self.doubles() {
            self.dice.results.first().map(|e| e.value)
        } else {
            None
        }
    }
}

impl Default for StuntGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupEval for StuntGroup {
    fn rolls(&self) -> usize {
        3
    }

    fn supports_average(&self) -> bool {
        false
    }

    fn average(&self) -> Float {
        self.dice.average()
    }

    fn roll<R: RandomSource>(&mut self, ctx: &mut RollContext<R>) -> RResult<()> {
        self.dice.roll(ctx)
    }

    fn reapply<R: RandomSource>(&mut self, ctx: &mut RollContext<R>) -> RResult<()> {
        self.dice.reapply(ctx)
    }

    fn set_results(&mut self, values: Vec<Number>) {
        self.dice.set_results(values)
    }

    fn attach(&mut self, modifier: Modifier) {
        self.dice.attach(modifier)
    }

    fn result(&self) -> Number {
        self.dice.result()
    }

    fn display(&self) -> String {
        let doubles = self.doubles();
        let inner = self
            .dice
            .results
            .iter()
            .enumerate()
            .map(|(i, e)| {
                if i == 0 && doubles {
                    format!("{}S", e.value)
                } else {
                    e.value.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{}]", inner)
    }

    fn advisories(&self) -> &[Advisory] {
        self.dice.advisories()
    }
}

/// Rolls one `1dN` per digit of the face string and reads the digits
/// positionally, so `1d%66` yields 11..=66.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileGroup {
    rolls: usize,
    digits: NonEmpty<Int>,
    stack: Vec<Vec<PlainGroup>>,
    advisories: Vec<Advisory>,
}

impl PercentileGroup {
    pub fn new(rolls: usize, digits: NonEmpty<Int>) -> Self {
        let stack = (0..rolls)
            .map(|_| {
                digits
                    .iter()
                    .map(|&d| PlainGroup::new(1, DieFaces::poly(d)))
                    .collect()
            })
            .collect();
        Self {
            rolls,
            digits,
            stack,
            advisories: Vec::new(),
        }
    }

    fn row_value(row: &[PlainGroup]) -> Number {
        let text: String = row.iter().map(|d| d.result().to_string()).collect();
        text.parse::<Int>().map_or(Number::ZERO, Number::Int)
    }
}

impl GroupEval for PercentileGroup {
    fn rolls(&self) -> usize {
        self.rolls
    }

    fn supports_average(&self) -> bool {
        false
    }

    fn average(&self) -> Float {
        let max: String = self.digits.iter().map(ToString::to_string).collect();
        let min = "1".repeat(self.digits.len());
        (min.parse::<Float>().unwrap_or(0.0) + max.parse::<Float>().unwrap_or(0.0)) / 2.0
    }

    fn roll<R: RandomSource>(&mut self, ctx: &mut RollContext<R>) -> RResult<()> {
        let mut stack = self.stack.clone();
        for die in stack.iter_mut().flatten() {
            die.roll(ctx)?;
        }
        self.stack = stack;
        Ok(())
    }

    fn reapply<R: RandomSource>(&mut self, _: &mut RollContext<R>) -> RResult<()> {
        Ok(())
    }

    fn set_results(&mut self, _: Vec<Number>) {
        log::debug!("percentile groups keep their digit rolls");
    }

    fn attach(&mut self, modifier: Modifier) {
        let digits: String = self.digits.iter().map(ToString::to_string).collect();
        let advisory = Advisory::ModifierMisuse {
            notation: format!("{}d%{}", self.rolls, digits),
            modifier: modifier.kind,
        };
        log::warn!("{}", advisory);
        self.advisories.push(advisory);
    }

    fn result(&self) -> Number {
        self.stack.iter().map(|row| Self::row_value(row)).sum()
    }

    fn display(&self) -> String {
        self.stack
            .iter()
            .map(|row| {
                row.iter()
                    .map(|d| d.result().to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }
}
