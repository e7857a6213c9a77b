use super::{
    ctx::RollContext,
    group::{DieGroup, GroupEval, PercentileGroup, PlainGroup, StuntGroup},
    num::Number,
    roller::RandomSource,
    RResult,
};
use crate::common::*;
use crate::error::{Advisory, RollError};
use crate::parse::{self, ParseError, PostfixToken, Span, TokenStream};
use crate::replay::{ResultKind, RollValue, SerializedResult};
use crate::settings::{EvalMode, Settings};

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Group(usize),
    Literal(Number),
}

#[derive(Debug, Clone, PartialEq)]
enum ReplayItem {
    Operand(Operand),
    Operator(BinaryOperator),
}

#[derive(Debug, Clone, PartialEq)]
struct Restored {
    trace: String,
    stunt_points: Option<Number>,
}

/// Evaluates one postfix token stream against a random source.
///
/// Groups are built on the first evaluation and reused afterwards, so the
/// same evaluator can be rolled again or replayed from a [`SerializedResult`].
pub struct ExpressionEvaluator<R> {
    original: String,
    tokens: Vec<PostfixToken>,
    settings: Settings,
    ctx: RollContext<R>,
    groups: Vec<(DieGroup, Span)>,
    replay: Vec<ReplayItem>,
    value: Option<Number>,
    averaged: bool,
    restored: Option<Restored>,
}

impl<R: RandomSource> ExpressionEvaluator<R> {
    pub fn new(stream: TokenStream, settings: Settings, source: R) -> Self {
        Self {
            original: stream.original,
            tokens: stream.tokens,
            ctx: RollContext::new(settings.max_rolls, source),
            settings,
            groups: Vec::new(),
            replay: Vec::new(),
            value: None,
            averaged: false,
            restored: None,
        }
    }

    pub fn from_formula(formula: &str, settings: Settings, source: R) -> RResult<Self> {
        let stream = parse::tokenize(formula)?;
        Ok(Self::new(stream, settings, source))
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn groups(&self) -> impl Iterator<Item = &DieGroup> {
        self.groups.iter().map(|(g, _)| g)
    }

    pub fn value(&self) -> Option<Number> {
        self.value
    }

    pub fn rolls_used(&self) -> usize {
        self.ctx.rolls()
    }

    pub fn averaged(&self) -> bool {
        self.averaged
    }

    pub fn advisories(&self) -> Vec<Advisory> {
        self.groups()
            .flat_map(|g| g.advisories().iter().cloned())
            .collect()
    }

    /// Rolls every group once and folds the operators over the results.
    ///
    /// On failure the groups, value and trace of the previous roll are kept.
    pub fn evaluate(&mut self) -> RResult<Number> {
        let groups = self.groups.clone();
        let replay = self.replay.clone();
        let restored = self.restored.take();
        let averaged = std::mem::replace(&mut self.averaged, false);
        self.ctx.reset();
        self.evaluate_fresh().map_err(|why| {
            self.groups = groups;
            self.replay = replay;
            self.restored = restored;
            self.averaged = averaged;
            why
        })
    }

    fn evaluate_fresh(&mut self) -> RResult<Number> {
        let built = self.groups.len();
        let mut replay = Vec::with_capacity(self.tokens.len());
        let mut unrolled: Vec<Option<usize>> = Vec::new();
        let mut index: usize = 0;

        for token in &self.tokens {
            log::trace!("evaluating {:?}", token);
            match token {
                PostfixToken::Number { value, span } if span.is_empty() => {
                    replay.push(ReplayItem::Operand(Operand::Literal(*value)));
                    unrolled.push(None);
                }
                PostfixToken::Modifier {
                    op,
                    conditions,
                    span,
                } => {
                    let target = index
                        .checked_sub(1)
                        .filter(|&i| i >= built)
                        .and_then(|i| self.groups.get_mut(i));
                    match target {
                        Some((group, group_span)) => {
                            group.attach(op.into_modifier(group.rolls(), conditions.clone()));
                            group_span.end = group_span.end.max(span.end);
                        }
                        None if index == 0 => {
                            return Err(ParseError::malformed("modifier before any dice").into())
                        }
                        None => {}
                    }
                }
                PostfixToken::Operator { op, .. } => {
                    let b = unrolled
                        .pop()
                        .ok_or_else(|| ParseError::malformed(format!("{} is missing operands", op)))?;
                    let a = unrolled.pop().flatten();
                    roll_at(&mut self.groups, &mut self.ctx, b)?;
                    roll_at(&mut self.groups, &mut self.ctx, a)?;
                    unrolled.push(None);
                    replay.push(ReplayItem::Operator(*op));
                }
                operand => {
                    if self.groups.len() <= index {
                        let group = build_group(operand)?;
                        self.groups.push((group, operand.span().clone()));
                    }
                    replay.push(ReplayItem::Operand(Operand::Group(index)));
                    unrolled.push(Some(index));
                    index += 1;
                }
            }
        }

        match unrolled.as_slice() {
            [last] => roll_at(&mut self.groups, &mut self.ctx, *last)?,
            [] => return Err(ParseError::Empty.into()),
            _ => return Err(ParseError::malformed("operands left over").into()),
        }
        self.replay = replay;

        let mut value = self.recalculate()?;
        if self.settings.mode == EvalMode::Average {
            if self.groups().all(|g| g.supports_average()) {
                value = self.substitute_averages()?;
                self.averaged = true;
            } else {
                log::debug!("{:?} cannot be averaged, rolled instead", self.original);
            }
        }
        self.value = Some(value);
        Ok(value)
    }

    fn substitute_averages(&mut self) -> RResult<Number> {
        for (group, _) in self.groups.iter_mut().filter(|(g, _)| !g.is_static()) {
            let avg = Number::Float(group.average());
            group.set_results(vec![avg; group.rolls()]);
            group.reapply(&mut self.ctx)?;
        }
        Ok(self.recalculate()?.floor())
    }

    /// Folds the operators over the groups' current results without rolling.
    pub fn recalculate(&self) -> RResult<Number> {
        let mut stack: Vec<Number> = Vec::new();
        for item in &self.replay {
            match item {
                ReplayItem::Operand(Operand::Group(i)) => {
                    let (group, _) = self
                        .groups
                        .get(*i)
                        .ok_or_else(|| ParseError::malformed("unknown group"))?;
                    stack.push(group.result());
                }
                ReplayItem::Operand(Operand::Literal(n)) => stack.push(*n),
                ReplayItem::Operator(op) => {
                    let b = stack
                        .pop()
                        .ok_or_else(|| ParseError::malformed(format!("{} is missing operands", op)))?;
                    let value = match stack.pop() {
                        Some(a) => apply(*op, a, b)?,
                        None => unary(*op, b)?,
                    };
                    stack.push(value);
                }
            }
        }
        match stack.as_slice() {
            [value] => Ok(*value),
            _ => Err(ParseError::malformed("operands left over").into()),
        }
    }

    /// The formula with each group replaced by its rolled display.
    pub fn result_text(&self) -> String {
        let mut ret = String::with_capacity(self.original.len());
        let mut last = 0;
        for (group, span) in &self.groups {
            if span.is_empty() || span.start < last {
                continue;
            }
            if let Some(before) = self.original.get(last..span.start) {
                ret.push_str(before);
                ret.push_str(&group.display());
                last = span.end;
            }
        }
        ret.push_str(self.original.get(last..).unwrap_or_default());
        ret
    }

    pub fn trace(&self) -> String {
        if let Some(restored) = &self.restored {
            return restored.trace.clone();
        }
        let average = if self.averaged { "average: " } else { "" };
        format!("{}\n{}{}", self.original, average, self.result_text())
    }

    pub fn trace_fragment(&self) -> String {
        self.trace().replace('\n', " --> ")
    }

    pub fn stunt_points(&self) -> Option<Number> {
        if let Some(restored) = &self.restored {
            return restored.stunt_points;
        }
        self.groups().find_map(|g| match g {
            DieGroup::Stunt(stunt) => stunt.stunt_points(),
            _ => None,
        })
    }

    /// The rounded value as shown to the user.
    pub fn rendered(&self) -> String {
        let Some(value) = self.value else {
            return String::new();
        };
        let mut ret = self.settings.round.apply(value).to_string();
        if let Some(points) = self.stunt_points() {
            ret.push_str(&format!(" - {} Stunt Points", points));
        }
        ret
    }

    pub fn to_result(&self) -> SerializedResult {
        let mut ret = SerializedResult::new(
            ResultKind::Expression,
            self.value.unwrap_or(Number::ZERO),
            self.trace(),
        );
        ret.stunt_points = self.stunt_points();
        ret
    }

    /// Restores a saved roll without touching the random source.
    pub fn apply_result(&mut self, result: &SerializedResult) -> RResult<()> {
        if result.kind != ResultKind::Expression {
            return Err(RollError::ReplayKindMismatch {
                expected: ResultKind::Expression,
                found: result.kind,
            });
        }
        let value = match &result.value {
            RollValue::Number(n) => *n,
            RollValue::Text(_) => {
                return Err(RollError::NotANumber {
                    formula: self.original.clone(),
                })
            }
        };
        self.value = Some(value);
        self.restored = Some(Restored {
            trace: result.trace.clone(),
            stunt_points: result.stunt_points,
        });
        Ok(())
    }
}

fn roll_at<R: RandomSource>(
    groups: &mut [(DieGroup, Span)],
    ctx: &mut RollContext<R>,
    index: Option<usize>,
) -> RResult<()> {
    match index.and_then(|i| groups.get_mut(i)) {
        Some((group, _)) => group.roll(ctx),
        None => Ok(()),
    }
}

fn build_group(token: &PostfixToken) -> RResult<DieGroup> {
    Ok(match token {
        PostfixToken::Number { value, .. } => DieGroup::constant(*value),
        PostfixToken::Dice {
            rolls,
            faces,
            conditions,
            ..
        } => PlainGroup::new(*rolls, *faces)
            .with_conditions(conditions.clone())
            .into(),
        PostfixToken::Percentile { rolls, digits, .. } => {
            PercentileGroup::new(*rolls, digits.clone()).into()
        }
        PostfixToken::Stunt { .. } => StuntGroup::new().into(),
        t => return Err(ParseError::malformed(format!("{:?} is not an operand", t)).into()),
    })
}

fn apply(op: BinaryOperator, a: Number, b: Number) -> RResult<Number> {
    Ok(match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => a.checked_div(b).ok_or(RollError::ZeroDivision)?,
        BinaryOperator::Pow => a.pow(b),
    })
}

fn unary(op: BinaryOperator, x: Number) -> RResult<Number> {
    match op {
        BinaryOperator::Sub => Ok(-x),
        BinaryOperator::Add => Ok(x),
        op => Err(ParseError::malformed(format!("{} needs two operands", op)).into()),
    }
}
