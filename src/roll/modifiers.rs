//! The post-roll transformations applied to a single group's results.

use super::{ctx::RollContext, num::Number, results::*, roller::RandomSource, RResult};
use crate::common::*;
use std::cmp::Ordering;

pub(crate) fn apply<R: RandomSource>(
    ctx: &mut RollContext<R>,
    seq: &mut ResultSequence,
    faces: DieFaces,
    modifier: &Modifier,
) -> RResult<()> {
    let count = modifier.count;
    match modifier.kind {
        ModifierKind::KeepHigh => keep(seq, count as usize, |a, b| b.partial_cmp(a)),
        ModifierKind::KeepLow => keep(seq, count as usize, |a, b| a.partial_cmp(b)),
        ModifierKind::Reroll => {
            let conds = or_default(&modifier.conditionals, faces.min);
            reroll(ctx, seq, faces, count, &conds)?
        }
        ModifierKind::Explode => {
            let conds = or_default(&modifier.conditionals, faces.max);
            explode(ctx, seq, faces, count, &conds)?
        }
        ModifierKind::ExplodeCombine => {
            let conds = or_default(&modifier.conditionals, faces.max);
            explode_combine(ctx, seq, faces, count, &conds)?
        }
    }
    Ok(())
}

fn or_default(conds: &[Conditional], face: Int) -> Vec<Conditional> {
    if conds.is_empty() {
        vec![Conditional::equal(face)]
    } else {
        conds.to_vec()
    }
}

fn keep(
    seq: &mut ResultSequence,
    n: usize,
    order: impl Fn(&Number, &Number) -> Option<Ordering>,
) {
    let mut ids = seq.ids();
    // `sort_by` is stable, so ties keep roll order.
    ids.sort_by(|&a, &b| {
        order(&seq.get(a).value, &seq.get(b).value).unwrap_or(Ordering::Equal)
    });
    for id in ids.into_iter().skip(n) {
        let entry = seq.get_mut(id);
        entry.usable = false;
        entry.tag(Tag::Dropped);
    }
}

fn reroll<R: RandomSource>(
    ctx: &mut RollContext<R>,
    seq: &mut ResultSequence,
    faces: DieFaces,
    times: u32,
    conds: &[Conditional],
) -> RResult<()> {
    let mut active: Vec<_> = seq
        .ids()
        .into_iter()
        .filter(|&id| check_conditions(seq.get(id).value, conds))
        .collect();

    for _ in 0..times {
        active.retain(|&id| check_conditions(seq.get(id).value, conds));
        if active.is_empty() {
            break;
        }
        for &id in &active {
            let value = ctx.roll_one(faces)?;
            let entry = seq.get_mut(id);
            entry.tag(Tag::Rerolled);
            entry.set_value(value);
        }
    }
    Ok(())
}

fn explode<R: RandomSource>(
    ctx: &mut RollContext<R>,
    seq: &mut ResultSequence,
    faces: DieFaces,
    times: u32,
    conds: &[Conditional],
) -> RResult<()> {
    let origins: Vec<_> = seq
        .ids()
        .into_iter()
        .filter(|&id| check_conditions(seq.get(id).value, conds))
        .collect();

    for origin in origins {
        let mut current = origin;
        let mut i = 0;
        while i < times && check_conditions(seq.get(current).value, conds) {
            seq.get_mut(current).tag(Tag::Exploded);
            let value = ctx.roll_one(faces)?;
            current = seq.insert_after(current, ResultEntry::new(value));
            i += 1;
        }
    }
    Ok(())
}

fn explode_combine<R: RandomSource>(
    ctx: &mut RollContext<R>,
    seq: &mut ResultSequence,
    faces: DieFaces,
    times: u32,
    conds: &[Conditional],
) -> RResult<()> {
    let origins: Vec<_> = seq
        .ids()
        .into_iter()
        .filter(|&id| check_conditions(seq.get(id).value, conds))
        .collect();

    for id in origins {
        let mut i = 0;
        let mut last = seq.get(id).value;
        while i < times && check_conditions(last, conds) {
            last = ctx.roll_one(faces)?;
            let entry = seq.get_mut(id);
            let total = entry.value + last;
            entry.set_value(total);
            entry.tag(Tag::Exploded);
            i += 1;
        }
    }
    Ok(())
}

/// Turns the group into a success pool.
pub(crate) fn apply_conditions(seq: &mut ResultSequence, conds: &[Conditional]) {
    let negate = conds.iter().find(|c| c.is_negate()).map(|c| c.comparer);
    for id in seq.ids() {
        let entry = seq.get_mut(id);
        if negate == Some(entry.value) {
            entry.value = Number::Int(-1);
            entry.tag(Tag::Failure);
        } else if check_conditions(entry.value, conds) {
            entry.value = Number::ONE;
            entry.tag(Tag::Success);
        } else {
            entry.usable = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roll::ScriptedSource;

    fn seq(xs: &[i64]) -> ResultSequence {
        ResultSequence::from_values(xs.iter().map(|&x| Number::Int(x)))
    }

    fn ctx(xs: &[i64]) -> RollContext<ScriptedSource> {
        RollContext::new_bounded(1000, ScriptedSource::new(xs.to_vec()))
    }

    fn usable(seq: &ResultSequence) -> Vec<Number> {
        seq.iter().filter(|e| e.usable).map(|e| e.value).collect()
    }

    #[test]
    fn test_keep_high_ties_in_roll_order() {
        let mut s = seq(&[5, 3, 5, 5]);
        keep(&mut s, 2, |a, b| b.partial_cmp(a));
        assert_eq!(s.render(), "[5, 3d, 5, 5d]");
    }

    #[test]
    fn test_keep_low() {
        let mut s = seq(&[18, 4]);
        let mut c = ctx(&[]);
        apply(&mut c, &mut s, DieFaces::poly(20), &Modifier::keep_low(1)).unwrap();
        assert_eq!(usable(&s), vec![Number::Int(4)]);
        assert_eq!(s.sum(), Number::Int(4));
    }

    #[test]
    fn test_keep_more_than_rolled() {
        let mut s = seq(&[2, 1]);
        let mut c = ctx(&[]);
        apply(&mut c, &mut s, DieFaces::poly(6), &Modifier::keep_low(5)).unwrap();
        assert_eq!(s.render(), "[2, 1]");
    }

    #[test]
    fn test_reroll_default_min() {
        let mut s = seq(&[1, 4, 1]);
        let mut c = ctx(&[1, 3, 5]);
        apply(&mut c, &mut s, DieFaces::poly(6), &Modifier::reroll(3)).unwrap();
        // Second pass only rerolls the die that is still a 1.
        assert_eq!(s.render(), "[5r, 4, 3r]");
        assert_eq!(c.rolls(), 3);
    }

    #[test]
    fn test_reroll_cap() {
        let mut s = seq(&[1]);
        let mut c = ctx(&[1, 1, 1, 6]);
        apply(&mut c, &mut s, DieFaces::poly(6), &Modifier::reroll(2)).unwrap();
        assert_eq!(s.values(), vec![Number::Int(1)]);
        assert_eq!(c.rolls(), 2);
    }

    #[test]
    fn test_explode_chain_adjacent() {
        let mut s = seq(&[6, 2, 6]);
        let mut c = ctx(&[6, 3, 1]);
        let m = Modifier::explode(UNBOUNDED_REPEATS);
        apply(&mut c, &mut s, DieFaces::poly(6), &m).unwrap();
        assert_eq!(s.render(), "[6!, 6!, 3, 2, 6!, 1]");
        assert_eq!(s.sum(), Number::Int(24));
    }

    #[test]
    fn test_explode_times() {
        let mut s = seq(&[4]);
        let mut c = ctx(&[6, 6, 6]);
        let m = Modifier::explode(2).with_conditionals(vec![Conditional::new(
            ConditionOperator::GreaterEqual,
            4,
        )]);
        apply(&mut c, &mut s, DieFaces::poly(6), &m).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.render(), "[4!, 6!, 6]");
    }

    #[test]
    fn test_explode_combine() {
        let mut s = seq(&[6, 3]);
        let mut c = ctx(&[6, 2]);
        let m = Modifier::explode_combine(UNBOUNDED_REPEATS);
        apply(&mut c, &mut s, DieFaces::poly(6), &m).unwrap();
        assert_eq!(s.render(), "[14!, 3]");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_success_pool() {
        let mut s = seq(&[8, 1, 5, 10]);
        apply_conditions(
            &mut s,
            &[
                Conditional::new(ConditionOperator::GreaterEqual, 8),
                Conditional::new(ConditionOperator::Negate, 1),
            ],
        );
        assert_eq!(s.render(), "[8*, 1-, 5, 10*]");
        assert_eq!(s.sum(), Number::Int(1));
    }

    #[test]
    fn test_budget_exceeded() {
        let mut s = seq(&[6]);
        let mut c = RollContext::new_bounded(2, ScriptedSource::new([6, 6, 6]));
        let m = Modifier::explode(UNBOUNDED_REPEATS);
        assert!(apply(&mut c, &mut s, DieFaces::poly(6), &m).is_err());
    }
}
