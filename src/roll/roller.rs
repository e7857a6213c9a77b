use crate::common::Int;
use rand::Rng;
use std::collections::VecDeque;

/// Uniform integers over an inclusive range.
pub trait RandomSource {
    fn between(&mut self, min: Int, max: Int) -> Int;
}

impl<R: Rng> RandomSource for R {
    fn between(&mut self, min: Int, max: Int) -> Int {
        if min >= max {
            min
        } else {
            self.gen_range(min..=max)
        }
    }
}

/// Replays a fixed list of values, then keeps answering `min`.
///
/// Values are returned as given, without clamping to the requested range.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    values: VecDeque<Int>,
}

impl ScriptedSource {
    pub fn new(values: impl IntoIterator<Item = Int>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedSource {
    fn between(&mut self, min: Int, _max: Int) -> Int {
        self.values.pop_front().unwrap_or(min)
    }
}
