use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Sequence policy a [`RangeLoop`] steps through its active elements in
/// (spec.md §3 "Range").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Up,
    Down,
    AlternateInUp,
    AlternateInDown,
    AlternateOutUp,
    AlternateOutDown,
    Random,
    PseudoRandom,
}

#[derive(Debug, Clone, Copy)]
struct Element {
    value: f64,
    count: i32,
    skip: bool,
}

/// A declarative sweep of parameter values with a three-level repeat
/// structure (single / block / total) and a progressively bisected
/// increment across block repetitions (spec.md §3).
///
/// The element-selection algorithm for each [`Sequence`] and the
/// single/block/total repeat bookkeeping in [`RangeLoop::advance`] are
/// ported from `original_source/relacs/src/rangeloop.cc`'s
/// `initSequence`/`operator++`, which the distilled spec names but does
/// not give an algorithm for. `Random`/`PseudoRandom` use a seeded
/// `ChaCha8Rng` rather than the original's custom generator — the ordering
/// they produce is deterministic but not bit-identical to the original.
#[derive(Debug, Clone)]
pub struct RangeLoop {
    elements: Vec<Element>,
    indices: Vec<usize>,
    index: i64,
    start_pos: i64,
    loop_count: i64,
    repeat: i64,
    repeat_count: i64,
    block_repeat: i64,
    block_repeat_count: i64,
    single_repeat: i64,
    single_repeat_count: i64,
    increment: i64,
    current_increment: i64,
    seq: Sequence,
}

impl RangeLoop {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let elements: Vec<Element> = values
            .into_iter()
            .map(|value| Element { value, count: 0, skip: false })
            .collect();
        let mut range = Self {
            elements,
            indices: Vec::new(),
            index: 0,
            start_pos: -1,
            loop_count: 0,
            repeat: 1,
            repeat_count: 0,
            block_repeat: 1,
            block_repeat_count: 0,
            single_repeat: 1,
            single_repeat_count: 0,
            increment: 1,
            current_increment: 1,
            seq: Sequence::Up,
        };
        range.init_sequence(-1);
        range
    }

    pub fn linear(first: f64, last: f64, step: f64) -> Self {
        let mut values = Vec::new();
        if step != 0.0 {
            let n = ((last - first) / step).abs().floor() as i64 + 1;
            for k in 0..n {
                values.push(first + k as f64 * step);
            }
        }
        Self::from_values(values)
    }

    pub fn logarithmic(first: f64, last: f64, factor: f64) -> Self {
        let mut values = Vec::new();
        if factor > 1.0 && first > 0.0 {
            let mut v = first;
            while v <= last {
                values.push(v);
                v *= factor;
            }
        }
        Self::from_values(values)
    }

    pub fn with_sequence(mut self, seq: Sequence) -> Self {
        self.seq = seq;
        self.reset(-1, false);
        self
    }

    pub fn with_repeats(mut self, repeat: i64, block_repeat: i64, single_repeat: i64) -> Self {
        self.repeat = repeat;
        self.block_repeat = block_repeat.max(1);
        self.single_repeat = single_repeat.max(1);
        self.reset(-1, false);
        self
    }

    pub fn with_increment(mut self, increment: i64) -> Self {
        self.increment = increment.max(1);
        self.current_increment = self.increment;
        self.reset(-1, false);
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn loop_count(&self) -> i64 {
        self.loop_count
    }

    pub fn repeat_count(&self) -> i64 {
        self.repeat_count
    }

    /// The element index the loop is currently on, or `None` before the
    /// first `advance()` call exhausts the sequence.
    pub fn pos(&self) -> Option<usize> {
        self.indices.get(self.index as usize).copied()
    }

    pub fn value(&self) -> Option<f64> {
        self.pos().map(|p| self.elements[p].value)
    }

    pub fn set_skip(&mut self, pos: usize, skip: bool) {
        if let Some(e) = self.elements.get_mut(pos) {
            e.skip = skip;
        }
    }

    /// Element index nearest `value`, per `RangeLoop::pos(double)`.
    pub fn pos_of(&self, value: f64) -> Option<usize> {
        if self.elements.is_empty() {
            return None;
        }
        let mut best = 0;
        let mut dist = (self.elements[0].value - value).abs();
        for (k, e) in self.elements.iter().enumerate().skip(1) {
            let d = (e.value - value).abs();
            if d < dist {
                dist = d;
                best = k;
            }
        }
        Some(best)
    }

    fn max_block_count(&self) -> i32 {
        self.elements.iter().filter(|e| !e.skip).map(|e| e.count).min().unwrap_or(0) + 1
    }

    /// Rebuilds `indices` — the order elements are visited in this block —
    /// starting near element `pos` (`-1` lets the sequence pick its own
    /// default starting point), per `rangeloop.cc::initSequence`.
    fn init_sequence(&mut self, pos: i64) {
        self.indices.clear();
        self.index = 0;
        self.start_pos = pos;

        let count = self.max_block_count();
        let step = self.current_increment.max(1) as usize;
        let einx: Vec<usize> = (0..self.elements.len())
            .step_by(step)
            .filter(|&k| !self.elements[k].skip && self.elements[k].count < count)
            .collect();
        if einx.is_empty() {
            return;
        }

        let pos = if pos < 0 {
            match self.seq {
                Sequence::AlternateInUp | Sequence::AlternateInDown | Sequence::AlternateOutUp | Sequence::AlternateOutDown => {
                    einx[einx.len() / 2] as i64
                }
                _ => 0,
            }
        } else {
            pos
        };

        let si = einx
            .iter()
            .enumerate()
            .min_by_key(|&(_, &e)| (e as i64 - pos).abs())
            .map(|(j, _)| j)
            .unwrap_or(0);

        let n = einx.len();
        self.indices.reserve(n);
        match self.seq {
            Sequence::Down => {
                let mut j = si as i64 - 1;
                for _ in 0..n {
                    if j < 0 {
                        j = n as i64 - 1;
                    }
                    self.indices.push(einx[j as usize]);
                    j -= 1;
                }
            }
            Sequence::AlternateInUp => {
                let mut j = 0usize;
                let mut k = 0usize;
                while k < n {
                    let i = if j % 2 == 0 { j / 2 } else { n - 1 - j / 2 };
                    let skip_this = (j % 2 == 0 && i > si) || (j % 2 == 1 && i < si);
                    j += 1;
                    if skip_this {
                        continue;
                    }
                    self.indices.push(einx[i]);
                    k += 1;
                }
            }
            Sequence::AlternateInDown => {
                let mut j = 0usize;
                let mut k = 0usize;
                while k < n {
                    let i = if j % 2 == 1 { j / 2 } else { n - 1 - j / 2 };
                    let skip_this = (j % 2 == 1 && i > si) || (j % 2 == 0 && i < si);
                    j += 1;
                    if skip_this {
                        continue;
                    }
                    self.indices.push(einx[i]);
                    k += 1;
                }
            }
            Sequence::AlternateOutUp => {
                let mut j = 0i64;
                let mut k = 0usize;
                while k < n {
                    let i = si as i64 + if j % 2 == 1 { (j + 1) / 2 } else { -((j + 1) / 2) };
                    j += 1;
                    if i < 0 || i >= n as i64 {
                        continue;
                    }
                    self.indices.push(einx[i as usize]);
                    k += 1;
                }
            }
            Sequence::AlternateOutDown => {
                let mut j = 0i64;
                let mut k = 0usize;
                while k < n {
                    let i = si as i64 + if j % 2 == 0 { (j + 1) / 2 } else { -((j + 1) / 2) };
                    j += 1;
                    if i < 0 || i >= n as i64 {
                        continue;
                    }
                    self.indices.push(einx[i as usize]);
                    k += 1;
                }
            }
            Sequence::Random | Sequence::PseudoRandom => {
                let seed = if self.seq == Sequence::Random { 0 } else { 87342 };
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut used = vec![false; n];
                for _ in 0..n {
                    let mut inx;
                    loop {
                        inx = rng.gen_range(0..n);
                        if !used[inx] {
                            break;
                        }
                    }
                    used[inx] = true;
                    self.indices.push(einx[inx]);
                }
            }
            Sequence::Up => {
                let mut j = si;
                for _ in 0..n {
                    if j >= n {
                        j = 0;
                    }
                    self.indices.push(einx[j]);
                    j += 1;
                }
            }
        }
    }

    /// `reset(pos, clearskip)`: rewinds all counters and, optionally,
    /// every element's skip flag.
    pub fn reset(&mut self, pos: i64, clear_skip: bool) {
        self.loop_count = 0;
        for e in &mut self.elements {
            e.count = 0;
            if clear_skip {
                e.skip = false;
            }
        }
        self.repeat_count = 0;
        self.block_repeat_count = 0;
        self.single_repeat_count = 0;
        self.current_increment = self.increment;
        self.init_sequence(pos);
    }

    /// Removes every skipped element permanently, per
    /// `rangeloop.cc::purge` ("purge skipped elements").
    pub fn purge(&mut self) {
        self.elements.retain(|e| !e.skip);
        self.init_sequence(self.start_pos);
    }

    /// `operator++`: advances to the next element, stepping through the
    /// single/block/total repeat levels and bisecting the increment once
    /// a block completes, per `rangeloop.cc::operator++`.
    pub fn advance(&mut self) {
        self.loop_count += 1;
        if let Some(p) = self.pos() {
            self.elements[p].count += 1;
        }

        self.single_repeat_count += 1;
        let at_boundary = self.single_repeat_count >= self.single_repeat
            || self.index < 0
            || self.index as usize >= self.indices.len()
            || self
                .pos()
                .map(|p| self.elements[p].skip || self.elements[p].count >= self.max_block_count())
                .unwrap_or(true);

        if !at_boundary {
            return;
        }
        self.single_repeat_count = 0;

        loop {
            self.index += 1;
            if self.index == 0 || self.index as usize >= self.indices.len() {
                self.index = 0;
                self.block_repeat_count += 1;
                if self.block_repeat_count >= self.block_repeat {
                    self.block_repeat_count = 0;
                    loop {
                        self.current_increment /= 2;
                        if self.current_increment <= 0 {
                            self.current_increment = self.increment;
                            self.repeat_count += 1;
                            if self.repeat > 0 && self.repeat_count >= self.repeat {
                                return;
                            }
                            if self.elements.iter().all(|e| e.skip) {
                                return;
                            }
                        }
                        self.init_sequence(self.start_pos);
                        if !self.indices.is_empty() {
                            break;
                        }
                    }
                }
            }
            if self.indices.is_empty() {
                return;
            }
            let p = self.indices[self.index as usize];
            if !(self.elements[p].skip || self.elements[p].count >= self.max_block_count()) {
                break;
            }
        }
    }

    /// `operator!`: true while the loop has not yet run out (more elements
    /// to visit at the current repeat levels).
    pub fn active(&self) -> bool {
        self.index >= 0
            && (self.index as usize) < self.indices.len()
            && self.repeat_count >= 0
            && (self.repeat <= 0 || self.repeat_count < self.repeat)
            && self.block_repeat_count >= 0
            && self.block_repeat_count < self.block_repeat
            && self.single_repeat_count >= 0
            && self.single_repeat_count < self.single_repeat
            && self.current_increment > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Seed test F (spec.md §8): `RangeLoop` sequence ordering.
    #[test]
    fn up_sequence_visits_in_ascending_order() {
        let range = RangeLoop::from_values([1.0, 2.0, 3.0, 4.0]).with_sequence(Sequence::Up);
        let values: Vec<f64> = (0..range.len()).map(|i| range.elements[range.indices[i]].value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn down_sequence_visits_in_descending_order() {
        let range = RangeLoop::from_values([1.0, 2.0, 3.0, 4.0]).with_sequence(Sequence::Down);
        let values: Vec<f64> = (0..range.len()).map(|i| range.elements[range.indices[i]].value).collect();
        assert_eq!(values, vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn advance_through_a_full_single_pass() {
        let mut range = RangeLoop::from_values([10.0, 20.0, 30.0]).with_sequence(Sequence::Up);
        let mut seen = vec![range.value().unwrap()];
        while range.active() {
            range.advance();
            if let Some(v) = range.value() {
                seen.push(v);
            }
        }
        assert!(seen.contains(&10.0) && seen.contains(&20.0) && seen.contains(&30.0));
    }

    #[test]
    fn random_sequence_is_a_permutation_of_all_elements() {
        let range = RangeLoop::from_values([1.0, 2.0, 3.0, 4.0, 5.0]).with_sequence(Sequence::Random);
        let mut sorted = range.indices.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn repeat_count_increments_after_a_full_block() {
        let mut range = RangeLoop::from_values([1.0, 2.0]).with_repeats(3, 1, 1);
        for _ in 0..2 {
            range.advance();
        }
        assert_eq!(range.repeat_count(), 1);
    }

    #[test]
    fn purge_drops_skipped_elements_permanently() {
        let mut range = RangeLoop::from_values([1.0, 2.0, 3.0]);
        range.set_skip(1, true);
        range.purge();
        assert_eq!(range.len(), 2);
    }
}
