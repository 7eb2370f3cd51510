use crate::error::{TraceError, TraceResult};

/// A fixed-capacity ring buffer indexed by absolute sample count since
/// creation. `size()` can exceed `capacity()`; indices below
/// `size() - capacity()` are no longer accessible.
///
/// Grounded on `original_source/numerics/include/relacs/cyclicsampledata.h`
/// (`CyclicArray`/`CyclicSampleData`), reduced to the ring mechanics; the
/// engineering-unit metadata lives on top in [`crate::InData`].
#[derive(Debug, Clone)]
pub struct CyclicBuffer<T> {
    data: Vec<T>,
    capacity: usize,
    total: i64,
}

impl<T: Copy + Default> CyclicBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            total: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Absolute index of the newest pushed sample plus one.
    pub fn size(&self) -> i64 {
        self.total
    }

    /// Smallest index that is still readable.
    pub fn min_index(&self) -> i64 {
        (self.total - self.capacity as i64).max(0)
    }

    pub fn push(&mut self, value: T) {
        let slot = (self.total as usize) % self.capacity;
        if self.data.len() < self.capacity {
            self.data.push(value);
        } else {
            self.data[slot] = value;
        }
        self.total += 1;
    }

    pub fn push_slice(&mut self, values: &[T]) {
        for &v in values {
            self.push(v);
        }
    }

    /// Random access by absolute index. Returns `T::default()` and an
    /// error if the index is unreadable, matching spec.md §4.1's "returns
    /// 0 and sets an error below minIndex()".
    pub fn get(&self, index: i64) -> TraceResult<T> {
        if index < self.min_index() {
            return Err(TraceError::BelowMinIndex {
                index,
                min_index: self.min_index(),
            });
        }
        if index >= self.size() {
            return Err(TraceError::AtOrBeyondSize {
                index,
                size: self.size(),
            });
        }
        let slot = (index as usize) % self.capacity;
        Ok(self.data[slot])
    }

    pub fn get_or_default(&self, index: i64) -> T {
        self.get(index).unwrap_or_default()
    }

    /// Requests additional storage so `capacity()` is at least `n`;
    /// no-op if already satisfied. Preserves the accessible content.
    pub fn reserve(&mut self, n: usize) {
        if n <= self.capacity {
            return;
        }
        let min_index = self.min_index();
        let size = self.size();
        let mut preserved = Vec::with_capacity((size - min_index) as usize);
        for i in min_index..size {
            preserved.push(self.get_or_default(i));
        }
        self.capacity = n;
        self.data = Vec::with_capacity(n);
        self.total = min_index;
        for v in preserved {
            self.push(v);
        }
    }

    /// Extends the logical size to `n` elements, pushing `val` for the
    /// difference. Capacity is unchanged (spec.md §4.1). Shrinking is not
    /// supported since `total` is a monotonic pushed-sample count shared
    /// with restart-marker indexing elsewhere in the store.
    pub fn resize(&mut self, n: i64, val: T) {
        while self.size() < n {
            self.push(val);
        }
    }

    pub fn iter_from(&self, from: i64) -> impl Iterator<Item = T> + '_ {
        let from = from.max(self.min_index());
        (from..self.size()).map(move |i| self.get_or_default(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_min_index() {
        let mut buf: CyclicBuffer<f64> = CyclicBuffer::new(4);
        for i in 0..10 {
            buf.push(i as f64);
        }
        assert_eq!(buf.size(), 10);
        assert_eq!(buf.min_index(), 6);
        assert!(buf.get(5).is_err());
        assert_eq!(buf.get(6).unwrap(), 6.0);
        assert_eq!(buf.get(9).unwrap(), 9.0);
        assert!(buf.get(10).is_err());
    }

    #[test]
    fn reserve_preserves_content() {
        let mut buf: CyclicBuffer<f64> = CyclicBuffer::new(4);
        for i in 0..4 {
            buf.push(i as f64);
        }
        buf.reserve(8);
        assert_eq!(buf.capacity(), 8);
        for i in 0..4 {
            assert_eq!(buf.get(i).unwrap(), i as f64);
        }
    }
}
