use std::collections::VecDeque;

/// Fixed-capacity rolling window of recent magnitudes, oldest evicted first.
#[derive(Debug, Clone)]
pub struct MagnitudeHistory {
    values: VecDeque<f64>,
    capacity: usize,
}

impl MagnitudeHistory {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, magnitude: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(magnitude);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

impl Default for MagnitudeHistory {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_evicts_oldest_when_full() {
        let mut history = MagnitudeHistory::with_capacity(3);
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            history.push(value);
        }
        assert_eq!(history.to_vec(), vec![3.0, 4.0, 5.0]);
        assert_eq!(history.latest(), Some(5.0));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut history = MagnitudeHistory::with_capacity(0);
        history.push(1.0);
        history.push(2.0);
        assert_eq!(history.len(), 1);
        assert_eq!(history.capacity(), 1);
    }

    #[test]
    fn default_history_holds_fifty_entries() {
        let mut history = MagnitudeHistory::default();
        for value in 0..120 {
            history.push(value as f64);
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.to_vec()[0], 70.0);
        history.clear();
        assert!(history.is_empty());
    }
}
