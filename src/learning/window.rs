//! Fixed-capacity FIFO of timestamped observations.
use std::collections::VecDeque;

use ndarray::Array1;

/// The most recent `capacity` observations of one streamer, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow {
    entries: VecDeque<(f64, Array1<f64>)>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity + 1), capacity }
    }

    /// Append an observation, evicting the oldest once over capacity.
    ///
    /// Returns the evicted entry, if any.
    pub fn push(&mut self, time: f64, state: Array1<f64>) -> Option<(f64, Array1<f64>)> {
        self.entries.push_back((time, state));
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn oldest_time(&self) -> Option<f64> {
        self.entries.front().map(|(time, _)| *time)
    }

    pub fn newest_time(&self) -> Option<f64> {
        self.entries.back().map(|(time, _)| *time)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, Array1<f64>)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The window never exceeds its capacity and evicts oldest first.
    //
    // Given
    // -----
    // - Capacity 3, five pushes at times 0..5.
    //
    // Expect
    // ------
    // - Length 3 after every push beyond the third, edges at times 2 and 4.
    fn push_evicts_oldest_beyond_capacity() {
        // Arrange
        let mut window = SlidingWindow::new(3);

        // Act
        let evicted: Vec<Option<f64>> = (0..5)
            .map(|t| window.push(t as f64, array![t as f64 * 10.0]).map(|(time, _)| time))
            .collect();

        // Assert
        assert_eq!(evicted, vec![None, None, None, Some(0.0), Some(1.0)]);
        assert_eq!(window.len(), 3);
        assert!(window.is_full());
        assert_eq!(window.oldest_time(), Some(2.0));
        assert_eq!(window.newest_time(), Some(4.0));
        assert_eq!(window.iter().next().map(|(_, s)| s[0]), Some(20.0));
    }

    #[test]
    fn empty_window_has_no_edges() {
        let window = SlidingWindow::new(2);

        assert!(window.is_empty());
        assert_eq!(window.oldest_time(), None);
        assert_eq!(window.newest_time(), None);
    }
}
