//! Fixed-depth state and time buffers, most recent entry first.
use ndarray::{Array1, Array2, ArrayView1};

/// Rolling buffer of past state vectors for one partition.
///
/// Row 0 is the current state; row `depth - 1` the oldest retained one.
/// Depth and width never change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StateHistory {
    pub values: Array2<f64>,
}

impl StateHistory {
    /// New history whose row 0 is `init` and whose older rows are zero.
    pub fn new(init: ArrayView1<f64>, depth: usize) -> Self {
        let mut values = Array2::zeros((depth.max(1), init.len()));
        values.row_mut(0).assign(&init);
        Self { values }
    }

    /// Build directly from rows, most recent first.
    pub fn from_rows(values: Array2<f64>) -> Self {
        Self { values }
    }

    pub fn depth(&self) -> usize {
        self.values.nrows()
    }

    pub fn state_width(&self) -> usize {
        self.values.ncols()
    }

    pub fn current(&self) -> ArrayView1<f64> {
        self.values.row(0)
    }

    pub fn row(&self, index: usize) -> ArrayView1<f64> {
        self.values.row(index)
    }

    /// Insert `state` at row 0 and drop the oldest row.
    pub fn push(&mut self, state: ArrayView1<f64>) {
        for i in (1..self.depth()).rev() {
            let newer = self.values.row(i - 1).to_owned();
            self.values.row_mut(i).assign(&newer);
        }
        self.values.row_mut(0).assign(&state);
    }
}

/// Absolute times matching a [`StateHistory`], plus the pending increment.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestepsHistory {
    pub values: Array1<f64>,
    pub next_increment: f64,
    pub current_step_number: usize,
}

impl TimestepsHistory {
    pub fn new(init_time: f64, depth: usize) -> Self {
        let mut values = Array1::zeros(depth.max(1));
        values[0] = init_time;
        Self { values, next_increment: 0.0, current_step_number: 0 }
    }

    pub fn depth(&self) -> usize {
        self.values.len()
    }

    pub fn current_time(&self) -> f64 {
        self.values[0]
    }

    pub fn push(&mut self, time: f64) {
        for i in (1..self.depth()).rev() {
            self.values[i] = self.values[i - 1];
        }
        self.values[0] = time;
    }
}
