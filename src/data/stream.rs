//! data::stream: recorded time series loaded from CSV or memory.
//!
//! Purpose
//! -------
//! Hold a time-ordered sequence of observations for one partition and load
//! it from comma-separated text with a designated time column and a set of
//! state columns.
//!
//! Key behaviors
//! -------------
//! - [`StreamData::from_csv_reader`] parses line by line. Malformed rows
//!   (too few fields, unparsable numbers, times that do not increase) are
//!   skipped with a `warn!` diagnostic and ingestion continues.
//! - Fields may be double-quoted; commas inside quotes do not split and `""`
//!   inside a quoted field is a literal quote. Quoted fields spanning several
//!   lines are not supported: each physical line is one row.
//! - [`StreamData::new`] validates an in-memory stream;
//!   [`StreamData::from_window`] snapshots an online learner's window.
//!
//! Invariants & assumptions
//! ------------------------
//! - `times` strictly increase and pair one to one with `states`.
//! - Every state has the same width.
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::warn;
use ndarray::Array1;

use crate::{
    data::errors::{DataError, DataResult},
    learning::SlidingWindow,
};

/// Time-ordered observations for one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamData {
    times: Vec<f64>,
    states: Vec<Array1<f64>>,
}

impl StreamData {
    /// Validate and wrap an in-memory stream.
    ///
    /// # Errors
    /// - [`DataError::EmptyStream`] if there are no rows.
    /// - [`DataError::LengthMismatch`] if times and states differ in count.
    /// - [`DataError::RaggedStates`] if state widths differ.
    /// - [`DataError::NonIncreasingTime`] if times do not strictly increase.
    pub fn new(times: Vec<f64>, states: Vec<Array1<f64>>) -> DataResult<Self> {
        if times.len() != states.len() {
            return Err(DataError::LengthMismatch { times: times.len(), states: states.len() });
        }
        let Some(first) = states.first() else {
            return Err(DataError::EmptyStream);
        };
        let width = first.len();
        for (row, state) in states.iter().enumerate() {
            if state.len() != width {
                return Err(DataError::RaggedStates { row, expected: width, found: state.len() });
            }
        }
        for (row, pair) in times.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(DataError::NonIncreasingTime { row: row + 1, time: pair[1] });
            }
        }
        Ok(Self { times, states })
    }

    /// Load a CSV file; see [`StreamData::from_csv_reader`].
    pub fn from_csv_path(
        path: impl AsRef<Path>, time_column: usize, state_columns: &[usize], skip_header: bool,
    ) -> DataResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_csv_reader(BufReader::new(file), time_column, state_columns, skip_header)
    }

    /// Parse comma-separated rows into a stream.
    ///
    /// # Arguments
    /// - `time_column`: zero-based index of the time field.
    /// - `state_columns`: zero-based indices of the state fields, in order.
    /// - `skip_header`: drop the first line unconditionally.
    ///
    /// # Errors
    /// - [`DataError::NoStateColumns`] if `state_columns` is empty.
    /// - [`DataError::Io`] if a line cannot be read.
    /// - [`DataError::EmptyStream`] if no row survives.
    pub fn from_csv_reader<R: BufRead>(
        reader: R, time_column: usize, state_columns: &[usize], skip_header: bool,
    ) -> DataResult<Self> {
        if state_columns.is_empty() {
            return Err(DataError::NoStateColumns);
        }
        let mut times: Vec<f64> = Vec::new();
        let mut states = Vec::new();
        for (line_number, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| DataError::Io {
                path: "<reader>".to_string(),
                reason: e.to_string(),
            })?;
            if (skip_header && line_number == 0) || line.trim().is_empty() {
                continue;
            }
            let fields = split_fields(&line);
            let parse = |column: usize| -> Option<f64> {
                fields.get(column).and_then(|field| field.trim().parse::<f64>().ok())
            };
            let Some(time) = parse(time_column) else {
                warn!(line = line_number + 1; "skipping row with a missing or invalid time");
                continue;
            };
            let values: Option<Vec<f64>> = state_columns.iter().map(|&c| parse(c)).collect();
            let Some(values) = values else {
                warn!(line = line_number + 1; "skipping row with a missing or invalid state value");
                continue;
            };
            if times.last().is_some_and(|&last| time <= last) {
                warn!(line = line_number + 1, time = time; "skipping row whose time does not increase");
                continue;
            }
            times.push(time);
            states.push(Array1::from(values));
        }
        Self::new(times, states)
    }

    /// Snapshot a sliding window, oldest entry first.
    pub fn from_window(window: &SlidingWindow) -> DataResult<Self> {
        let (times, states) = window.iter().map(|(time, state)| (*time, state.clone())).unzip();
        Self::new(times, states)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn state_width(&self) -> usize {
        self.states.first().map_or(0, Array1::len)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[Array1<f64>] {
        &self.states
    }

    pub fn time(&self, step: usize) -> Option<f64> {
        self.times.get(step).copied()
    }

    pub fn state(&self, step: usize) -> Option<&Array1<f64>> {
        self.states.get(step)
    }

    /// Increment leading into `step` (`times[step] - times[step - 1]`).
    pub fn increment(&self, step: usize) -> Option<f64> {
        let previous = step.checked_sub(1)?;
        Some(self.time(step)? - self.time(previous)?)
    }
}

/// Split one CSV line at commas outside double quotes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Cursor;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // CSV parsing, header skipping and the skip-and-continue policy for
    // malformed rows.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Columns are selected by index and the header is dropped.
    fn csv_reader_selects_columns_and_skips_header() {
        // Arrange
        let text = "x,time,y\n1.0,0.0,10.0\n2.0,1.0,20.0\n3.0,2.5,30.0\n";

        // Act
        let stream = StreamData::from_csv_reader(Cursor::new(text), 1, &[2, 0], true).unwrap();

        // Assert
        assert_eq!(stream.times(), &[0.0, 1.0, 2.5]);
        assert_eq!(stream.state(1), Some(&array![20.0, 2.0]));
        assert_eq!(stream.increment(2), Some(1.5));
        assert_eq!(stream.increment(0), None);
    }

    #[test]
    // Purpose
    // -------
    // Bad rows are skipped and ingestion continues.
    //
    // Given
    // -----
    // - A short row, an unparsable value and a time that goes backwards.
    //
    // Expect
    // ------
    // - Only the three well-formed, increasing rows remain.
    fn malformed_rows_are_skipped() {
        // Arrange
        let text = "0,1\n1\n2,abc\n3,4\n2.5,9\n\n4,5\n";

        // Act
        let stream = StreamData::from_csv_reader(Cursor::new(text), 0, &[1], false).unwrap();

        // Assert
        assert_eq!(stream.times(), &[0.0, 3.0, 4.0]);
        assert_eq!(stream.len(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Commas inside a quoted label do not shift the numeric columns.
    //
    // Given
    // -----
    // - A quoted first column holding commas and an escaped quote.
    //
    // Expect
    // ------
    // - Time and state are read from columns 1 and 2 on every row.
    fn quoted_fields_keep_column_positions() {
        // Arrange
        let text = "label,time,x\n\"a, b\",0.0,1.5\n\"say \"\"hi\"\", ok\",1.0,2.5\n";

        // Act
        let stream = StreamData::from_csv_reader(Cursor::new(text), 1, &[2], true).unwrap();

        // Assert
        assert_eq!(stream.times(), &[0.0, 1.0]);
        assert_eq!(stream.state(1), Some(&array![2.5]));
        assert_eq!(split_fields("\"say \"\"hi\"\"\",2"), vec!["say \"hi\"", "2"]);
    }

    #[test]
    fn stream_without_rows_is_an_error() {
        let err = StreamData::from_csv_reader(Cursor::new("time,x\n"), 0, &[1], true);

        assert_eq!(err, Err(DataError::EmptyStream));
    }

    #[test]
    fn in_memory_streams_are_validated() {
        assert_eq!(
            StreamData::new(vec![0.0, 0.0], vec![array![1.0], array![2.0]]),
            Err(DataError::NonIncreasingTime { row: 1, time: 0.0 })
        );
        assert_eq!(
            StreamData::new(vec![0.0, 1.0], vec![array![1.0], array![2.0, 3.0]]),
            Err(DataError::RaggedStates { row: 1, expected: 1, found: 2 })
        );
    }
}
