//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::{io::Cursor, sync::Arc};

use learnadex::{
    data::{EndOfStreamTermination, MemoryIteration, MemoryTimestepFunction, StreamData, replay_settings},
    filter::{ConditionalProbability, DataLinkFamily, DataLinkingLikelihood, ProbabilityFilterLikelihood},
    learning::{ObjectiveEvaluator, ObjectiveIteration, ObjectiveOutput},
    params::NamedParams,
};

pub const TIMESCALE: &str = "exponential_weighting_timescale";

/// A smooth oscillation with a deterministic wobble, as CSV text.
///
/// Columns are `time,value,label`. Includes a header and one malformed row
/// that ingestion must skip.
pub fn csv_text(rows: usize) -> String {
    let mut text = String::from("time,value,label\n");
    for t in 0..rows {
        let wobble = 0.3 * (((t * 7) % 5) as f64 - 2.0) / 2.0;
        let value = 5.0 + (t as f64 / 3.0).sin() + wobble;
        text.push_str(&format!("{t},{value},row{t}\n"));
        if t == 3 {
            text.push_str("3.5,not-a-number,broken\n");
        }
    }
    text
}

pub fn stream(rows: usize) -> Arc<StreamData> {
    Arc::new(StreamData::from_csv_reader(Cursor::new(csv_text(rows)), 0, &[1], true).unwrap())
}

pub fn exponential_filter() -> ProbabilityFilterLikelihood {
    ProbabilityFilterLikelihood::new(
        ConditionalProbability::exponential(),
        DataLinkingLikelihood::new(DataLinkFamily::Normal),
    )
}

/// Timescale masked for fitting, plus an unmasked bystander.
pub fn params(timescale: f64) -> NamedParams {
    NamedParams::new().with_optimised_float(TIMESCALE, vec![timescale]).with_float("bystander", vec![42.0])
}

pub fn evaluator(
    data: &Arc<StreamData>, timescale: f64, depth: usize, burn_in: usize,
    output: Arc<dyn ObjectiveOutput>,
) -> ObjectiveEvaluator {
    let settings = replay_settings(&[data.clone()], vec![params(timescale)], depth).unwrap();
    let iteration =
        ObjectiveIteration::new(exponential_filter(), Box::new(MemoryIteration::new(data.clone())), burn_in);
    ObjectiveEvaluator::new(
        vec![iteration],
        settings,
        Arc::new(MemoryTimestepFunction::new(data.clone())),
        Arc::new(EndOfStreamTermination::new(data)),
        output,
    )
    .unwrap()
}
