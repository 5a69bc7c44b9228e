//! Integration tests for concurrent learner rounds.
//!
//! Purpose
//! -------
//! - Drive several learners, each with its own evaluator over a replayed CSV
//!   stream, through perturbation-search rounds.
//!
//! Coverage
//! --------
//! - `learning::LearningOptimiser` round barrier and history trimming.
//! - `learning::PerturbationSearch` as the meta-algorithm.
mod common;

use std::{collections::VecDeque, sync::Arc};

use learnadex::{
    learning::{LearningOptimiser, LearningResult, MetaAlgorithm, NilOutput, PerturbationSearch},
    params::NamedParams,
};
use parking_lot::Mutex;

use common::{evaluator, stream};

/// Delegates to a perturbation search and records history lengths at every
/// termination check.
struct Recording {
    inner: PerturbationSearch,
    lengths: Mutex<Vec<(Vec<usize>, Vec<usize>)>>,
}

impl MetaAlgorithm for Recording {
    fn next_params(
        &self, learner_index: usize, round: usize, start: &[NamedParams],
        objective_history: &VecDeque<f64>, param_history: &VecDeque<Vec<NamedParams>>,
    ) -> LearningResult<Vec<NamedParams>> {
        self.inner.next_params(learner_index, round, start, objective_history, param_history)
    }

    fn terminate(
        &self, rounds_completed: usize, objective_histories: &[VecDeque<f64>],
        param_histories: &[VecDeque<Vec<NamedParams>>],
    ) -> bool {
        self.lengths.lock().push((
            objective_histories.iter().map(VecDeque::len).collect(),
            param_histories.iter().map(VecDeque::len).collect(),
        ));
        self.inner.terminate(rounds_completed, objective_histories, param_histories)
    }
}

#[test]
// Purpose
// -------
// Every learner reports exactly once per round.
//
// Given
// -----
// - Four learners over a 30-row stream with different starting timescales.
// - Six rounds, histories trimmed to depth 4.
//
// Expect
// ------
// - The termination check before round `r` (and the final one after
//   round 6) sees `min(r, 4)` entries in every objective and parameter
//   history, starting from empty.
// - `best()` is the maximum over all retained objectives.
fn round_barrier_keeps_every_learner_in_step() {
    // Arrange
    let data = stream(30);
    let evaluators =
        [1.0, 2.0, 3.0, 5.0].iter().map(|&t| evaluator(&data, t, 4, 3, Arc::new(NilOutput))).collect();
    let meta = Recording {
        inner: PerturbationSearch::new(0.2, 6, 7).unwrap(),
        lengths: Mutex::new(Vec::new()),
    };
    let mut optimiser = LearningOptimiser::new(evaluators, meta, 4).unwrap();

    // Act
    let rounds = optimiser.run().unwrap();

    // Assert
    assert_eq!(rounds, 6);
    let best = optimiser.best().unwrap();
    let max = optimiser
        .objective_histories()
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(best.objective, max);
    assert!(best.learner_index < 4);
    let lengths = optimiser_lengths(&optimiser);
    assert_eq!(lengths.len(), 7);
    for (round, (objectives, params)) in lengths.iter().enumerate() {
        let expected = round.min(4);
        assert_eq!(objectives, &vec![expected; 4]);
        assert_eq!(params, &vec![expected; 4]);
    }
}

#[test]
fn history_lengths_advance_together_every_round() {
    let data = stream(30);
    let evaluators =
        [1.5, 2.5].iter().map(|&t| evaluator(&data, t, 4, 3, Arc::new(NilOutput))).collect();
    let lengths = {
        let meta = Recording {
            inner: PerturbationSearch::new(0.2, 5, 1).unwrap(),
            lengths: Mutex::new(Vec::new()),
        };
        let mut optimiser = LearningOptimiser::new(evaluators, meta, 3).unwrap();
        optimiser.run().unwrap();
        optimiser_lengths(&optimiser)
    };

    assert_eq!(lengths.len(), 6);
    for (round, (objectives, params)) in lengths.iter().enumerate() {
        let expected = round.min(3);
        assert_eq!(objectives, &vec![expected; 2]);
        assert_eq!(params, &vec![expected; 2]);
    }
}

fn optimiser_lengths(optimiser: &LearningOptimiser<Recording>) -> Vec<(Vec<usize>, Vec<usize>)> {
    optimiser.algorithm().lengths.lock().clone()
}
