//! learning::optimiser: concurrent rounds over independent learners.
//!
//! Purpose
//! -------
//! Coordinate `N` learners, each owning its own [`ObjectiveEvaluator`], in
//! synchronous rounds. A pluggable [`MetaAlgorithm`] proposes every
//! learner's next parameters from that learner's bounded history and decides
//! when to stop.
//!
//! Key behaviors
//! -------------
//! - The termination predicate is checked before every round, so a
//!   meta-algorithm that is already satisfied runs no rounds at all.
//! - Each round proposes parameters for every learner and fans the
//!   evaluations out to one scoped thread per learner over a dedicated input
//!   channel. Proposals and objectives enter the histories together once
//!   every learner has reported.
//! - The coordinator blocks on every learner's output channel before the
//!   round completes (fan-out/fan-in barrier).
//! - Histories are newest-first FIFOs trimmed to `max_history_depth`.
//!
//! Invariants & assumptions
//! ------------------------
//! - After every completed round all objective histories have equal length,
//!   and each equals the length of the matching parameter history.
//! - A learner's evaluator is touched only by its own worker during a round
//!   and is reset by [`ObjectiveEvaluator::evaluate`] before the next one.
//! - Any learner failure aborts the run; there is no retry.
//!
//! Testing notes
//! -------------
//! - Unit tests here cover the perturbation search and the barrier;
//!   `tests/integration_learners.rs` drives several learners over a
//!   replayed CSV stream.
use std::{collections::VecDeque, sync::mpsc, thread};

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use crate::{
    learning::{
        errors::{LearningError, LearningResult},
        evaluator::ObjectiveEvaluator,
    },
    params::{NamedParams, ParamsMapping},
    simulator::SimResult,
};

/// Proposal and stopping rule applied between learner rounds.
pub trait MetaAlgorithm: Send + Sync {
    /// Parameters for `learner_index` in round `round` (0-based).
    ///
    /// Histories are newest-first and have equal length.
    fn next_params(
        &self, learner_index: usize, round: usize, start: &[NamedParams],
        objective_history: &VecDeque<f64>, param_history: &VecDeque<Vec<NamedParams>>,
    ) -> LearningResult<Vec<NamedParams>>;

    /// Whether to stop now, with `rounds_completed` rounds behind us.
    /// Checked before every round, including the first.
    fn terminate(
        &self, rounds_completed: usize, objective_histories: &[VecDeque<f64>],
        param_histories: &[VecDeque<Vec<NamedParams>>],
    ) -> bool;
}

/// Gaussian random search around each learner's best retained parameters.
///
/// Round 0 evaluates the starting parameters unchanged. Later rounds add
/// `N(0, step_size²)` noise to every masked entry of the best parameters in
/// the learner's history. Noise is seeded from `(seed, learner, round)`, so
/// runs are reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbationSearch {
    step_size: f64,
    max_rounds: usize,
    seed: u64,
}

impl PerturbationSearch {
    /// # Errors
    /// [`LearningError::InvalidStepSize`] unless `step_size` is finite and positive.
    pub fn new(step_size: f64, max_rounds: usize, seed: u64) -> LearningResult<Self> {
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(LearningError::InvalidStepSize {
                step: step_size,
                reason: "Perturbation scale must be finite and positive.",
            });
        }
        Ok(Self { step_size, max_rounds, seed })
    }

    fn rng(&self, learner_index: usize, round: usize) -> StdRng {
        let stream = ((learner_index as u64) << 32) ^ round as u64;
        StdRng::seed_from_u64(self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ stream)
    }
}

/// Index of the highest objective, ignoring `NaN`.
fn best_index(objectives: &VecDeque<f64>) -> Option<usize> {
    objectives
        .iter()
        .enumerate()
        .filter(|(_, o)| !o.is_nan())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

impl MetaAlgorithm for PerturbationSearch {
    fn next_params(
        &self, learner_index: usize, round: usize, start: &[NamedParams],
        objective_history: &VecDeque<f64>, param_history: &VecDeque<Vec<NamedParams>>,
    ) -> LearningResult<Vec<NamedParams>> {
        let base = match best_index(objective_history).and_then(|i| param_history.get(i)) {
            Some(best) if round > 0 => best.clone(),
            _ => return Ok(start.to_vec()),
        };
        let mapping = ParamsMapping::new(&base)?;
        if mapping.is_empty() {
            return Ok(base);
        }
        let noise = Normal::new(0.0, self.step_size).map_err(|_| LearningError::InvalidStepSize {
            step: self.step_size,
            reason: "Perturbation scale must be finite and positive.",
        })?;
        let mut rng = self.rng(learner_index, round);
        let mut theta = mapping.flatten(&base)?;
        theta.mapv_inplace(|x| x + noise.sample(&mut rng));
        let mut next = base;
        mapping.unflatten(&theta, &mut next)?;
        Ok(next)
    }

    fn terminate(
        &self, rounds_completed: usize, _objective_histories: &[VecDeque<f64>],
        _param_histories: &[VecDeque<Vec<NamedParams>>],
    ) -> bool {
        rounds_completed >= self.max_rounds
    }
}

/// Best retained result across all learners.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnerBest {
    pub learner_index: usize,
    pub objective: f64,
    pub params: Vec<NamedParams>,
}

pub struct LearningOptimiser<A: MetaAlgorithm> {
    evaluators: Vec<ObjectiveEvaluator>,
    start_params: Vec<Vec<NamedParams>>,
    algorithm: A,
    max_history_depth: usize,
    objective_histories: Vec<VecDeque<f64>>,
    param_histories: Vec<VecDeque<Vec<NamedParams>>>,
}

impl<A: MetaAlgorithm> LearningOptimiser<A> {
    /// Each learner starts from its evaluator's current parameters.
    ///
    /// # Errors
    /// - [`LearningError::NoLearners`] for an empty `evaluators`.
    /// - [`LearningError::InvalidHistoryDepth`] if `max_history_depth == 0`.
    pub fn new(
        evaluators: Vec<ObjectiveEvaluator>, algorithm: A, max_history_depth: usize,
    ) -> LearningResult<Self> {
        if evaluators.is_empty() {
            return Err(LearningError::NoLearners);
        }
        if max_history_depth == 0 {
            return Err(LearningError::InvalidHistoryDepth { depth: max_history_depth });
        }
        let n = evaluators.len();
        let start_params = evaluators.iter().map(|e| e.params().to_vec()).collect();
        Ok(Self {
            evaluators,
            start_params,
            algorithm,
            max_history_depth,
            objective_histories: vec![VecDeque::new(); n],
            param_histories: vec![VecDeque::new(); n],
        })
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn learners(&self) -> usize {
        self.evaluators.len()
    }

    /// Newest-first objective histories, one per learner.
    pub fn objective_histories(&self) -> &[VecDeque<f64>] {
        &self.objective_histories
    }

    /// Newest-first parameter histories, one per learner.
    pub fn param_histories(&self) -> &[VecDeque<Vec<NamedParams>>] {
        &self.param_histories
    }

    /// Run rounds until the meta-algorithm terminates; returns the number of
    /// rounds completed.
    ///
    /// # Errors
    /// Any proposal, engine or coordination failure; the round in progress
    /// is abandoned.
    pub fn run(&mut self) -> LearningResult<usize> {
        let mut rounds = 0;
        while !self.algorithm.terminate(rounds, &self.objective_histories, &self.param_histories) {
            self.round(rounds)?;
            rounds += 1;
        }
        info!(rounds = rounds, learners = self.learners(); "learning optimiser finished");
        Ok(rounds)
    }

    /// Highest retained objective over every learner's history.
    pub fn best(&self) -> Option<LearnerBest> {
        self.objective_histories
            .iter()
            .enumerate()
            .filter_map(|(learner_index, objectives)| {
                best_index(objectives).map(|i| (learner_index, i, objectives[i]))
            })
            .max_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(learner_index, i, objective)| LearnerBest {
                learner_index,
                objective,
                params: self.param_histories[learner_index][i].clone(),
            })
    }

    fn round(&mut self, round: usize) -> LearningResult<()> {
        let mut proposals = Vec::with_capacity(self.learners());
        for (learner_index, evaluator) in self.evaluators.iter().enumerate() {
            let next = self.algorithm.next_params(
                learner_index,
                round,
                &self.start_params[learner_index],
                &self.objective_histories[learner_index],
                &self.param_histories[learner_index],
            )?;
            let expected = evaluator.settings().partitions();
            if next.len() != expected {
                return Err(LearningError::ParamCountMismatch {
                    learner_index,
                    expected,
                    found: next.len(),
                });
            }
            proposals.push(next);
        }

        let objectives = evaluate_concurrently(&mut self.evaluators, proposals.clone())?;
        let depth = self.max_history_depth;
        for (learner_index, (params, objective)) in proposals.into_iter().zip(&objectives).enumerate() {
            push_bounded(&mut self.param_histories[learner_index], params, depth);
            push_bounded(&mut self.objective_histories[learner_index], *objective, depth);
        }
        let round_best = objectives.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        debug!(round = round, best = round_best; "learner round complete");
        Ok(())
    }
}

fn push_bounded<T>(history: &mut VecDeque<T>, value: T, depth: usize) {
    history.push_front(value);
    history.truncate(depth);
}

/// One round's fan-out/fan-in: a scoped worker per learner, fed over its own
/// input channel and reporting over its own output channel.
fn evaluate_concurrently(
    evaluators: &mut [ObjectiveEvaluator], proposals: Vec<Vec<NamedParams>>,
) -> LearningResult<Vec<f64>> {
    let workers: Vec<&mut ObjectiveEvaluator> = evaluators.iter_mut().collect();
    let n = workers.len();
    thread::scope(|scope| {
        let mut inputs = Vec::with_capacity(n);
        let mut outputs = Vec::with_capacity(n);
        let mut handles = Vec::with_capacity(n);
        for evaluator in workers {
            let (input_tx, input_rx) = mpsc::channel::<Vec<NamedParams>>();
            let (output_tx, output_rx) = mpsc::channel::<SimResult<f64>>();
            handles.push(scope.spawn(move || {
                if let Ok(params) = input_rx.recv() {
                    // The coordinator only hangs up after a failure elsewhere.
                    let _ = output_tx.send(evaluator.evaluate(&params));
                }
            }));
            inputs.push(input_tx);
            outputs.push(output_rx);
        }
        for (input, params) in inputs.iter().zip(proposals) {
            // A closed input means the worker already died; joining reports it.
            let _ = input.send(params);
        }
        drop(inputs);

        let received: Vec<Option<SimResult<f64>>> =
            outputs.iter().map(|output| output.recv().ok()).collect();
        let mut panicked = None;
        for (learner_index, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(learner_index);
            }
        }
        if let Some(learner_index) = panicked {
            return Err(LearningError::LearnerPanicked { learner_index });
        }
        received
            .into_iter()
            .enumerate()
            .map(|(learner_index, result)| match result {
                Some(objective) => objective.map_err(LearningError::from),
                None => Err(LearningError::LearnerDisconnected { learner_index }),
            })
            .collect()
    })
}
