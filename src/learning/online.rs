//! learning::online: periodic refitting over sliding windows of live data.
//!
//! Purpose
//! -------
//! Run as one partition of an engine alongside the partitions that stream
//! data ("streamers"). Every step it records each streamer's latest
//! observation in a per-streamer [`SlidingWindow`]; every `refit_steps`
//! steps it replays the windows through a fresh [`ObjectiveEvaluator`] and
//! refits the streamers' masked parameters with the configured optimiser.
//! Its own state is the flattened parameter vector.
//!
//! Key behaviors
//! -------------
//! - Configuration reads int params `streamer_partition_indices`,
//!   `learner_history_depths` and `refit_steps` from the learner's own
//!   partition.
//! - The window size is the learner's own state-history depth. Every
//!   streamer must share it.
//! - The first step seeds the output from the streamers' current
//!   parameters; steps that do not refit return the current vector.
//! - A refit only runs once every window is full, replaying exactly
//!   `window_size - 1` steps starting from the oldest windowed entry.
//!
//! Invariants & assumptions
//! ------------------------
//! - The learner's state width equals the number of masked parameter
//!   entries across its streamers.
//! - Windows hold at most `window_size` entries at any time.
//! - Optimiser failures are fatal to the engine run.
use std::sync::Arc;

use log::info;
use ndarray::Array1;

use crate::{
    data::{MemoryIteration, MemoryTimestepFunction, StreamData},
    filter::ProbabilityFilterLikelihood,
    learning::{
        evaluator::ObjectiveEvaluator, objective::ObjectiveIteration, output::ObjectiveOutput,
        window::SlidingWindow,
    },
    optimization::OptimisationAlgorithm,
    params::{NamedParams, ParamsMapping},
    simulator::{
        Iteration, NumberOfStepsTermination, Settings, SimError, SimResult, StateHistory,
        TimestepsHistory,
    },
};

pub const STREAMER_PARTITION_INDICES: &str = "streamer_partition_indices";
pub const LEARNER_HISTORY_DEPTHS: &str = "learner_history_depths";
pub const REFIT_STEPS: &str = "refit_steps";

/// Static configuration shared by every copy of an online learner.
pub struct OnlineLearningConfig {
    /// One filter per streamer, in `streamer_partition_indices` order.
    pub objectives: Vec<ProbabilityFilterLikelihood>,
    pub burn_in_steps: usize,
    pub optimiser: OptimisationAlgorithm,
    pub output: Arc<dyn ObjectiveOutput>,
}

#[derive(Clone)]
pub struct OnlineLearningIteration {
    config: Arc<OnlineLearningConfig>,
    streamer_indices: Vec<usize>,
    streamer_seeds: Vec<u64>,
    streamer_widths: Vec<usize>,
    learner_history_depths: Vec<usize>,
    refit_steps: usize,
    window_size: usize,
    windows: Vec<SlidingWindow>,
    learner_params: Vec<NamedParams>,
    mapping: ParamsMapping,
    current: Array1<f64>,
    steps_taken: usize,
}

impl OnlineLearningIteration {
    pub fn new(config: Arc<OnlineLearningConfig>) -> Self {
        Self {
            config,
            streamer_indices: Vec::new(),
            streamer_seeds: Vec::new(),
            streamer_widths: Vec::new(),
            learner_history_depths: Vec::new(),
            refit_steps: 1,
            window_size: 0,
            windows: Vec::new(),
            learner_params: Vec::new(),
            mapping: ParamsMapping::default(),
            current: Array1::zeros(0),
            steps_taken: 0,
        }
    }

    /// Streamers' parameters after the latest refit.
    pub fn learner_params(&self) -> &[NamedParams] {
        &self.learner_params
    }

    pub fn windows(&self) -> &[SlidingWindow] {
        &self.windows
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    fn ready_to_refit(&self) -> bool {
        self.steps_taken % self.refit_steps == 0 && self.windows.iter().all(SlidingWindow::is_full)
    }

    /// Replay the windows and refit the streamers' masked parameters.
    fn refit(&mut self) -> SimResult<()> {
        let streams = self
            .windows
            .iter()
            .map(|w| StreamData::from_window(w).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        let settings = Settings {
            params: self.learner_params.clone(),
            init_state_values: streams
                .iter()
                .map(|s| s.state(0).map(|row| row.to_vec()).unwrap_or_default())
                .collect(),
            init_time_value: streams[0].time(0).unwrap_or_default(),
            seeds: self.streamer_seeds.clone(),
            state_widths: self.streamer_widths.clone(),
            state_history_depths: self.learner_history_depths.clone(),
            timesteps_history_depth: self.learner_history_depths.iter().copied().max().unwrap_or(1),
        };
        let iterations = self
            .config
            .objectives
            .iter()
            .zip(&streams)
            .map(|(objective, stream)| {
                ObjectiveIteration::new(
                    objective.clone(),
                    Box::new(MemoryIteration::new(Arc::clone(stream))),
                    self.config.burn_in_steps,
                )
            })
            .collect();
        let evaluator = ObjectiveEvaluator::new(
            iterations,
            settings,
            Arc::new(MemoryTimestepFunction::new(Arc::clone(&streams[0]))),
            Arc::new(NumberOfStepsTermination { max_steps: self.window_size - 1 }),
            Arc::clone(&self.config.output),
        )?;
        let mut previous = self.learner_params.clone();
        self.mapping.unflatten(&self.current, &mut previous)?;
        self.learner_params = self.config.optimiser.run(&evaluator, &previous)?;
        self.current = self.mapping.flatten(&self.learner_params)?;
        info!(
            step = self.steps_taken,
            window_start = self.windows[0].oldest_time().unwrap_or_default();
            "refitted online learner"
        );
        Ok(())
    }
}

fn invalid(reason: String) -> SimError {
    SimError::InvalidSettings { reason }
}

impl Iteration for OnlineLearningIteration {
    fn configure(&mut self, partition_index: usize, settings: &Settings) -> SimResult<()> {
        let own = &settings.params[partition_index];
        let streamer_indices = own
            .int(STREAMER_PARTITION_INDICES)?
            .iter()
            .map(|&i| {
                usize::try_from(i)
                    .ok()
                    .filter(|&i| i < settings.partitions() && i != partition_index)
                    .ok_or_else(|| invalid(format!("streamer partition index {i} is not usable")))
            })
            .collect::<SimResult<Vec<usize>>>()?;
        if streamer_indices.is_empty() {
            return Err(invalid(format!("partition {partition_index} names no streamers")));
        }
        let learner_history_depths = own
            .int(LEARNER_HISTORY_DEPTHS)?
            .iter()
            .map(|&d| {
                usize::try_from(d)
                    .ok()
                    .filter(|&d| d > 0)
                    .ok_or_else(|| invalid(format!("learner history depth {d} must be positive")))
            })
            .collect::<SimResult<Vec<usize>>>()?;
        if learner_history_depths.len() != streamer_indices.len() {
            return Err(invalid(format!(
                "{} learner history depths for {} streamers",
                learner_history_depths.len(),
                streamer_indices.len()
            )));
        }
        if self.config.objectives.len() != streamer_indices.len() {
            return Err(invalid(format!(
                "{} objectives for {} streamers",
                self.config.objectives.len(),
                streamer_indices.len()
            )));
        }
        let refit_steps = own.int_scalar(REFIT_STEPS)?;
        self.refit_steps = usize::try_from(refit_steps)
            .ok()
            .filter(|&r| r > 0)
            .ok_or_else(|| invalid(format!("refit_steps {refit_steps} must be positive")))?;

        let window_size = settings.state_history_depths[partition_index];
        for &streamer_index in &streamer_indices {
            let found = settings.state_history_depths[streamer_index];
            if found != window_size {
                return Err(SimError::WindowDepthMismatch {
                    partition_index,
                    streamer_index,
                    expected: window_size,
                    found,
                });
            }
        }
        if window_size < 2 {
            return Err(invalid(format!("window size {window_size} leaves nothing to replay")));
        }

        let learner_params: Vec<NamedParams> =
            streamer_indices.iter().map(|&i| settings.params[i].clone()).collect();
        let mapping = ParamsMapping::new(&learner_params)?;
        let width = settings.state_widths[partition_index];
        if width != mapping.len() {
            return Err(SimError::StateWidthMismatch {
                partition_index,
                expected: mapping.len(),
                found: width,
            });
        }

        self.streamer_seeds = streamer_indices.iter().map(|&i| settings.seeds[i]).collect();
        self.streamer_widths = streamer_indices.iter().map(|&i| settings.state_widths[i]).collect();
        self.windows = vec![SlidingWindow::new(window_size); streamer_indices.len()];
        self.current = mapping.flatten(&learner_params)?;
        self.streamer_indices = streamer_indices;
        self.learner_history_depths = learner_history_depths;
        self.window_size = window_size;
        self.learner_params = learner_params;
        self.mapping = mapping;
        self.steps_taken = 0;
        Ok(())
    }

    fn iterate(
        &mut self, _params: &NamedParams, _partition_index: usize,
        state_histories: &[StateHistory], timesteps_history: &TimestepsHistory,
    ) -> SimResult<Array1<f64>> {
        self.steps_taken += 1;
        let time = timesteps_history.current_time();
        for (window, &index) in self.windows.iter_mut().zip(&self.streamer_indices) {
            window.push(time, state_histories[index].current().to_owned());
        }
        if self.steps_taken == 1 {
            self.current = self.mapping.flatten(&self.learner_params)?;
        }
        if self.ready_to_refit() {
            self.refit()?;
        }
        Ok(self.current.clone())
    }

    fn boxed_clone(&self) -> Box<dyn Iteration> {
        Box::new(self.clone())
    }
}
