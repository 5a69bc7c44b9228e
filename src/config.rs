//! config: JSON run configuration for the `learnadex` binary.
//!
//! Purpose
//! -------
//! Describe one offline fit: where the stream lives, which kernel and data
//! link score it, the starting parameters and how to optimise them. Every
//! section maps onto library types through a checked builder so mistakes
//! surface as [`ConfigError`]s before any data is read.
//!
//! Conventions
//! -----------
//! - Names are parsed case-insensitively through the library's `FromStr`
//!   impls (`DataLinkFamily`, `SolverMethod`).
//! - Optional sections fall back to library defaults.
use std::{fs, path::Path, path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    data::{EndOfStreamTermination, MemoryIteration, MemoryTimestepFunction, StreamData, replay_settings},
    filter::{
        ConditionalProbability, CovarianceKernel, DataLinkFamily, DataLinkingLikelihood,
        GaussianProcessProbability, ProbabilityFilterLikelihood,
    },
    learning::{ObjectiveEvaluator, ObjectiveIteration, ObjectiveOutput},
    optimization::{
        OptimiserOptions, SolverMethod, Tolerances, loglik_optimizer::DEFAULT_SIMPLEX_STEP,
    },
    params::NamedParams,
};

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io { path: String, reason: String },
    /// The file is not valid JSON for [`RunConfig`].
    Parse { reason: String },
    /// A field parsed but holds an unusable value.
    Invalid { field: &'static str, reason: String },
}

impl std::error::Error for ConfigError {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, reason } => write!(f, "Failed to read config '{path}': {reason}"),
            ConfigError::Parse { reason } => write!(f, "Invalid config: {reason}"),
            ConfigError::Invalid { field, reason } => write!(f, "Invalid '{field}': {reason}"),
        }
    }
}

fn invalid(field: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.to_string() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub path: PathBuf,
    pub time_column: usize,
    pub state_columns: Vec<usize>,
    #[serde(default)]
    pub skip_header: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelConfig {
    Uniform,
    Exponential,
    /// Gaussian process with a constant covariance kernel.
    GaussianProcess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimiserConfig {
    pub method: String,
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub tol_simplex: Option<f64>,
    pub max_iter: Option<usize>,
    pub lbfgs_mem: Option<usize>,
    pub simplex_step: f64,
    pub parallel_trials: bool,
}

impl Default for OptimiserConfig {
    fn default() -> Self {
        Self {
            method: "neldermead".to_string(),
            tol_grad: None,
            tol_cost: None,
            tol_simplex: None,
            max_iter: None,
            lbfgs_mem: None,
            simplex_step: DEFAULT_SIMPLEX_STEP,
            parallel_trials: false,
        }
    }
}

fn default_history_depth() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataSourceConfig,
    pub kernel: KernelConfig,
    pub data_link: String,
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    #[serde(default)]
    pub burn_in_steps: usize,
    pub params: NamedParams,
    #[serde(default)]
    pub optimiser: OptimiserConfig,
    /// Optional JSON-lines file receiving every trial's objective record.
    #[serde(default)]
    pub json_log: Option<PathBuf>,
    #[serde(default)]
    pub seed: u64,
}

impl RunConfig {
    /// # Errors
    /// [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// # Errors
    /// [`ConfigError::Parse`] for malformed JSON or missing fields.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse { reason: e.to_string() })
    }

    pub fn conditional_probability(&self) -> ConditionalProbability {
        match self.kernel {
            KernelConfig::Uniform => ConditionalProbability::Uniform,
            KernelConfig::Exponential => ConditionalProbability::exponential(),
            KernelConfig::GaussianProcess => {
                ConditionalProbability::gaussian_process(CovarianceKernel::constant())
            }
        }
    }

    /// # Errors
    /// [`ConfigError::Invalid`] for an unknown family name.
    pub fn data_linking(&self) -> ConfigResult<DataLinkingLikelihood> {
        let family: DataLinkFamily = self.data_link.parse().map_err(|e| invalid("data_link", e))?;
        Ok(DataLinkingLikelihood::new(family))
    }

    /// Validated optimiser options; with no tolerance set the library
    /// defaults apply.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] wrapping the optimiser's validation error.
    pub fn optimiser_options(&self) -> ConfigResult<OptimiserOptions> {
        let o = &self.optimiser;
        let method: SolverMethod = o.method.parse().map_err(|e| invalid("optimiser.method", e))?;
        let tols = if o.tol_grad.is_none()
            && o.tol_cost.is_none()
            && o.tol_simplex.is_none()
            && o.max_iter.is_none()
        {
            Tolerances::default()
        } else {
            Tolerances::new(o.tol_grad, o.tol_cost, o.tol_simplex, o.max_iter)
                .map_err(|e| invalid("optimiser", e))?
        };
        OptimiserOptions::new(method, tols, o.lbfgs_mem, o.simplex_step, o.parallel_trials)
            .map_err(|e| invalid("optimiser", e))
    }

    /// Starting parameters, with per-time means registered for the
    /// Gaussian-process kernel.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if the parameters are inconsistent.
    pub fn starting_params(&self) -> ConfigResult<NamedParams> {
        let mut params = self.params.clone();
        if self.kernel == KernelConfig::GaussianProcess {
            GaussianProcessProbability::seed_time_means(&mut params, self.seed)
                .map_err(|e| invalid("params", e))?;
        }
        params.validate().map_err(|e| invalid("params", e))?;
        Ok(params)
    }

    /// Single-partition evaluator replaying `stream` through the configured
    /// filter.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] for unusable parameters, depths or families.
    pub fn evaluator(
        &self, stream: Arc<StreamData>, output: Arc<dyn ObjectiveOutput>,
    ) -> ConfigResult<ObjectiveEvaluator> {
        let settings =
            replay_settings(&[Arc::clone(&stream)], vec![self.starting_params()?], self.history_depth)
                .map_err(|e| invalid("history_depth", e))?;
        let likelihood =
            ProbabilityFilterLikelihood::new(self.conditional_probability(), self.data_linking()?);
        let iteration = ObjectiveIteration::new(
            likelihood,
            Box::new(MemoryIteration::new(Arc::clone(&stream))),
            self.burn_in_steps,
        );
        ObjectiveEvaluator::new(
            vec![iteration],
            settings,
            Arc::new(MemoryTimestepFunction::new(Arc::clone(&stream))),
            Arc::new(EndOfStreamTermination::new(&stream)),
            output,
        )
        .map_err(|e| invalid("params", e))
    }
}
