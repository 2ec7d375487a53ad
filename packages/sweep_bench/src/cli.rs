//! Command-line and TOML configuration surface for the benchmark binaries.
//!
//! Every binary parses one of the family argument structs with [`argh`] and
//! converts it into normalized sweep inputs. An optional TOML file supplies
//! the same settings; explicitly given command-line values win over the file,
//! and mode flags combine with logical OR so either surface can enable them.

use std::fs;
use std::path::{Path, PathBuf};

use argh::FromArgs;
use serde::Deserialize;

use crate::{RawParams, SessionError, SessionOptions, SweepParams};

/// Settings accepted from a TOML configuration file. All keys are optional;
/// unknown keys are rejected so typos do not silently fall back to defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    repetitions: Vec<u32>,
    iterations: Vec<u64>,
    threads: Vec<u32>,
    workload: Vec<u64>,
    array_sizes: Vec<u64>,
    teams: Vec<u32>,
    gpu_threads: Vec<u32>,
    children: Vec<u32>,
    tasks: Vec<u64>,
    directive_repeats: Option<u32>,
    reference_threads: Option<u32>,
    quiet: bool,
    save_results: bool,
    epcc: bool,
    warm_up: bool,
    clamp_low: bool,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self, SessionError> {
        let text = fs::read_to_string(path)?;

        toml::from_str(&text).map_err(|error| {
            SessionError::Config(format!("{}: {error}", path.display()))
        })
    }

    fn load_optional(path: Option<&Path>) -> Result<Self, SessionError> {
        path.map(Self::load).transpose().map(Option::unwrap_or_default)
    }
}

/// Explicitly given command-line values win over the configuration file.
fn pick<T>(from_cli: Vec<T>, from_config: Vec<T>) -> Vec<T> {
    if from_cli.is_empty() {
        from_config
    } else {
        from_cli
    }
}

/// Command line of a CPU work-sharing benchmark binary.
#[derive(Debug, FromArgs)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "each switch is an independently selectable mode"
)]
pub struct WorksharingArgs {
    /// path to a TOML configuration file
    #[argh(option)]
    pub config: Option<PathBuf>,

    /// number of timed samples per configuration; repeatable
    #[argh(option)]
    pub repetitions: Vec<u32>,

    /// inner loop size; repeatable
    #[argh(option)]
    pub iterations: Vec<u64>,

    /// thread count to sweep; repeatable
    #[argh(option)]
    pub threads: Vec<u32>,

    /// synthetic compute cost per unit of work; repeatable
    #[argh(option)]
    pub workload: Vec<u64>,

    /// number of construct executions per timed sample
    #[argh(option)]
    pub directive_repeats: Option<u32>,

    /// suppress console reporting
    #[argh(switch)]
    pub quiet: bool,

    /// persist collected series to the per-family JSON document
    #[argh(switch)]
    pub save_results: bool,

    /// use EPCC-style per-thread overhead accounting
    #[argh(switch)]
    pub epcc: bool,

    /// warm up the worker pool before each measurement window
    #[argh(switch)]
    pub warm_up: bool,

    /// report overheads at or below 1.0 microseconds as exactly 1.0
    #[argh(switch)]
    pub clamp_low: bool,
}

impl WorksharingArgs {
    /// Merges the command line with the optional configuration file and
    /// normalizes the result into sweep inputs.
    pub fn into_inputs(self) -> Result<(SweepParams, SessionOptions), SessionError> {
        let config = ConfigFile::load_optional(self.config.as_deref())?;

        let raw = RawParams {
            repetitions: pick(self.repetitions, config.repetitions),
            iterations: pick(self.iterations, config.iterations),
            threads: pick(self.threads, config.threads),
            workload: pick(self.workload, config.workload),
            directive_repeats: self.directive_repeats.or(config.directive_repeats),
            ..RawParams::default()
        };

        let options = SessionOptions {
            quiet: self.quiet || config.quiet,
            save_results: self.save_results || config.save_results,
            epcc: self.epcc || config.epcc,
            warm_up: self.warm_up || config.warm_up,
            clamp_low: self.clamp_low || config.clamp_low,
        };

        Ok((SweepParams::worksharing(raw), options))
    }
}

/// Command line of an offload benchmark binary.
#[derive(Debug, FromArgs)]
pub struct OffloadArgs {
    /// path to a TOML configuration file
    #[argh(option)]
    pub config: Option<PathBuf>,

    /// number of timed samples per configuration; repeatable
    #[argh(option)]
    pub repetitions: Vec<u32>,

    /// inner loop size; repeatable
    #[argh(option)]
    pub iterations: Vec<u64>,

    /// synthetic compute cost per unit of work; repeatable
    #[argh(option)]
    pub workload: Vec<u64>,

    /// element count staged to the device; repeatable
    #[argh(option)]
    pub array_sizes: Vec<u64>,

    /// team count on the device; repeatable
    #[argh(option)]
    pub teams: Vec<u32>,

    /// threads per team on the device; repeatable
    #[argh(option)]
    pub gpu_threads: Vec<u32>,

    /// CPU thread count the device is compared against
    #[argh(option)]
    pub reference_threads: Option<u32>,

    /// suppress console reporting
    #[argh(switch)]
    pub quiet: bool,

    /// persist collected series to the per-family JSON document
    #[argh(switch)]
    pub save_results: bool,

    /// warm up the worker pool before each measurement window
    #[argh(switch)]
    pub warm_up: bool,
}

impl OffloadArgs {
    /// Merges the command line with the optional configuration file and
    /// normalizes the result into sweep inputs.
    pub fn into_inputs(self) -> Result<(SweepParams, SessionOptions), SessionError> {
        let config = ConfigFile::load_optional(self.config.as_deref())?;

        let raw = RawParams {
            repetitions: pick(self.repetitions, config.repetitions),
            iterations: pick(self.iterations, config.iterations),
            workload: pick(self.workload, config.workload),
            array_sizes: pick(self.array_sizes, config.array_sizes),
            teams: pick(self.teams, config.teams),
            gpu_threads: pick(self.gpu_threads, config.gpu_threads),
            reference_threads: self.reference_threads.or(config.reference_threads),
            ..RawParams::default()
        };

        let options = SessionOptions {
            quiet: self.quiet || config.quiet,
            save_results: self.save_results || config.save_results,
            warm_up: self.warm_up || config.warm_up,
            ..SessionOptions::default()
        };

        Ok((SweepParams::offload(raw), options))
    }
}

/// Command line of a task-tree benchmark binary.
#[derive(Debug, FromArgs)]
pub struct TaskTreeArgs {
    /// path to a TOML configuration file
    #[argh(option)]
    pub config: Option<PathBuf>,

    /// number of timed samples per configuration; repeatable
    #[argh(option)]
    pub repetitions: Vec<u32>,

    /// total number of tasks to create; repeatable
    #[argh(option)]
    pub tasks: Vec<u64>,

    /// synthetic compute cost per task; repeatable
    #[argh(option)]
    pub workload: Vec<u64>,

    /// branching factor of the generated tree; repeatable
    #[argh(option)]
    pub children: Vec<u32>,

    /// suppress console reporting
    #[argh(switch)]
    pub quiet: bool,

    /// persist collected series to the per-family JSON document
    #[argh(switch)]
    pub save_results: bool,

    /// warm up the worker pool before each measurement window
    #[argh(switch)]
    pub warm_up: bool,
}

impl TaskTreeArgs {
    /// Merges the command line with the optional configuration file and
    /// normalizes the result into sweep inputs.
    pub fn into_inputs(self) -> Result<(SweepParams, SessionOptions), SessionError> {
        let config = ConfigFile::load_optional(self.config.as_deref())?;

        let raw = RawParams {
            repetitions: pick(self.repetitions, config.repetitions),
            tasks: pick(self.tasks, config.tasks),
            workload: pick(self.workload, config.workload),
            child_nodes: pick(self.children, config.children),
            ..RawParams::default()
        };

        let options = SessionOptions {
            quiet: self.quiet || config.quiet,
            save_results: self.save_results || config.save_results,
            warm_up: self.warm_up || config.warm_up,
            ..SessionOptions::default()
        };

        Ok((SweepParams::task_tree(raw), options))
    }
}
