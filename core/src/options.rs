//! # Options
//!
//! Configuration of the encoding compiler and the optimizer loop. The CLI
//! layer maps its argument enums onto these types.

use std::fmt;
use std::time::Duration;

/// The available problem encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingKind {
    /// Time-indexed encoding with integer start variables
    #[default]
    SmtTime,
    /// Task-indexed encoding with per-activity pulses
    SmtTask,
    /// Pure-Boolean encoding with a hard PB makespan selector
    OmtSatPb,
    /// Pure-Boolean encoding with unit-weight soft makespan clauses
    OmtSoftPb,
    /// Order encoding of the start times
    Order,
    /// Order encoding plus pairwise ordering variables
    DoubleOrder,
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingKind::SmtTime => write!(f, "smttime"),
            EncodingKind::SmtTask => write!(f, "smttask"),
            EncodingKind::OmtSatPb => write!(f, "omtsatpb"),
            EncodingKind::OmtSoftPb => write!(f, "omtsoftpb"),
            EncodingKind::Order => write!(f, "order"),
            EncodingKind::DoubleOrder => write!(f, "doubleorder"),
        }
    }
}

/// Pseudo-Boolean encoding variant used when lowering PB and AMO-PB
/// constraints to clauses. Passed through the formula untouched; the back-end
/// driver dispatches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PbEncoding {
    /// Generalized totalizer
    #[default]
    Gte,
    /// Dynamic polynomial watchdog
    Gpw,
    /// Binary adder network
    Adder,
}

impl fmt::Display for PbEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PbEncoding::Gte => write!(f, "gte"),
            PbEncoding::Gpw => write!(f, "gpw"),
            PbEncoding::Adder => write!(f, "adder"),
        }
    }
}

/// At-most-one encoding variant used for exactly-one groups and the AMO part
/// of AMO-PB constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmoEncoding {
    /// Quadratic pairwise encoding
    #[default]
    Pairwise,
    /// Ladder (regular) encoding
    Ladder,
    /// Commander encoding
    Commander,
    /// Bimander encoding
    Bimander,
}

impl fmt::Display for AmoEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmoEncoding::Pairwise => write!(f, "pairwise"),
            AmoEncoding::Ladder => write!(f, "ladder"),
            AmoEncoding::Commander => write!(f, "commander"),
            AmoEncoding::Bimander => write!(f, "bimander"),
        }
    }
}

/// Encoding variants handed through to the back-end driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodingConfig {
    /// Variant for AMO-PB constraints
    pub amopb: PbEncoding,
    /// Variant for plain PB constraints
    pub pb: PbEncoding,
    /// Variant for AMO groups
    pub amo: AmoEncoding,
}

/// Strategy of the bounds-narrowing optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptStrategy {
    /// Single satisfiability call at the initial bounds
    Check,
    /// Decrease the upper bound below each solution found
    #[default]
    LinearUb,
    /// Increase the lower bound until a schedule of that makespan exists
    LinearLb,
    /// Bisect the remaining makespan window
    Binary,
    /// One native optimization call on the back end
    Omt,
}

impl fmt::Display for OptStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptStrategy::Check => write!(f, "check"),
            OptStrategy::LinearUb => write!(f, "linear-ub"),
            OptStrategy::LinearLb => write!(f, "linear-lb"),
            OptStrategy::Binary => write!(f, "binary"),
            OptStrategy::Omt => write!(f, "omt"),
        }
    }
}

/// Limits of a solving run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Wall-clock budget; checked between decider calls
    pub time: Option<Duration>,
}

impl Limits {
    /// No limits.
    pub fn none() -> Limits {
        Limits { time: None }
    }
}

/// How the optimizer cooperates with the back end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Optimization strategy
    pub strategy: OptStrategy,
    /// Submit bounds as retractable assumption literals instead of clauses
    pub use_assumptions: bool,
    /// Tighten the existing formula in place when bounds shrink
    pub narrow_bounds: bool,
    /// Run limits
    pub limits: Limits,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            strategy: OptStrategy::default(),
            use_assumptions: false,
            narrow_bounds: false,
            limits: Limits::none(),
        }
    }
}

/// Full configuration of a solving run, as assembled by the CLI.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Selected problem encoding
    pub encoding: EncodingKind,
    /// PB/AMO-PB/AMO variants
    pub enc_cfg: EncodingConfig,
    /// Optimizer cooperation options
    pub search: SearchOptions,
    /// Compute a greedy upper bound when no explicit one is given
    pub compute_ub: bool,
    /// Explicit initial lower bound
    pub lower_bound: Option<i32>,
    /// Explicit initial upper bound
    pub upper_bound: Option<i32>,
}
