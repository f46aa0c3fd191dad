//! # mrcpsp2smt-core
//!
//! Encoding compiler and optimization loop for the Multi-mode
//! Resource-Constrained Project Scheduling Problem (MRCPSP).
//!
//! The crate compiles a preprocessed [`Mrcpsp`](instance::Mrcpsp) instance
//! into a [`SmtFormula`](formula::SmtFormula) under one of several
//! interchangeable variable schemes (see [`encodings`]), hands the formula to
//! a back-end decision procedure through the [`backend::Backend`] driver
//! contract, and narrows the makespan bounds in [`optimize`] until optimality
//! is proved.

pub mod backend;
pub mod controller;
pub mod encodings;
pub mod formula;
pub mod instance;
pub mod optimize;
pub mod options;
pub mod parsing;
pub mod types;

pub use controller::{solve, SolveReport};
pub use encodings::MrcpspEncoding;
pub use instance::Mrcpsp;
pub use optimize::{NullLog, WriteSolveLog};
pub use options::{Config, EncodingKind, Limits, OptStrategy, SearchOptions};
pub use types::{OptStatus, Schedule};

/// Error taxonomy of the solving pipeline.
///
/// None of these are recovered from locally; they bubble up to the binary,
/// which maps them to a status line and an exit code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed instance file
    #[error("parse error: {0}")]
    Parse(String),
    /// Preprocessing proved the instance unsatisfiable
    #[error("infeasible instance: {0}")]
    Infeasible(String),
    /// Misconfiguration or an ill-formed formula
    #[error("encoding error: {0}")]
    Encoding(String),
    /// The decision procedure failed or returned an unusable answer
    #[error("backend error: {0}")]
    Backend(String),
}

impl Error {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        Error::Backend(err.to_string())
    }
}
