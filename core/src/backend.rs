//! # Back-End Drivers
//!
//! A back end adapts a formula to a concrete decision procedure and returns
//! Boolean plus integer assignments. The bundled driver lowers formulas to
//! CNF and calls an in-process incremental SAT oracle; file emission for
//! external solvers lives in [`file`].

pub mod file;
pub mod lower;
pub mod sat;

pub use sat::SatOracle;

use std::time::Duration;

use crate::formula::{Literal, SmtFormula};
use crate::types::{CheckResult, Model};
use crate::Error;

/// Driver contract between the optimizer and a decision procedure.
///
/// The optimizer first `load`s a freshly encoded formula; after in-place
/// bound tightening it hands the grown formula back through `sync`, which
/// must submit exactly the clauses added since the last submission. `check`
/// answers one satisfiability query under temporary assumptions; `minimize`
/// is the native optimization path for back ends that support it.
pub trait Backend {
    /// Submits a freshly encoded formula, replacing any previous one.
    fn load(&mut self, f: &SmtFormula) -> Result<(), Error>;

    /// Submits the clauses appended to the loaded formula since the last
    /// `load` or `sync`.
    fn sync(&mut self, f: &SmtFormula) -> Result<(), Error>;

    /// One satisfiability call. The time budget is advisory; drivers that
    /// cannot interrupt their solver may ignore it.
    fn check(
        &mut self,
        assumps: &[Literal],
        budget: Option<Duration>,
    ) -> Result<CheckResult, Error>;

    /// Natively minimizes the loaded formula's objective. Returns the
    /// optimal model, or `None` when the formula is unsatisfiable.
    fn minimize(&mut self, budget: Option<Duration>) -> Result<Option<Model>, Error> {
        let _ = budget;
        Err(Error::Backend(
            "native optimization is not supported by this back end".into(),
        ))
    }
}
