//! # Top-Level Controller
//!
//! Wires a preprocessed instance to the optimizer: trivial and greedy
//! bounds, encoding selection, back-end construction, and the final report.

use std::io::Write;

use crate::backend::{file, Backend, SatOracle};
use crate::encodings::MrcpspEncoding;
use crate::instance::Mrcpsp;
use crate::optimize::{OptOutcome, Optimizer, WriteSolveLog};
use crate::options::{Config, OptStrategy};
use crate::types::Schedule;
use crate::Error;

/// Result of a full solving run.
pub type SolveReport = OptOutcome;

/// Initial bounds and incumbent for a run: the trivial critical-path lower
/// bound, and either the explicit upper bound or the greedy one (whose
/// schedule seeds the optimizer, shrinking the window by one).
fn initial_bounds(ins: &Mrcpsp, cfg: &Config) -> (i32, i32, Option<(i32, Schedule)>) {
    let lb = cfg.lower_bound.unwrap_or(0).max(ins.trivial_lb());
    match cfg.upper_bound {
        Some(ub) => (lb, ub, None),
        None => {
            if cfg.compute_ub {
                if let Some(sched) = ins.compute_pss() {
                    let makespan = sched.makespan();
                    // the greedy solution is already known, search below it
                    return (lb, makespan - 1, Some((makespan, sched)));
                }
            }
            (lb, ins.horizon(), None)
        }
    }
}

/// Solves a preprocessed instance with the bundled SAT oracle.
pub fn solve(
    ins: &Mrcpsp,
    cfg: &Config,
    log: &mut dyn WriteSolveLog,
) -> Result<SolveReport, Error> {
    let mut backend: SatOracle = SatOracle::new(cfg.enc_cfg.amo);
    solve_with(ins, cfg, &mut backend, log)
}

/// Solves a preprocessed instance against a caller-provided back end.
pub fn solve_with<B: Backend>(
    ins: &Mrcpsp,
    cfg: &Config,
    backend: &mut B,
    log: &mut dyn WriteSolveLog,
) -> Result<SolveReport, Error> {
    let (lb, ub, incumbent) = initial_bounds(ins, cfg);
    let encoding = MrcpspEncoding::new(
        cfg.encoding,
        ins,
        cfg.enc_cfg,
        cfg.search.strategy == OptStrategy::Omt,
    );
    let mut optimizer = Optimizer::new(encoding, backend, cfg.search);
    optimizer.minimize(lb, ub, incumbent, log)
}

/// Serializes the selected encoding at the initial bounds instead of
/// solving.
pub fn output_encoding(ins: &Mrcpsp, cfg: &Config, w: &mut impl Write) -> Result<(), Error> {
    let (lb, ub, incumbent) = initial_bounds(ins, cfg);
    // emit the full window; the greedy makespan itself stays inside
    let ub = incumbent.map_or(ub, |(makespan, _)| makespan);
    let encoding = MrcpspEncoding::new(
        cfg.encoding,
        ins,
        cfg.enc_cfg,
        cfg.search.strategy == OptStrategy::Omt,
    );
    let formula = encoding.encode(lb, ub);
    file::write_formula(&formula, w)
}
