//! # Optimizer Loop
//!
//! Given an encoding, a back end and initial makespan bounds, the optimizer
//! iterates satisfiability queries and narrows the bounds until the
//! incumbent is proved optimal. Progress is published through the
//! [`WriteSolveLog`] observer implemented by the controller or CLI.
//!
//! Two cooperation modes with the back end exist: bounds as retractable
//! assumption literals (the formula is encoded once at the widest window)
//! or bounds as permanent clauses (the formula is re-encoded unless
//! in-place narrowing succeeds).

use std::time::{Duration, Instant};

use cpu_time::ProcessTime;

use crate::backend::Backend;
use crate::encodings::MrcpspEncoding;
use crate::formula::SmtFormula;
use crate::options::{OptStrategy, SearchOptions};
use crate::types::{CheckResult, OptStatus, Schedule, SolveStats};
use crate::Error;

/// Observer for optimizer progress. All callbacks default to no-ops.
///
/// Per iteration that returned satisfiable, `log_solution` fires at most
/// once, followed by `log_new_bounds` before the next decider call.
pub trait WriteSolveLog {
    /// Tighter bounds were proved
    fn log_new_bounds(&mut self, lb: i32, ub: i32) {
        let _ = (lb, ub);
    }
    /// A satisfying schedule was found
    fn log_solution(&mut self, obj: i32, sched: &Schedule) {
        let _ = (obj, sched);
    }
    /// A satisfiability call returned
    fn log_check(&mut self, lb: i32, ub: i32, answer: &'static str, stats: &SolveStats) {
        let _ = (lb, ub, answer, stats);
    }
    /// A native optimization call returned
    fn log_native_call(&mut self, lb: i32, ub: i32, stats: &SolveStats) {
        let _ = (lb, ub, stats);
    }
    /// Optimality was proved
    fn log_optimum(&mut self, obj: i32) {
        let _ = obj;
    }
}

/// Observer that swallows all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl WriteSolveLog for NullLog {}

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptOutcome {
    pub status: OptStatus,
    /// Best schedule found with its makespan
    pub best: Option<(i32, Schedule)>,
    /// Final proved bounds
    pub lb: i32,
    pub ub: i32,
    pub stats: SolveStats,
}

/// The bounds-narrowing optimizer; owns the encoding, borrows the back end.
#[derive(Debug)]
pub struct Optimizer<'a, B> {
    encoding: MrcpspEncoding<'a>,
    backend: &'a mut B,
    opts: SearchOptions,
}

impl<'a, B: Backend> Optimizer<'a, B> {
    pub fn new(encoding: MrcpspEncoding<'a>, backend: &'a mut B, opts: SearchOptions) -> Self {
        Optimizer {
            encoding,
            backend,
            opts,
        }
    }

    /// Minimizes the makespan over `[lb, ub]`, seeded with an optional
    /// incumbent whose makespan is `ub + 1`.
    pub fn minimize(
        &mut self,
        lb: i32,
        ub: i32,
        incumbent: Option<(i32, Schedule)>,
        log: &mut dyn WriteSolveLog,
    ) -> Result<OptOutcome, Error> {
        let started = Instant::now();
        let mut stats = SolveStats::default();
        if lb > ub {
            // empty search window: the incumbent, if any, is already optimal
            let status = if incumbent.is_some() {
                log.log_optimum(incumbent.as_ref().expect("incumbent").0);
                OptStatus::Optimum
            } else {
                OptStatus::Unsat
            };
            return Ok(OptOutcome {
                status,
                best: incumbent,
                lb,
                ub,
                stats,
            });
        }
        match self.opts.strategy {
            OptStrategy::Omt => self.native(lb, ub, incumbent, log, started, stats),
            OptStrategy::Check => self.single_check(lb, ub, incumbent, log, started, stats),
            _ => self.search(lb, ub, incumbent, log, started, &mut stats),
        }
    }

    fn remaining(&self, started: Instant) -> Option<Duration> {
        self.opts
            .limits
            .time
            .map(|budget| budget.saturating_sub(started.elapsed()))
    }

    fn out_of_time(&self, started: Instant) -> bool {
        matches!(self.remaining(started), Some(rem) if rem.is_zero())
    }

    /// One native optimization call on the back end.
    fn native(
        &mut self,
        lb: i32,
        ub: i32,
        incumbent: Option<(i32, Schedule)>,
        log: &mut dyn WriteSolveLog,
        started: Instant,
        mut stats: SolveStats,
    ) -> Result<OptOutcome, Error> {
        let f = self.encoding.encode(lb, ub);
        stats.n_encodes += 1;
        self.backend.load(&f)?;
        let cpu = ProcessTime::now();
        let model = self.backend.minimize(self.remaining(started))?;
        stats.cpu_solve_time += cpu.elapsed();
        stats.n_checks += 1;
        log.log_native_call(lb, ub, &stats);
        let mut best = incumbent;
        let status = match model {
            Some(model) => {
                stats.n_sat += 1;
                let sched = self.encoding.set_model(&f, lb, ub, &model);
                let obj = sched.makespan();
                log.log_solution(obj, &sched);
                if best.as_ref().map_or(true, |&(b, _)| obj < b) {
                    best = Some((obj, sched));
                }
                OptStatus::Optimum
            }
            None if best.is_some() => {
                stats.n_unsat += 1;
                OptStatus::Optimum
            }
            None => {
                stats.n_unsat += 1;
                OptStatus::Unsat
            }
        };
        if status == OptStatus::Optimum {
            log.log_optimum(best.as_ref().expect("optimum has a schedule").0);
        }
        Ok(OptOutcome {
            status,
            best,
            lb,
            ub,
            stats,
        })
    }

    /// One satisfiability call at the given bounds, without optimization.
    fn single_check(
        &mut self,
        lb: i32,
        ub: i32,
        incumbent: Option<(i32, Schedule)>,
        log: &mut dyn WriteSolveLog,
        started: Instant,
        mut stats: SolveStats,
    ) -> Result<OptOutcome, Error> {
        let f = self.encoding.encode(lb, ub);
        stats.n_encodes += 1;
        self.backend.load(&f)?;
        let cpu = ProcessTime::now();
        let res = self.backend.check(&[], self.remaining(started))?;
        stats.cpu_solve_time += cpu.elapsed();
        stats.n_checks += 1;
        log.log_check(lb, ub, res.answer(), &stats);
        let (status, best) = match res {
            CheckResult::Sat(model) => {
                stats.n_sat += 1;
                let sched = self.encoding.set_model(&f, lb, ub, &model);
                let obj = sched.makespan();
                log.log_solution(obj, &sched);
                (OptStatus::Sat, Some((obj, sched)))
            }
            CheckResult::Unsat => {
                stats.n_unsat += 1;
                (OptStatus::Unsat, incumbent)
            }
            CheckResult::Interrupted => (OptStatus::Timeout, incumbent),
        };
        Ok(OptOutcome {
            status,
            best,
            lb,
            ub,
            stats,
        })
    }

    /// The bounds-narrowing search loop shared by the linear and binary
    /// strategies.
    fn search(
        &mut self,
        mut lb: i32,
        mut ub: i32,
        incumbent: Option<(i32, Schedule)>,
        log: &mut dyn WriteSolveLog,
        started: Instant,
        stats: &mut SolveStats,
    ) -> Result<OptOutcome, Error> {
        let mut best = incumbent;
        let mut formula: Option<SmtFormula> = None;
        // window the current formula reflects
        let mut enc_win = (lb, ub);
        let status = loop {
            if self.out_of_time(started) {
                break OptStatus::Timeout;
            }
            let (qlb, qub) = match self.opts.strategy {
                OptStrategy::LinearUb => (lb, ub),
                OptStrategy::LinearLb => (lb, lb),
                OptStrategy::Binary => (lb, lb + (ub - lb) / 2),
                OptStrategy::Check | OptStrategy::Omt => unreachable!("handled before the loop"),
            };

            if self.opts.use_assumptions {
                // encode once at the widest window; only global bounds may
                // narrow the formula permanently
                if formula.is_none() {
                    let f = self.encoding.encode(lb, ub);
                    stats.n_encodes += 1;
                    self.backend.load(&f)?;
                    enc_win = (lb, ub);
                    formula = Some(f);
                } else if self.opts.narrow_bounds && ub < enc_win.1 {
                    let f = formula.as_mut().expect("formula encoded");
                    if self.encoding.narrow_bounds(f, enc_win.0, enc_win.1, lb, ub) {
                        stats.n_narrows += 1;
                        self.backend.sync(f)?;
                        enc_win = (lb, ub);
                    }
                }
            } else if formula.is_none() || enc_win != (qlb, qub) {
                let narrowed = match formula.as_mut() {
                    Some(f) if self.opts.narrow_bounds => {
                        self.encoding.narrow_bounds(f, enc_win.0, enc_win.1, qlb, qub)
                    }
                    _ => false,
                };
                if narrowed {
                    stats.n_narrows += 1;
                    self.backend.sync(formula.as_ref().expect("formula encoded"))?;
                } else {
                    let f = self.encoding.encode(qlb, qub);
                    stats.n_encodes += 1;
                    self.backend.load(&f)?;
                    formula = Some(f);
                }
                enc_win = (qlb, qub);
            }
            let f = formula.as_ref().expect("formula encoded");

            let assumps = if self.opts.use_assumptions {
                self.encoding.assume_bounds(f, enc_win.1, qlb, qub)
            } else {
                Vec::new()
            };
            let cpu = ProcessTime::now();
            let res = self.backend.check(&assumps, self.remaining(started))?;
            stats.cpu_solve_time += cpu.elapsed();
            stats.n_checks += 1;
            log.log_check(qlb, qub, res.answer(), stats);

            match res {
                CheckResult::Sat(model) => {
                    stats.n_sat += 1;
                    let sched = self.encoding.set_model(f, qlb, qub, &model);
                    let obj = sched.makespan();
                    log.log_solution(obj, &sched);
                    if best.as_ref().map_or(true, |&(b, _)| obj < b) {
                        best = Some((obj, sched));
                    }
                    ub = obj - 1;
                }
                CheckResult::Unsat => {
                    stats.n_unsat += 1;
                    // nothing below qlb exists either, so the whole
                    // submitted window is exhausted
                    lb = qub + 1;
                }
                CheckResult::Interrupted => break OptStatus::Timeout,
            }
            log.log_new_bounds(lb, ub);
            if lb > ub {
                match &best {
                    Some((obj, _)) => {
                        log.log_optimum(*obj);
                        break OptStatus::Optimum;
                    }
                    None => break OptStatus::Unsat,
                }
            }
        };
        Ok(OptOutcome {
            status,
            best,
            lb,
            ub,
            stats: *stats,
        })
    }
}
