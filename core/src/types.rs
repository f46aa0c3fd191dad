//! # Types
//!
//! Shared types of the encoding compiler and the optimizer loop.

use std::fmt;

/// A feasible schedule of an instance: one start time and one execution mode
/// per activity, including the two dummies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Start time per activity, indexed `0..=n+1`
    pub starts: Vec<i32>,
    /// Chosen mode per activity, indexed `0..=n+1`
    pub modes: Vec<usize>,
}

impl Schedule {
    /// The completion time of the sink activity.
    pub fn makespan(&self) -> i32 {
        *self.starts.last().expect("schedule without activities")
    }
}

impl fmt::Display for Schedule {
    /// Formats the schedule as the space-separated `i:start:mode` triples of
    /// the solution line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (&start, &mode)) in self.starts.iter().zip(self.modes.iter()).enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{i}:{start}:{mode}")?;
        }
        Ok(())
    }
}

/// An assignment returned by a back end, aligned with the formula's variable
/// pools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    /// One value per Boolean variable, in creation order
    pub bools: Vec<bool>,
    /// One value per integer variable, in creation order
    pub ints: Vec<i32>,
}

/// Answer of a single satisfiability call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// Satisfiable, with the model found
    Sat(Model),
    /// Proved unsatisfiable
    Unsat,
    /// The call was cut off before an answer was reached
    Interrupted,
}

impl CheckResult {
    /// Short answer name, used in log lines.
    pub fn answer(&self) -> &'static str {
        match self {
            CheckResult::Sat(_) => "SAT",
            CheckResult::Unsat => "UNSAT",
            CheckResult::Interrupted => "UNKNOWN",
        }
    }
}

/// Final status of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptStatus {
    /// The incumbent is proved optimal
    Optimum,
    /// A solution was found but optimality was not queried (check mode)
    Sat,
    /// No schedule exists within the queried bounds
    Unsat,
    /// The time budget ran out; the incumbent (if any) is not proved optimal
    Timeout,
}

impl fmt::Display for OptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptStatus::Optimum => write!(f, "OPTIMUM FOUND"),
            OptStatus::Sat => write!(f, "SATISFIABLE"),
            OptStatus::Unsat => write!(f, "UNSATISFIABLE"),
            OptStatus::Timeout => write!(f, "UNKNOWN"),
        }
    }
}

/// Counters accumulated over one optimization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Number of satisfiability calls made to the back end
    pub n_checks: usize,
    /// Satisfiable answers among them
    pub n_sat: usize,
    /// Unsatisfiable answers among them
    pub n_unsat: usize,
    /// Number of formulas encoded from scratch
    pub n_encodes: usize,
    /// Number of in-place bound tightenings
    pub n_narrows: usize,
    /// CPU time spent inside the back end
    pub cpu_solve_time: std::time::Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_display_and_makespan() {
        let sched = Schedule {
            starts: vec![0, 0, 2, 5],
            modes: vec![0, 1, 0, 0],
        };
        assert_eq!(sched.makespan(), 5);
        assert_eq!(format!("{sched}"), "0:0:0 1:0:1 2:2:0 3:5:0");
    }
}
