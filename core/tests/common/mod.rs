//! Shared fixtures of the integration tests.
#![allow(dead_code)]

use mrcpsp2smt_core::controller::{self, SolveReport};
use mrcpsp2smt_core::options::SearchOptions;
use mrcpsp2smt_core::{Config, EncodingKind, Mrcpsp, NullLog, OptStrategy};

/// Solves with the bundled oracle, greedy upper bound on, default encoding
/// variants.
pub fn solve(ins: &Mrcpsp, encoding: EncodingKind, search: SearchOptions) -> SolveReport {
    let cfg = Config {
        encoding,
        search,
        compute_ub: true,
        ..Config::default()
    };
    controller::solve(ins, &cfg, &mut NullLog).expect("solving failed")
}

/// Solves from an explicit upper bound instead of the greedy one, so the
/// optimizer has to descend through the window itself.
pub fn solve_bounded(
    ins: &Mrcpsp,
    encoding: EncodingKind,
    search: SearchOptions,
    ub: i32,
) -> SolveReport {
    let cfg = Config {
        encoding,
        search,
        compute_ub: false,
        upper_bound: Some(ub),
        ..Config::default()
    };
    controller::solve(ins, &cfg, &mut NullLog).expect("solving failed")
}

pub fn search(strategy: OptStrategy, use_assumptions: bool, narrow_bounds: bool) -> SearchOptions {
    SearchOptions {
        strategy,
        use_assumptions,
        narrow_bounds,
        ..SearchOptions::default()
    }
}

/// Scenario of a single activity whose short mode is barred by the
/// nonrenewable budget; optimum 5 in mode 1.
pub fn budget_forces_slow_mode() -> Mrcpsp {
    let mut ins = Mrcpsp::new(1, vec![], vec![3]);
    ins.add_mode(1, 3, vec![4]);
    ins.add_mode(1, 5, vec![2]);
    ins.preprocess().expect("feasible instance")
}

/// Two activities in a chain, no resources; optimum 5.
pub fn chain() -> Mrcpsp {
    let mut ins = Mrcpsp::new(2, vec![], vec![]);
    ins.add_mode(1, 2, vec![]);
    ins.add_mode(2, 3, vec![]);
    ins.add_precedence(1, 2);
    ins.preprocess().expect("feasible instance")
}

/// Three activities on one renewable resource of capacity 2, one of them
/// multi-mode; optimum 5 (activity 1 must take its long, light mode).
pub fn multi_mode_contention() -> Mrcpsp {
    let mut ins = Mrcpsp::new(3, vec![2], vec![]);
    ins.add_mode(1, 2, vec![2]);
    ins.add_mode(1, 4, vec![1]);
    ins.add_mode(2, 3, vec![1]);
    ins.add_mode(3, 1, vec![2]);
    ins.add_precedence(1, 3);
    ins.preprocess().expect("feasible instance")
}
