//! End-to-end scenarios over the controller and the bundled oracle.

mod common;

use common::{budget_forces_slow_mode, chain, multi_mode_contention, search, solve};
use mrcpsp2smt_core::controller;
use mrcpsp2smt_core::types::OptStatus;
use mrcpsp2smt_core::{Config, EncodingKind, Error, Mrcpsp, NullLog, OptStrategy};

#[test]
fn dummy_only_instance_has_makespan_zero() {
    let ins = Mrcpsp::new(0, vec![], vec![]).preprocess().unwrap();
    let report = solve(&ins, EncodingKind::SmtTime, search(OptStrategy::LinearUb, false, false));
    assert_eq!(report.status, OptStatus::Optimum);
    let (makespan, _) = report.best.expect("optimum schedule");
    assert_eq!(makespan, 0);
    // the greedy bound already closes the window
    assert_eq!(report.stats.n_checks, 0);
}

#[test]
fn single_activity_runs_for_its_duration() {
    let mut ins = Mrcpsp::new(1, vec![], vec![]);
    ins.add_mode(1, 5, vec![]);
    let ins = ins.preprocess().unwrap();
    let report = solve(&ins, EncodingKind::Order, search(OptStrategy::LinearUb, false, false));
    let (makespan, sched) = report.best.expect("optimum schedule");
    assert_eq!(report.status, OptStatus::Optimum);
    assert_eq!(makespan, 5);
    ins.validate(&sched).unwrap();
}

#[test]
fn nonrenewable_budget_selects_the_slow_mode() {
    let ins = budget_forces_slow_mode();
    for encoding in [EncodingKind::SmtTime, EncodingKind::Order] {
        let report = solve(&ins, encoding, search(OptStrategy::LinearUb, false, false));
        assert_eq!(report.status, OptStatus::Optimum);
        let (makespan, sched) = report.best.expect("optimum schedule");
        assert_eq!(makespan, 5);
        assert_eq!(sched.modes[1], 1);
        ins.validate(&sched).unwrap();
    }
}

#[test]
fn greedy_bound_is_proved_optimal_with_one_unsat_call() {
    // trivial lower bound 3, greedy (and optimal) makespan 5: the single
    // window [3,4] query answers UNSAT and the incumbent wins
    let ins = budget_forces_slow_mode();
    let report = solve(&ins, EncodingKind::SmtTime, search(OptStrategy::LinearUb, false, false));
    assert_eq!(report.status, OptStatus::Optimum);
    assert_eq!(report.best.as_ref().expect("incumbent").0, 5);
    assert_eq!(report.stats.n_checks, 1);
    assert_eq!(report.stats.n_unsat, 1);
}

#[test]
fn precedence_chain_adds_durations() {
    let ins = chain();
    let report = solve(&ins, EncodingKind::SmtTime, search(OptStrategy::LinearUb, false, false));
    let (makespan, sched) = report.best.expect("optimum schedule");
    assert_eq!(makespan, 5);
    assert!(sched.starts[2] >= sched.starts[1] + 2);
    ins.validate(&sched).unwrap();
}

#[test]
fn positive_cycle_is_rejected_before_encoding() {
    let mut ins = Mrcpsp::new(2, vec![], vec![]);
    ins.add_mode(1, 1, vec![]);
    ins.add_mode(2, 1, vec![]);
    ins.add_precedence(1, 2);
    ins.add_precedence(2, 1);
    assert!(matches!(ins.preprocess(), Err(Error::Infeasible(_))));
}

#[test]
fn exhausted_budget_is_unsat_without_any_decider_call() {
    let mut ins = Mrcpsp::new(2, vec![], vec![3]);
    ins.add_mode(1, 1, vec![2]);
    ins.add_mode(2, 1, vec![2]);
    assert!(matches!(ins.preprocess(), Err(Error::Infeasible(_))));
}

#[test]
fn explicit_upper_bound_below_optimum_is_unsat() {
    // optimum 5, trivial lower bound 3: the [3,4] window needs one real
    // decider call to be ruled out
    let ins = budget_forces_slow_mode();
    let cfg = Config {
        encoding: EncodingKind::Order,
        upper_bound: Some(4),
        compute_ub: false,
        ..Config::default()
    };
    let report = controller::solve(&ins, &cfg, &mut NullLog).unwrap();
    assert_eq!(report.status, OptStatus::Unsat);
    assert!(report.best.is_none());
    assert_eq!(report.stats.n_checks, 1);
    assert_eq!(report.stats.n_unsat, 1);
}

#[test]
fn check_strategy_reports_satisfiability_only() {
    let ins = chain();
    let cfg = Config {
        encoding: EncodingKind::SmtTime,
        upper_bound: Some(7),
        compute_ub: false,
        search: search(OptStrategy::Check, false, false),
        ..Config::default()
    };
    let report = controller::solve(&ins, &cfg, &mut NullLog).unwrap();
    assert_eq!(report.status, OptStatus::Sat);
    let (makespan, sched) = report.best.expect("satisfying schedule");
    assert!(makespan <= 7);
    ins.validate(&sched).unwrap();
    assert_eq!(report.stats.n_checks, 1);
}

#[test]
fn multi_mode_contention_optimum() {
    let ins = multi_mode_contention();
    // the energy bound already proves 5, so the first solution closes the
    // search
    assert_eq!(ins.trivial_lb(), 5);
    let report = solve(&ins, EncodingKind::SmtTime, search(OptStrategy::LinearUb, false, false));
    let (makespan, sched) = report.best.expect("optimum schedule");
    assert_eq!(report.status, OptStatus::Optimum);
    assert_eq!(makespan, 5);
    assert_eq!(sched.modes[1], 1);
    ins.validate(&sched).unwrap();
}
