//! Cross-encoding agreement and bound-cooperation modes: every encoding and
//! every optimizer strategy must report the same optimum, with bounds
//! submitted as clauses or assumptions, narrowed in place or re-encoded.

mod common;

use common::{budget_forces_slow_mode, chain, multi_mode_contention, search, solve, solve_bounded};
use mrcpsp2smt_core::types::OptStatus;
use mrcpsp2smt_core::{EncodingKind, Mrcpsp, OptStrategy};

const ALL_ENCODINGS: [EncodingKind; 6] = [
    EncodingKind::SmtTime,
    EncodingKind::SmtTask,
    EncodingKind::OmtSatPb,
    EncodingKind::OmtSoftPb,
    EncodingKind::Order,
    EncodingKind::DoubleOrder,
];

fn assert_optimum(ins: &Mrcpsp, expected: i32) {
    for encoding in ALL_ENCODINGS {
        for strategy in [
            OptStrategy::LinearUb,
            OptStrategy::LinearLb,
            OptStrategy::Binary,
        ] {
            for (use_assumptions, narrow_bounds) in
                [(false, false), (false, true), (true, false), (true, true)]
            {
                let opts = search(strategy, use_assumptions, narrow_bounds);
                let label = format!(
                    "{encoding:?}/{strategy:?} assumptions={use_assumptions} narrow={narrow_bounds}"
                );
                // once seeded with the greedy bound, once descending from a
                // loose explicit bound
                for report in [
                    solve(ins, encoding, opts),
                    solve_bounded(ins, encoding, opts, expected + 4),
                ] {
                    assert_eq!(report.status, OptStatus::Optimum, "{label}");
                    let (makespan, sched) = report.best.as_ref().expect("optimum schedule");
                    assert_eq!(*makespan, expected, "{label}");
                    ins.validate(sched).unwrap();
                }
            }
        }
    }
}

#[test]
fn encodings_agree_on_a_chain() {
    assert_optimum(&chain(), 5);
}

#[test]
fn encodings_agree_under_a_nonrenewable_budget() {
    assert_optimum(&budget_forces_slow_mode(), 5);
}

#[test]
fn encodings_agree_on_multi_mode_contention() {
    assert_optimum(&multi_mode_contention(), 5);
}

#[test]
fn encodings_agree_on_parallel_machines() {
    // four unit tasks on capacity 2, no precedences: optimum 2
    let mut ins = Mrcpsp::new(4, vec![2], vec![]);
    for i in 1..=4 {
        ins.add_mode(i, 1, vec![1]);
    }
    let ins = ins.preprocess().unwrap();
    assert_optimum(&ins, 2);
}

#[test]
fn native_optimization_matches_the_search_loop() {
    for encoding in [
        EncodingKind::SmtTime,
        EncodingKind::SmtTask,
        EncodingKind::OmtSatPb,
        EncodingKind::OmtSoftPb,
    ] {
        let ins = multi_mode_contention();
        let report = solve(&ins, encoding, search(OptStrategy::Omt, false, false));
        assert_eq!(report.status, OptStatus::Optimum, "{encoding:?}");
        let (makespan, sched) = report.best.expect("optimum schedule");
        assert_eq!(makespan, 5, "{encoding:?}");
        ins.validate(&sched).unwrap();
    }
}

#[test]
fn narrowing_never_needs_more_decider_calls() {
    let ins = multi_mode_contention();
    for encoding in ALL_ENCODINGS {
        let plain = solve_bounded(&ins, encoding, search(OptStrategy::LinearUb, false, false), 9);
        let narrowed =
            solve_bounded(&ins, encoding, search(OptStrategy::LinearUb, false, true), 9);
        assert!(narrowed.stats.n_checks <= plain.stats.n_checks, "{encoding:?}");
        assert!(narrowed.stats.n_encodes <= plain.stats.n_encodes, "{encoding:?}");
        assert_eq!(
            narrowed.best.expect("optimum").0,
            plain.best.expect("optimum").0,
            "{encoding:?}"
        );
    }
}

#[test]
fn narrowed_formula_only_admits_tighter_makespans() {
    use mrcpsp2smt_core::backend::{Backend, SatOracle};
    use mrcpsp2smt_core::encodings::MrcpspEncoding;
    use mrcpsp2smt_core::types::CheckResult;

    let ins = chain();
    let enc = MrcpspEncoding::new(
        EncodingKind::Order,
        &ins,
        Default::default(),
        false,
    );
    let mut f = enc.encode(5, 9);
    // 9 -> 6 must be accepted in place, and every remaining model has to
    // stay within the tightened bound
    assert!(enc.narrow_bounds(&mut f, 5, 9, 5, 6));
    let mut backend: SatOracle = SatOracle::new(Default::default());
    backend.load(&f).unwrap();
    match backend.check(&[], None).unwrap() {
        CheckResult::Sat(model) => {
            let sched = enc.set_model(&f, 5, 6, &model);
            assert!(sched.makespan() <= 6);
            ins.validate(&sched).unwrap();
        }
        other => panic!("expected a schedule, got {other:?}"),
    }
    // widening back is refused, the caller must re-encode
    assert!(!enc.narrow_bounds(&mut f, 5, 6, 5, 8));
}

#[test]
fn assumptions_leave_the_formula_reusable() {
    use mrcpsp2smt_core::backend::{Backend, SatOracle};
    use mrcpsp2smt_core::encodings::MrcpspEncoding;
    use mrcpsp2smt_core::types::CheckResult;

    let ins = chain();
    let enc = MrcpspEncoding::new(
        EncodingKind::SmtTime,
        &ins,
        Default::default(),
        false,
    );
    let f = enc.encode(5, 9);
    let mut backend: SatOracle = SatOracle::new(Default::default());
    backend.load(&f).unwrap();
    // a bound impossible to meet is rejected under assumptions
    let assumps = enc.assume_bounds(&f, 9, 5, 4);
    assert!(matches!(
        backend.check(&assumps, None).unwrap(),
        CheckResult::Unsat
    ));
    // and the untightened formula still answers the original window
    let assumps = enc.assume_bounds(&f, 9, 5, 9);
    assert!(matches!(
        backend.check(&assumps, None).unwrap(),
        CheckResult::Sat(_)
    ));
}
