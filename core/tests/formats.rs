//! Instance files through the full pipeline, plus formula emission and the
//! DIMACS round trip.

mod common;

use std::path::Path;

use common::{search, solve};
use mrcpsp2smt_core::backend::file::write_formula;
use mrcpsp2smt_core::encodings::MrcpspEncoding;
use mrcpsp2smt_core::types::OptStatus;
use mrcpsp2smt_core::{parsing, EncodingKind, OptStrategy};
use rustsat::instances::SatInstance;
use rustsat::solvers::{Solve, SolverResult};

#[test]
fn rcp_file_solves_to_its_chain_length() {
    let ins = parsing::parse_instance(Path::new("tests/data/chain.rcp"))
        .unwrap()
        .preprocess()
        .unwrap();
    let report = solve(&ins, EncodingKind::Order, search(OptStrategy::LinearUb, false, false));
    assert_eq!(report.status, OptStatus::Optimum);
    assert_eq!(report.best.expect("optimum").0, 5);
}

#[test]
fn mm_file_solves_with_mode_selection() {
    let ins = parsing::parse_instance(Path::new("tests/data/contention.mm"))
        .unwrap()
        .preprocess()
        .unwrap();
    let report = solve(&ins, EncodingKind::SmtTime, search(OptStrategy::LinearUb, false, false));
    assert_eq!(report.status, OptStatus::Optimum);
    let (makespan, sched) = report.best.expect("optimum");
    assert_eq!(makespan, 5);
    assert_eq!(sched.modes[1], 1);
    ins.validate(&sched).unwrap();
}

#[test]
fn data_file_respects_the_budget() {
    let ins = parsing::parse_instance(Path::new("tests/data/budget.data"))
        .unwrap()
        .preprocess()
        .unwrap();
    let report = solve(&ins, EncodingKind::SmtTask, search(OptStrategy::LinearUb, false, false));
    assert_eq!(report.best.expect("optimum").0, 5);
}

#[test]
fn prb_file_round_trip() {
    let ins = parsing::parse_instance(Path::new("tests/data/two.prb"))
        .unwrap()
        .preprocess()
        .unwrap();
    let report = solve(&ins, EncodingKind::DoubleOrder, search(OptStrategy::LinearUb, false, false));
    assert_eq!(report.best.expect("optimum").0, 6);
}

#[test]
fn smtlib_emission_is_deterministic() {
    let ins = parsing::parse_instance(Path::new("tests/data/contention.mm"))
        .unwrap()
        .preprocess()
        .unwrap();
    let enc = MrcpspEncoding::new(EncodingKind::SmtTime, &ins, Default::default(), true);
    let f = enc.encode(5, 8);
    let mut first = Vec::new();
    write_formula(&f, &mut first).unwrap();
    let mut second = Vec::new();
    write_formula(&f, &mut second).unwrap();
    assert_eq!(first, second);
    let text = String::from_utf8(first).unwrap();
    assert!(text.starts_with("(set-logic QF_LIA)"));
    assert!(text.contains("(declare-fun S_0 () Int)"));
    assert!(text.contains("(declare-fun sm_1_0 () Bool)"));
    assert!(text.contains("(minimize S_4)"));
    assert!(text.contains("(check-sat)"));
}

/// Serializing the lowered formula and re-parsing it preserves
/// satisfiability.
#[test]
fn dimacs_round_trip_is_equisatisfiable() {
    let ins = parsing::parse_instance(Path::new("tests/data/chain.rcp"))
        .unwrap()
        .preprocess()
        .unwrap();
    let enc = MrcpspEncoding::new(EncodingKind::Order, &ins, Default::default(), false);
    let dir = tempfile::tempdir().unwrap();
    for (lb, ub, expected) in [(5, 7, SolverResult::Sat), (5, 4, SolverResult::Unsat)] {
        let f = enc.encode(lb, ub);
        let mut out = Vec::new();
        write_formula(&f, &mut out).unwrap();
        let path = dir.path().join(format!("chain-{lb}-{ub}.cnf"));
        std::fs::write(&path, &out).unwrap();
        let parsed: SatInstance = SatInstance::from_dimacs_path(&path).unwrap();
        let (cnf, _) = parsed.into_cnf();
        let mut oracle = rustsat_batsat::BasicSolver::default();
        oracle.add_cnf(cnf).unwrap();
        assert_eq!(oracle.solve().unwrap(), expected);
    }
}

#[test]
fn opb_emission_for_pb_objectives() {
    let ins = parsing::parse_instance(Path::new("tests/data/chain.rcp"))
        .unwrap()
        .preprocess()
        .unwrap();
    let enc = MrcpspEncoding::new(EncodingKind::OmtSatPb, &ins, Default::default(), false);
    let f = enc.encode(5, 8);
    let mut out = Vec::new();
    write_formula(&f, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("* #variable="));
    assert!(text.lines().any(|l| l.starts_with("min:")));
    assert!(text.lines().any(|l| l.ends_with(";")));
}

#[test]
fn wcnf_emission_for_soft_objectives() {
    let ins = parsing::parse_instance(Path::new("tests/data/chain.rcp"))
        .unwrap()
        .preprocess()
        .unwrap();
    let enc = MrcpspEncoding::new(EncodingKind::OmtSoftPb, &ins, Default::default(), false);
    let f = enc.encode(5, 8);
    let mut out = Vec::new();
    write_formula(&f, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.lines().any(|l| l.starts_with("h ")));
    assert!(text.lines().any(|l| l.starts_with("1 ")));
}
