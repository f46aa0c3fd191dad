//! # Formula Emission
//!
//! Serializes a formula for an external decision procedure instead of
//! solving it in process. Formulas with integer variables print as an
//! SMT-LIB script with linear integer arithmetic; pure-Boolean formulas
//! lower to CNF and print as DIMACS, or as new-format WCNF when soft
//! clauses are present. Output is deterministic for a given formula.

use std::io::Write;

use rustsat::types::Lit;

use crate::backend::lower::{Lowering, MappedLit};
use crate::formula::{Clause, IntAtom, Literal, Objective, SmtFormula};
use crate::options::AmoEncoding;
use crate::Error;

/// Writes the formula in the dialect its content permits: SMT-LIB when
/// integer variables are present, WCNF for soft-clause objectives, OPB for
/// a pseudo-Boolean objective, DIMACS otherwise.
pub fn write_formula(f: &SmtFormula, w: &mut impl Write) -> Result<(), Error> {
    if f.n_int_vars() > 0 {
        write_smtlib(f, w).map_err(Error::backend)
    } else if !f.soft_clauses().is_empty() {
        write_wcnf(f, w)
    } else if matches!(f.objective(), Some(Objective::Pb(terms)) if !terms.is_empty()) {
        write_opb(f, w).map_err(Error::backend)
    } else {
        write_dimacs(f, w)
    }
}

fn smt_bool(f: &SmtFormula, lit: Literal) -> String {
    match lit {
        Literal::Bool(var, true) => f.bool_name(var),
        Literal::Bool(var, false) => format!("(not {})", f.bool_name(var)),
        Literal::Const(true) => "true".into(),
        Literal::Const(false) => "false".into(),
        Literal::Int(IntAtom::Le(v, c)) => format!("(<= {} {c})", f.int_name(v)),
        Literal::Int(IntAtom::Ge(v, c)) => format!("(>= {} {c})", f.int_name(v)),
        Literal::Int(IntAtom::DiffGe(u, v, c)) => {
            format!("(>= (- {} {}) {c})", f.int_name(u), f.int_name(v))
        }
    }
}

fn smt_clause(f: &SmtFormula, clause: &Clause) -> String {
    match clause.lits[..] {
        [] => "false".into(),
        [lit] => smt_bool(f, lit),
        _ => {
            let parts: Vec<String> = clause.lits.iter().map(|&l| smt_bool(f, l)).collect();
            format!("(or {})", parts.join(" "))
        }
    }
}

fn smt_sum(f: &SmtFormula, coefs: &[usize], lits: &[Literal]) -> String {
    let terms: Vec<String> = coefs
        .iter()
        .zip(lits)
        .map(|(&q, &l)| format!("(ite {} {q} 0)", smt_bool(f, l)))
        .collect();
    if terms.len() == 1 {
        terms.into_iter().next().expect("one term")
    } else {
        format!("(+ {})", terms.join(" "))
    }
}

fn write_smtlib(f: &SmtFormula, w: &mut impl Write) -> std::io::Result<()> {
    let optimizing = f.objective().is_some() || !f.soft_clauses().is_empty();
    writeln!(w, "(set-logic QF_LIA)")?;
    for idx in 0..f.n_bool_vars() {
        let name = f.bool_name(crate::formula::BoolVar(idx as u32));
        writeln!(w, "(declare-fun {name} () Bool)")?;
    }
    for idx in 0..f.n_int_vars() {
        let name = f.int_name(crate::formula::IntVar(idx as u32));
        writeln!(w, "(declare-fun {name} () Int)")?;
    }
    for clause in f.clauses() {
        writeln!(w, "(assert {})", smt_clause(f, clause))?;
    }
    for group in f.amos() {
        let ones = vec![1; group.len()];
        writeln!(w, "(assert (<= {} 1))", smt_sum(f, &ones, group))?;
    }
    for pb in f.pbs() {
        if let Some(label) = &pb.label {
            writeln!(w, "; {label}")?;
        }
        writeln!(
            w,
            "(assert (<= {} {}))",
            smt_sum(f, &pb.coefs, &pb.lits),
            pb.bound
        )?;
    }
    for amo_pb in f.amo_pbs() {
        if let Some(label) = &amo_pb.label {
            writeln!(w, "; {label}")?;
        }
        let mut coefs = Vec::new();
        let mut lits = Vec::new();
        for (group_coefs, group_lits) in &amo_pb.groups {
            let ones = vec![1; group_lits.len()];
            writeln!(w, "(assert (<= {} 1))", smt_sum(f, &ones, group_lits))?;
            coefs.extend_from_slice(group_coefs);
            lits.extend_from_slice(group_lits);
        }
        writeln!(
            w,
            "(assert (<= {} {}))",
            smt_sum(f, &coefs, &lits),
            amo_pb.bound
        )?;
    }
    for soft in f.soft_clauses() {
        writeln!(w, "(assert-soft {} :weight 1)", smt_clause(f, soft))?;
    }
    match f.objective() {
        Some(Objective::Int(var)) => writeln!(w, "(minimize {})", f.int_name(*var))?,
        Some(Objective::Pb(terms)) => {
            let coefs: Vec<usize> = terms.iter().map(|&(q, _)| q).collect();
            let lits: Vec<Literal> = terms.iter().map(|&(_, l)| l).collect();
            writeln!(w, "(minimize {})", smt_sum(f, &coefs, &lits))?;
        }
        None => (),
    }
    writeln!(w, "(check-sat)")?;
    if optimizing {
        writeln!(w, "(get-objectives)")?;
    }
    writeln!(w, "(exit)")
}

/// Rewrites `sum q * lit` over possibly negated literals into signed terms
/// over plain variables plus a constant: `q * !x = q - q * x`.
fn opb_terms(coefs: &[usize], lits: &[Literal]) -> Result<(Vec<(i64, u32)>, i64), Error> {
    let mut terms = Vec::with_capacity(lits.len());
    let mut constant = 0i64;
    for (&q, &lit) in coefs.iter().zip(lits) {
        match lit {
            Literal::Bool(var, true) => terms.push((q as i64, var.0)),
            Literal::Bool(var, false) => {
                terms.push((-(q as i64), var.0));
                constant += q as i64;
            }
            Literal::Const(true) => constant += q as i64,
            Literal::Const(false) => (),
            Literal::Int(_) => {
                return Err(Error::Encoding(
                    "integer literal in a pseudo-Boolean emission".into(),
                ))
            }
        }
    }
    Ok((terms, constant))
}

fn opb_line(w: &mut impl Write, terms: &[(i64, u32)], rhs: i64) -> std::io::Result<()> {
    for &(coef, var) in terms {
        write!(w, "{coef:+} x{} ", var + 1)?;
    }
    writeln!(w, ">= {rhs} ;")
}

/// One OPB constraint: a clause when `upper` is absent, otherwise
/// `sum <= upper` negated into `>=` form.
fn opb_constraint<W: Write>(
    w: &mut W,
    coefs: &[usize],
    lits: &[Literal],
    upper: Option<usize>,
) -> std::io::Result<()> {
    let (mut terms, constant) =
        opb_terms(coefs, lits).map_err(|e| std::io::Error::other(e.to_string()))?;
    match upper {
        // sum <= K  <=>  -sum >= constant - K
        Some(k) => {
            for term in &mut terms {
                term.0 = -term.0;
            }
            opb_line(w, &terms, constant - k as i64)
        }
        // clause: sum >= 1
        None => opb_line(w, &terms, 1 - constant),
    }
}

/// Prints the formula as an OPB file with a minimization objective. Clauses
/// become `>=` constraints; AMO groups and PB upper bounds are negated into
/// `>=` form.
fn write_opb<W: Write>(f: &SmtFormula, w: &mut W) -> std::io::Result<()> {
    let n_constraints = f.clauses().len()
        + f.amos().len()
        + f.pbs().len()
        + f
            .amo_pbs()
            .iter()
            .map(|c| c.groups.len() + 1)
            .sum::<usize>();
    writeln!(
        w,
        "* #variable= {} #constraint= {}",
        f.n_bool_vars(),
        n_constraints
    )?;
    if let Some(Objective::Pb(obj)) = f.objective() {
        let coefs: Vec<usize> = obj.iter().map(|&(q, _)| q).collect();
        let lits: Vec<Literal> = obj.iter().map(|&(_, l)| l).collect();
        let (terms, _) = opb_terms(&coefs, &lits).map_err(|e| std::io::Error::other(e.to_string()))?;
        write!(w, "min:")?;
        for (coef, var) in terms {
            write!(w, " {coef:+} x{}", var + 1)?;
        }
        writeln!(w, " ;")?;
    }
    for clause in f.clauses() {
        let ones = vec![1; clause.lits.len()];
        opb_constraint(w, &ones, &clause.lits, None)?;
    }
    for group in f.amos() {
        let ones = vec![1; group.len()];
        opb_constraint(w, &ones, group, Some(1))?;
    }
    for pb in f.pbs() {
        opb_constraint(w, &pb.coefs, &pb.lits, Some(pb.bound))?;
    }
    for amo_pb in f.amo_pbs() {
        let mut coefs = Vec::new();
        let mut lits = Vec::new();
        for (group_coefs, group_lits) in &amo_pb.groups {
            let ones = vec![1; group_lits.len()];
            opb_constraint(w, &ones, group_lits, Some(1))?;
            coefs.extend_from_slice(group_coefs);
            lits.extend_from_slice(group_lits);
        }
        opb_constraint(w, &coefs, &lits, Some(amo_pb.bound))?;
    }
    Ok(())
}

fn dimacs_lit(lit: Lit) -> i64 {
    let v = lit.vidx() as i64 + 1;
    if lit.is_pos() {
        v
    } else {
        -v
    }
}

/// Lowers to CNF and prints DIMACS. The AMO groups use the pairwise
/// encoding so that the output does not depend on solver configuration.
fn write_dimacs(f: &SmtFormula, w: &mut impl Write) -> Result<(), Error> {
    let (lowering, cnf) = Lowering::new(f, AmoEncoding::Pairwise)?;
    writeln!(w, "p cnf {} {}", lowering.n_solver_vars(), cnf.len()).map_err(Error::backend)?;
    for clause in cnf {
        for &lit in clause.iter() {
            write!(w, "{} ", dimacs_lit(lit)).map_err(Error::backend)?;
        }
        writeln!(w, "0").map_err(Error::backend)?;
    }
    Ok(())
}

/// Lowers to CNF and prints new-format WCNF: hard clauses prefixed `h`,
/// soft clauses with their weight.
fn write_wcnf(f: &SmtFormula, w: &mut impl Write) -> Result<(), Error> {
    let (lowering, cnf) = Lowering::new(f, AmoEncoding::Pairwise)?;
    for clause in cnf {
        write!(w, "h ").map_err(Error::backend)?;
        for &lit in clause.iter() {
            write!(w, "{} ", dimacs_lit(lit)).map_err(Error::backend)?;
        }
        writeln!(w, "0").map_err(Error::backend)?;
    }
    'softs: for soft in f.soft_clauses() {
        let mut lits = Vec::with_capacity(soft.lits.len());
        for &lit in &soft.lits {
            match lowering.map_assumption(lit)? {
                MappedLit::Lit(l) => lits.push(l),
                MappedLit::True => continue 'softs,
                MappedLit::False => (),
            }
        }
        write!(w, "1 ").map_err(Error::backend)?;
        for l in lits {
            write!(w, "{} ", dimacs_lit(l)).map_err(Error::backend)?;
        }
        writeln!(w, "0").map_err(Error::backend)?;
    }
    Ok(())
}
