//! # CNF Lowering
//!
//! Translates a formula into clauses over solver literals. Boolean variables
//! map one to one; integer variables are lowered by the same order-encoding
//! idea the Boolean encodings use themselves: one monotone literal per
//! candidate value, with bounds harvested from the unit bound clauses every
//! encoding posts. AMO groups and (AMO-)PB constraints go through the
//! rustsat encodings selected in the configuration.

use rustsat::encodings::am1::{self, Encode as _};
use rustsat::encodings::pb::{self, BoundUpper};
use rustsat::instances::{BasicVarManager, Cnf, ManageVars};
use rustsat::types::{Clause as CnfClause, Lit};

use crate::formula::{AmoPbConstr, Clause, IntAtom, IntVar, Literal, Objective, SmtFormula};
use crate::options::{AmoEncoding, PbEncoding};
use crate::types::Model;
use crate::Error;

/// A formula literal mapped into the solver's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MappedLit {
    Lit(Lit),
    True,
    False,
}

/// Order-encoded domain of one integer variable.
#[derive(Debug, Clone)]
struct IntDomain {
    lo: i32,
    hi: i32,
    /// `lits[k]` holds iff the variable is at most `lo + k`; empty for
    /// singleton domains
    lits: Vec<Lit>,
}

impl IntDomain {
    fn le(&self, c: i32) -> MappedLit {
        if c >= self.hi {
            MappedLit::True
        } else if c < self.lo {
            MappedLit::False
        } else {
            MappedLit::Lit(self.lits[(c - self.lo) as usize])
        }
    }
}

/// Objective of a loaded formula, in solver literals.
#[derive(Debug, Clone)]
pub(crate) enum LoweredObjective {
    Int(IntVar),
    Pb(Vec<(usize, Lit)>),
}

/// Lowering state kept across incremental submissions of one formula.
#[derive(Debug)]
pub(crate) struct Lowering {
    pub(crate) vm: BasicVarManager,
    bmap: Vec<Lit>,
    ints: Vec<IntDomain>,
    amo: AmoEncoding,
    n_clauses: usize,
    pub(crate) objective: Option<LoweredObjective>,
}

impl Lowering {
    /// Lowers a complete formula; returns the state and the clauses to
    /// submit.
    pub(crate) fn new(f: &SmtFormula, amo: AmoEncoding) -> Result<(Lowering, Cnf), Error> {
        let mut vm = BasicVarManager::default();
        let bmap: Vec<Lit> = (0..f.n_bool_vars()).map(|_| vm.new_var().pos_lit()).collect();

        let mut cnf = Cnf::new();
        let ints = harvest_domains(f, &mut vm, &mut cnf)?;

        let mut low = Lowering {
            vm,
            bmap,
            ints,
            amo,
            n_clauses: 0,
            objective: None,
        };
        for clause in f.clauses() {
            low.lower_clause(clause, &mut cnf)?;
        }
        low.n_clauses = f.clauses().len();
        for group in f.amos() {
            low.lower_amo(group, &mut cnf)?;
        }
        for pb in f.pbs() {
            low.lower_pb(&pb.coefs, &pb.lits, pb.bound, pb.enc, &mut cnf)?;
        }
        for amo_pb in f.amo_pbs() {
            low.lower_amo_pb(amo_pb, &mut cnf)?;
        }
        low.objective = low.lower_objective(f, &mut cnf)?;
        Ok((low, cnf))
    }

    /// Lowers the clauses appended since the last submission. Bound
    /// narrowing only adds clauses over existing variables.
    pub(crate) fn delta(&mut self, f: &SmtFormula) -> Result<Cnf, Error> {
        if f.n_bool_vars() != self.bmap.len() || f.n_int_vars() != self.ints.len() {
            return Err(Error::Encoding(
                "narrowed formula introduced new variables".into(),
            ));
        }
        let mut cnf = Cnf::new();
        for clause in &f.clauses()[self.n_clauses..] {
            self.lower_clause(clause, &mut cnf)?;
        }
        self.n_clauses = f.clauses().len();
        Ok(cnf)
    }

    /// Maps a literal that must not expand into several clauses (assumption
    /// positions).
    pub(crate) fn map_assumption(&self, lit: Literal) -> Result<MappedLit, Error> {
        match lit {
            Literal::Bool(var, polarity) => {
                let l = self.bmap[var.0 as usize];
                Ok(MappedLit::Lit(if polarity { l } else { !l }))
            }
            Literal::Const(true) => Ok(MappedLit::True),
            Literal::Const(false) => Ok(MappedLit::False),
            Literal::Int(IntAtom::Le(v, c)) => Ok(self.ints[v.0 as usize].le(c)),
            Literal::Int(IntAtom::Ge(v, c)) => Ok(negate(self.ints[v.0 as usize].le(c - 1))),
            Literal::Int(IntAtom::DiffGe(..)) => Err(Error::Encoding(
                "difference literals cannot be used as assumptions".into(),
            )),
        }
    }

    /// Reads a full model back through a literal valuation.
    pub(crate) fn extract_model(
        &self,
        mut value_of: impl FnMut(Lit) -> Result<bool, Error>,
    ) -> Result<Model, Error> {
        let mut bools = Vec::with_capacity(self.bmap.len());
        for &lit in &self.bmap {
            bools.push(value_of(lit)?);
        }
        let mut ints = Vec::with_capacity(self.ints.len());
        for dom in &self.ints {
            let mut val = dom.hi;
            for (k, &lit) in dom.lits.iter().enumerate() {
                if value_of(lit)? {
                    val = dom.lo + k as i32;
                    break;
                }
            }
            ints.push(val);
        }
        Ok(Model { bools, ints })
    }

    /// Value of an integer variable in an extracted model.
    pub(crate) fn int_value(&self, model: &Model, var: IntVar) -> i32 {
        model.ints[var.0 as usize]
    }

    /// Smallest representable value of an integer variable.
    pub(crate) fn int_lo(&self, var: IntVar) -> i32 {
        self.ints[var.0 as usize].lo
    }

    /// Assumption literal forcing `var <= c`.
    pub(crate) fn int_le_lit(&self, var: IntVar, c: i32) -> MappedLit {
        self.ints[var.0 as usize].le(c)
    }

    /// Number of solver variables allocated by the lowering.
    pub(crate) fn n_solver_vars(&self) -> usize {
        self.vm.max_var().map_or(0, |v| v.idx() + 1)
    }

    fn lower_clause(&self, clause: &Clause, out: &mut Cnf) -> Result<(), Error> {
        let mut base: Vec<Lit> = Vec::with_capacity(clause.lits.len());
        let mut diffs: Vec<(IntVar, IntVar, i32)> = Vec::new();
        for &lit in &clause.lits {
            match lit {
                Literal::Int(IntAtom::DiffGe(u, v, c)) => diffs.push((u, v, c)),
                lit => match self.map_assumption(lit)? {
                    MappedLit::True => return Ok(()),
                    MappedLit::False => (),
                    MappedLit::Lit(l) => base.push(l),
                },
            }
        }
        self.expand_diffs(&mut base, &diffs, out);
        Ok(())
    }

    /// `C | (u - v >= c)` becomes, for every `t` in the domain of `v`,
    /// `C | v <= t-1 | u >= t+c`. Several difference literals in one clause
    /// distribute as the product of their expansions.
    fn expand_diffs(&self, base: &mut Vec<Lit>, diffs: &[(IntVar, IntVar, i32)], out: &mut Cnf) {
        let Some(&(u, v, c)) = diffs.first() else {
            out.add_clause(CnfClause::from_iter(base.iter().copied()));
            return;
        };
        let dom = &self.ints[v.0 as usize];
        for t in dom.lo..=dom.hi {
            let started = dom.le(t - 1);
            let reached = negate(self.ints[u.0 as usize].le(t + c - 1));
            if started == MappedLit::True || reached == MappedLit::True {
                continue;
            }
            let len = base.len();
            if let MappedLit::Lit(l) = started {
                base.push(l);
            }
            if let MappedLit::Lit(l) = reached {
                base.push(l);
            }
            self.expand_diffs(base, &diffs[1..], out);
            base.truncate(len);
        }
    }

    fn lower_amo(&mut self, group: &[Literal], out: &mut Cnf) -> Result<(), Error> {
        let mut lits = Vec::with_capacity(group.len());
        let mut n_true = 0usize;
        for &lit in group {
            match self.map_assumption(lit)? {
                MappedLit::True => n_true += 1,
                MappedLit::False => (),
                MappedLit::Lit(l) => lits.push(l),
            }
        }
        if n_true > 1 {
            out.add_clause(CnfClause::default());
            return Ok(());
        }
        if n_true == 1 {
            for l in lits {
                out.add_clause(CnfClause::from_iter([!l]));
            }
            return Ok(());
        }
        if lits.len() <= 1 {
            return Ok(());
        }
        let oom = match self.amo {
            AmoEncoding::Pairwise => {
                let mut enc: am1::Pairwise = lits.into_iter().collect();
                enc.encode(out, &mut self.vm)
            }
            AmoEncoding::Ladder => {
                let mut enc: am1::Ladder = lits.into_iter().collect();
                enc.encode(out, &mut self.vm)
            }
            AmoEncoding::Commander => {
                let mut enc: am1::Commander = lits.into_iter().collect();
                enc.encode(out, &mut self.vm)
            }
            AmoEncoding::Bimander => {
                let mut enc: am1::Bimander = lits.into_iter().collect();
                enc.encode(out, &mut self.vm)
            }
        };
        oom.map_err(Error::backend)
    }

    fn lower_pb(
        &mut self,
        coefs: &[usize],
        lits: &[Literal],
        bound: usize,
        enc: PbEncoding,
        out: &mut Cnf,
    ) -> Result<(), Error> {
        let mut pairs: Vec<(Lit, usize)> = Vec::with_capacity(lits.len());
        let mut bound = bound as i64;
        for (&q, &lit) in coefs.iter().zip(lits) {
            if q == 0 {
                continue;
            }
            match self.map_assumption(lit)? {
                MappedLit::True => bound -= q as i64,
                MappedLit::False => (),
                MappedLit::Lit(l) => pairs.push((l, q)),
            }
        }
        if bound < 0 {
            out.add_clause(CnfClause::default());
            return Ok(());
        }
        let bound = bound as usize;
        let total: usize = pairs.iter().map(|&(_, q)| q).sum();
        if total <= bound {
            return Ok(());
        }
        match enc {
            PbEncoding::Gte => self.encode_pb::<pb::GeneralizedTotalizer>(pairs, bound, out),
            PbEncoding::Gpw => self.encode_pb::<pb::DynamicPolyWatchdog>(pairs, bound, out),
            PbEncoding::Adder => self.encode_pb::<pb::BinaryAdder>(pairs, bound, out),
        }
    }

    fn encode_pb<PBE>(
        &mut self,
        pairs: Vec<(Lit, usize)>,
        bound: usize,
        out: &mut Cnf,
    ) -> Result<(), Error>
    where
        PBE: BoundUpper + FromIterator<(Lit, usize)>,
    {
        let mut enc: PBE = pairs.into_iter().collect();
        enc.encode_ub(bound..=bound, out, &mut self.vm)
            .map_err(Error::backend)?;
        for unit in enc.enforce_ub(bound).map_err(Error::backend)? {
            out.add_clause(CnfClause::from_iter([unit]));
        }
        Ok(())
    }

    /// AMO-PB: one AMO per group plus the linear bound over all groups.
    fn lower_amo_pb(&mut self, constr: &AmoPbConstr, out: &mut Cnf) -> Result<(), Error> {
        let mut coefs = Vec::new();
        let mut lits = Vec::new();
        for (group_coefs, group_lits) in &constr.groups {
            self.lower_amo(group_lits, out)?;
            coefs.extend_from_slice(group_coefs);
            lits.extend_from_slice(group_lits);
        }
        self.lower_pb(&coefs, &lits, constr.bound, constr.enc, out)
    }

    /// Resolves the optimization directive: an explicit objective wins, a
    /// soft-clause set is turned into unit-weight relaxation terms.
    fn lower_objective(
        &mut self,
        f: &SmtFormula,
        out: &mut Cnf,
    ) -> Result<Option<LoweredObjective>, Error> {
        match f.objective() {
            Some(Objective::Int(var)) => return Ok(Some(LoweredObjective::Int(*var))),
            Some(Objective::Pb(terms)) => {
                let mut lowered = Vec::with_capacity(terms.len());
                for &(w, lit) in terms {
                    match self.map_assumption(lit)? {
                        MappedLit::True | MappedLit::False => (),
                        MappedLit::Lit(l) => lowered.push((w, l)),
                    }
                }
                return Ok(Some(LoweredObjective::Pb(lowered)));
            }
            None => (),
        }
        if f.soft_clauses().is_empty() {
            return Ok(None);
        }
        let mut terms = Vec::with_capacity(f.soft_clauses().len());
        for soft in f.soft_clauses() {
            match &soft.lits[..] {
                [lit] => match self.map_assumption(*lit)? {
                    MappedLit::True | MappedLit::False => (),
                    MappedLit::Lit(l) => terms.push((1, !l)),
                },
                lits => {
                    let relax = self.vm.new_var().pos_lit();
                    let mut clause = vec![relax];
                    for &lit in lits {
                        match self.map_assumption(lit)? {
                            MappedLit::True => (),
                            MappedLit::False => (),
                            MappedLit::Lit(l) => clause.push(l),
                        }
                    }
                    out.add_clause(CnfClause::from_iter(clause));
                    terms.push((1, relax));
                }
            }
        }
        Ok(Some(LoweredObjective::Pb(terms)))
    }
}

fn negate(lit: MappedLit) -> MappedLit {
    match lit {
        MappedLit::Lit(l) => MappedLit::Lit(!l),
        MappedLit::True => MappedLit::False,
        MappedLit::False => MappedLit::True,
    }
}

/// Scans the unit bound clauses of a formula, builds one order-encoded
/// domain per integer variable and posts the monotonicity chain.
fn harvest_domains(
    f: &SmtFormula,
    vm: &mut BasicVarManager,
    cnf: &mut Cnf,
) -> Result<Vec<IntDomain>, Error> {
    let n = f.n_int_vars();
    let mut lows = vec![None; n];
    let mut highs = vec![None; n];
    for clause in f.clauses() {
        if clause.lits.len() != 1 {
            continue;
        }
        let Literal::Int(atom) = clause.lits[0] else {
            continue;
        };
        match atom {
            IntAtom::Ge(v, c) => {
                let lo = &mut lows[v.0 as usize];
                *lo = Some(lo.map_or(c, |prev: i32| prev.max(c)));
            }
            IntAtom::Le(v, c) => {
                let hi = &mut highs[v.0 as usize];
                *hi = Some(hi.map_or(c, |prev: i32| prev.min(c)));
            }
            IntAtom::DiffGe(..) => (),
        }
    }
    let mut domains = Vec::with_capacity(n);
    for (idx, (lo, hi)) in lows.into_iter().zip(highs).enumerate() {
        let (Some(lo), Some(hi)) = (lo, hi) else {
            return Err(Error::Encoding(format!(
                "integer variable {} has no finite bounds",
                f.int_name(IntVar(idx as u32))
            )));
        };
        if hi < lo {
            // contradictory bounds; the formula is unsatisfiable
            cnf.add_clause(CnfClause::default());
            domains.push(IntDomain {
                lo,
                hi: lo,
                lits: Vec::new(),
            });
            continue;
        }
        let lits: Vec<Lit> = (lo..hi).map(|_| vm.new_var().pos_lit()).collect();
        for window in lits.windows(2) {
            cnf.add_clause(CnfClause::from_iter([!window[0], window[1]]));
        }
        domains.push(IntDomain { lo, hi, lits });
    }
    Ok(domains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::SmtFormula;

    fn bounded_var(f: &mut SmtFormula, name: &'static str, lo: i32, hi: i32) -> IntVar {
        let v = f.new_int_var(name, 0);
        f.add_clause([Literal::ge(v, lo)]);
        f.add_clause([Literal::le(v, hi)]);
        v
    }

    #[test]
    fn domains_from_unit_bounds() {
        let mut f = SmtFormula::new();
        let v = bounded_var(&mut f, "S", 2, 5);
        // a tighter unit wins
        f.add_clause([Literal::le(v, 4)]);
        let (low, _) = Lowering::new(&f, AmoEncoding::Pairwise).unwrap();
        assert_eq!(low.int_lo(v), 2);
        assert_eq!(low.ints[0].hi, 4);
        assert_eq!(low.ints[0].lits.len(), 2);
    }

    #[test]
    fn unbounded_int_is_rejected() {
        let mut f = SmtFormula::new();
        let v = f.new_int_var("S", 0);
        f.add_clause([Literal::ge(v, 0)]);
        assert!(matches!(
            Lowering::new(&f, AmoEncoding::Pairwise),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn out_of_domain_atoms_become_constants() {
        let mut f = SmtFormula::new();
        let v = bounded_var(&mut f, "S", 0, 3);
        let (low, _) = Lowering::new(&f, AmoEncoding::Pairwise).unwrap();
        assert_eq!(low.map_assumption(Literal::le(v, 5)).unwrap(), MappedLit::True);
        assert_eq!(
            low.map_assumption(Literal::le(v, -1)).unwrap(),
            MappedLit::False
        );
        assert_eq!(low.map_assumption(Literal::ge(v, 0)).unwrap(), MappedLit::True);
        assert!(matches!(
            low.map_assumption(Literal::le(v, 1)).unwrap(),
            MappedLit::Lit(_)
        ));
    }

    #[test]
    fn trivial_pb_is_dropped() {
        let mut f = SmtFormula::new();
        let x = f.new_bool_var("x", 0);
        let y = f.new_bool_var("x", 1);
        f.add_pb(
            vec![1, 1],
            vec![x.pos(), y.pos()],
            2,
            crate::options::PbEncoding::Gte,
            None,
        );
        let (_, cnf) = Lowering::new(&f, AmoEncoding::Pairwise).unwrap();
        assert_eq!(cnf.len(), 0);
    }
}
