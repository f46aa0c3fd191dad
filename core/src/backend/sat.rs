//! # In-Process SAT Driver
//!
//! Drives an incremental SAT oracle over the CNF lowering of a formula. The
//! default oracle is BatSat through its rustsat wrapper; any solver
//! implementing the rustsat incremental traits fits.
//!
//! Native optimization is served by assumption-based descent on the lowered
//! objective: solve, then repeatedly assume a tighter objective bound until
//! the oracle answers unsatisfiable.

use std::time::Duration;

use rustsat::solvers::{Solve, SolveIncremental, SolverResult};
use rustsat::types::{Lit, TernaryVal};

use crate::backend::lower::{LoweredObjective, Lowering, MappedLit};
use crate::backend::Backend;
use crate::formula::Literal;
use crate::types::{CheckResult, Model};
use crate::Error;

/// Back-end driver lowering formulas into an in-process SAT oracle.
#[derive(Debug, Default)]
pub struct SatOracle<O = rustsat_batsat::BasicSolver> {
    oracle: O,
    lowering: Option<Lowering>,
    amo: crate::options::AmoEncoding,
}

impl<O> SatOracle<O>
where
    O: Solve + SolveIncremental + Default,
{
    pub fn new(amo: crate::options::AmoEncoding) -> Self {
        SatOracle {
            oracle: O::default(),
            lowering: None,
            amo,
        }
    }

    fn lowering(&self) -> Result<&Lowering, Error> {
        self.lowering
            .as_ref()
            .ok_or_else(|| Error::Backend("no formula loaded".into()))
    }

    fn value_in_oracle(oracle: &O, lit: Lit) -> Result<bool, Error> {
        oracle
            .lit_val(lit)
            .map(|v| v == TernaryVal::True)
            .map_err(Error::backend)
    }

    fn extract(&self) -> Result<Model, Error> {
        let oracle = &self.oracle;
        self.lowering()?
            .extract_model(|lit| Self::value_in_oracle(oracle, lit))
    }

    fn solve_mapped(&mut self, assumps: &[Lit]) -> Result<SolverResult, Error> {
        if assumps.is_empty() {
            self.oracle.solve().map_err(Error::backend)
        } else {
            self.oracle.solve_assumps(assumps).map_err(Error::backend)
        }
    }

    /// Descent on an integer objective: assume `obj <= value - 1` until
    /// unsatisfiable.
    fn descend_int(&mut self, var: crate::formula::IntVar) -> Result<Model, Error> {
        let mut model = self.extract()?;
        loop {
            let low = self.lowering()?;
            let value = low.int_value(&model, var);
            if value <= low.int_lo(var) {
                return Ok(model);
            }
            let MappedLit::Lit(assump) = low.int_le_lit(var, value - 1) else {
                return Ok(model);
            };
            match self.solve_mapped(&[assump])? {
                SolverResult::Sat => model = self.extract()?,
                SolverResult::Unsat => return Ok(model),
                SolverResult::Interrupted => return Ok(model),
            }
        }
    }

    /// Weight of the objective terms satisfied by the oracle's current
    /// assignment.
    fn term_cost(&self, terms: &[(usize, Lit)]) -> Result<usize, Error> {
        let mut cost = 0;
        for &(w, l) in terms {
            if Self::value_in_oracle(&self.oracle, l)? {
                cost += w;
            }
        }
        Ok(cost)
    }

    /// Descent on a PB objective through an upper-bound encoding built over
    /// the objective terms.
    fn descend_pb(&mut self, terms: Vec<(usize, Lit)>) -> Result<Model, Error> {
        use rustsat::encodings::pb::BoundUpper;

        let mut model = self.extract()?;
        let mut cost = self.term_cost(&terms)?;
        if cost == 0 {
            return Ok(model);
        }
        let mut enc: rustsat::encodings::pb::GeneralizedTotalizer =
            terms.iter().map(|&(w, l)| (l, w)).collect();
        {
            let low = self.lowering.as_mut().expect("formula loaded");
            let mut cnf = rustsat::instances::Cnf::new();
            enc.encode_ub(0..cost, &mut cnf, &mut low.vm)
                .map_err(Error::backend)?;
            self.oracle.add_cnf(cnf).map_err(Error::backend)?;
        }
        while cost > 0 {
            let assumps = enc.enforce_ub(cost - 1).map_err(Error::backend)?;
            match self.solve_mapped(&assumps)? {
                SolverResult::Sat => {
                    model = self.extract()?;
                    cost = self.term_cost(&terms)?;
                }
                SolverResult::Unsat | SolverResult::Interrupted => break,
            }
        }
        Ok(model)
    }
}

impl<O> Backend for SatOracle<O>
where
    O: Solve + SolveIncremental + Default,
{
    fn load(&mut self, f: &crate::formula::SmtFormula) -> Result<(), Error> {
        let (lowering, cnf) = Lowering::new(f, self.amo)?;
        self.oracle = O::default();
        self.oracle.add_cnf(cnf).map_err(Error::backend)?;
        self.lowering = Some(lowering);
        Ok(())
    }

    fn sync(&mut self, f: &crate::formula::SmtFormula) -> Result<(), Error> {
        let lowering = self
            .lowering
            .as_mut()
            .ok_or_else(|| Error::Backend("no formula loaded".into()))?;
        let cnf = lowering.delta(f)?;
        self.oracle.add_cnf(cnf).map_err(Error::backend)
    }

    fn check(
        &mut self,
        assumps: &[Literal],
        _budget: Option<Duration>,
    ) -> Result<CheckResult, Error> {
        let mut mapped = Vec::with_capacity(assumps.len());
        for &lit in assumps {
            match self.lowering()?.map_assumption(lit)? {
                MappedLit::True => (),
                MappedLit::False => return Ok(CheckResult::Unsat),
                MappedLit::Lit(l) => mapped.push(l),
            }
        }
        match self.solve_mapped(&mapped)? {
            SolverResult::Sat => Ok(CheckResult::Sat(self.extract()?)),
            SolverResult::Unsat => Ok(CheckResult::Unsat),
            SolverResult::Interrupted => Ok(CheckResult::Interrupted),
        }
    }

    fn minimize(&mut self, _budget: Option<Duration>) -> Result<Option<Model>, Error> {
        let objective = match &self.lowering()?.objective {
            Some(obj) => obj.clone(),
            None => {
                return Err(Error::Backend(
                    "loaded formula carries no optimization directive".into(),
                ))
            }
        };
        match self.solve_mapped(&[])? {
            SolverResult::Sat => (),
            SolverResult::Unsat => return Ok(None),
            SolverResult::Interrupted => return Ok(None),
        }
        let model = match objective {
            LoweredObjective::Int(var) => self.descend_int(var)?,
            LoweredObjective::Pb(terms) => self.descend_pb(terms)?,
        };
        Ok(Some(model))
    }
}

/// Convenience alias for the bundled pure-Rust oracle.
pub type DefaultOracle = SatOracle<rustsat_batsat::BasicSolver>;
