//! # Formula Builder
//!
//! A formula owns a dedup-by-name pool of Boolean and integer variables, a
//! clause vector whose literals may be signed Boolean variables or integer
//! comparisons, and vectors of AMO, PB and AMO-PB constraints. Encodings
//! mutate a fresh formula during `encode`; afterwards the formula only grows
//! through `narrow_bounds` clauses until it is re-encoded from scratch.
//!
//! Constraint stores preserve submission order, so a back end sees a
//! deterministic formula for a fixed instance and configuration.

use std::ops::Not;

use rustsat::types::RsHashMap;

use crate::options::PbEncoding;
use crate::types::Model;

/// Handle of a Boolean variable, indexing the formula's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoolVar(pub(crate) u32);

/// Handle of an integer variable, indexing the formula's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntVar(pub(crate) u32);

impl BoolVar {
    /// The positive literal of this variable.
    pub fn pos(self) -> Literal {
        Literal::Bool(self, true)
    }

    /// The negative literal of this variable.
    pub fn neg(self) -> Literal {
        Literal::Bool(self, false)
    }
}

/// An integer comparison usable as a clause literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntAtom {
    /// `var <= c`
    Le(IntVar, i32),
    /// `var >= c`
    Ge(IntVar, i32),
    /// `lhs - rhs >= c`
    DiffGe(IntVar, IntVar, i32),
}

/// A literal: a signed Boolean variable, an integer comparison, or a
/// constant (which stands in for out-of-window variables).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    /// Boolean variable with polarity (`true` = positive)
    Bool(BoolVar, bool),
    /// Integer comparison
    Int(IntAtom),
    /// Constant truth value
    Const(bool),
}

impl Literal {
    /// `var <= c`
    pub fn le(var: IntVar, c: i32) -> Literal {
        Literal::Int(IntAtom::Le(var, c))
    }

    /// `var >= c`
    pub fn ge(var: IntVar, c: i32) -> Literal {
        Literal::Int(IntAtom::Ge(var, c))
    }

    /// `lhs - rhs >= c`
    pub fn diff_ge(lhs: IntVar, rhs: IntVar, c: i32) -> Literal {
        Literal::Int(IntAtom::DiffGe(lhs, rhs, c))
    }
}

impl From<BoolVar> for Literal {
    fn from(var: BoolVar) -> Literal {
        var.pos()
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        match self {
            Literal::Bool(var, polarity) => Literal::Bool(var, !polarity),
            Literal::Const(val) => Literal::Const(!val),
            Literal::Int(IntAtom::Le(var, c)) => Literal::Int(IntAtom::Ge(var, c + 1)),
            Literal::Int(IntAtom::Ge(var, c)) => Literal::Int(IntAtom::Le(var, c - 1)),
            // not(a - b >= c)  <=>  b - a >= 1 - c
            Literal::Int(IntAtom::DiffGe(lhs, rhs, c)) => {
                Literal::Int(IntAtom::DiffGe(rhs, lhs, 1 - c))
            }
        }
    }
}

/// A disjunction of literals. An empty clause makes the formula
/// unsatisfiable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clause {
    pub lits: Vec<Literal>,
}

/// A pseudo-Boolean constraint `sum q_i * x_i <= bound`.
#[derive(Debug, Clone)]
pub struct PbConstr {
    pub coefs: Vec<usize>,
    pub lits: Vec<Literal>,
    pub bound: usize,
    /// Encoding variant, dispatched on by the back end
    pub enc: PbEncoding,
    /// Naming scope for auxiliary variables of this constraint
    pub label: Option<String>,
}

/// An AMO-PB constraint: within each group at most one literal is true, and
/// the weighted sum over all groups is bounded.
#[derive(Debug, Clone)]
pub struct AmoPbConstr {
    /// Disjoint groups of `(coefficients, literals)`
    pub groups: Vec<(Vec<usize>, Vec<Literal>)>,
    pub bound: usize,
    pub enc: PbEncoding,
    pub label: Option<String>,
}

/// Optimization directive of a formula.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize an integer variable
    Int(IntVar),
    /// Minimize a weighted sum of literals
    Pb(Vec<(usize, Literal)>),
}

/// Registry key: base name plus up to three integer indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VarKey {
    name: &'static str,
    arity: u8,
    idx: [i32; 3],
}

/// Index tuple of a variable name; implemented for `()`, `i32`, and pairs
/// and triples thereof.
pub trait VarIdx {
    fn key(self, name: &'static str) -> VarKey;
}

impl VarIdx for () {
    fn key(self, name: &'static str) -> VarKey {
        VarKey {
            name,
            arity: 0,
            idx: [0; 3],
        }
    }
}

impl VarIdx for i32 {
    fn key(self, name: &'static str) -> VarKey {
        VarKey {
            name,
            arity: 1,
            idx: [self, 0, 0],
        }
    }
}

impl VarIdx for (i32, i32) {
    fn key(self, name: &'static str) -> VarKey {
        VarKey {
            name,
            arity: 2,
            idx: [self.0, self.1, 0],
        }
    }
}

impl VarIdx for (i32, i32, i32) {
    fn key(self, name: &'static str) -> VarKey {
        VarKey {
            name,
            arity: 3,
            idx: [self.0, self.1, self.2],
        }
    }
}

/// The formula under construction.
#[derive(Debug, Default)]
pub struct SmtFormula {
    bool_keys: Vec<VarKey>,
    int_keys: Vec<VarKey>,
    bool_index: RsHashMap<VarKey, BoolVar>,
    int_index: RsHashMap<VarKey, IntVar>,
    clauses: Vec<Clause>,
    amos: Vec<Vec<Literal>>,
    pbs: Vec<PbConstr>,
    amo_pbs: Vec<AmoPbConstr>,
    objective: Option<Objective>,
    soft_clauses: Vec<Clause>,
}

impl SmtFormula {
    pub fn new() -> SmtFormula {
        SmtFormula::default()
    }

    /// Creates the Boolean variable `name(idx...)`, or returns the existing
    /// one.
    pub fn new_bool_var(&mut self, name: &'static str, idx: impl VarIdx) -> BoolVar {
        let key = idx.key(name);
        if let Some(&var) = self.bool_index.get(&key) {
            return var;
        }
        let var = BoolVar(self.bool_keys.len() as u32);
        self.bool_keys.push(key);
        self.bool_index.insert(key, var);
        var
    }

    /// Retrieves the existing Boolean variable `name(idx...)`.
    ///
    /// # Panics
    ///
    /// When the variable was never created; encodings only look up names
    /// they created, so a miss is a programming error.
    pub fn bvar(&self, name: &'static str, idx: impl VarIdx) -> BoolVar {
        let key = idx.key(name);
        *self
            .bool_index
            .get(&key)
            .unwrap_or_else(|| panic!("unknown Boolean variable {name}{:?}", &key.idx[..key.arity as usize]))
    }

    /// Creates the integer variable `name(idx...)`, or returns the existing
    /// one.
    pub fn new_int_var(&mut self, name: &'static str, idx: impl VarIdx) -> IntVar {
        let key = idx.key(name);
        if let Some(&var) = self.int_index.get(&key) {
            return var;
        }
        let var = IntVar(self.int_keys.len() as u32);
        self.int_keys.push(key);
        self.int_index.insert(key, var);
        var
    }

    /// Retrieves the existing integer variable `name(idx...)`.
    ///
    /// # Panics
    ///
    /// When the variable was never created.
    pub fn ivar(&self, name: &'static str, idx: impl VarIdx) -> IntVar {
        let key = idx.key(name);
        *self
            .int_index
            .get(&key)
            .unwrap_or_else(|| panic!("unknown integer variable {name}{:?}", &key.idx[..key.arity as usize]))
    }

    /// Adds a disjunction. Constant-true literals drop the clause,
    /// constant-false literals drop out of it.
    pub fn add_clause(&mut self, lits: impl IntoIterator<Item = Literal>) {
        let mut clause = Vec::new();
        for lit in lits {
            match lit {
                Literal::Const(true) => return,
                Literal::Const(false) => (),
                lit => clause.push(lit),
            }
        }
        self.clauses.push(Clause { lits: clause });
    }

    /// Adds the empty clause, making the formula unsatisfiable.
    pub fn add_empty_clause(&mut self) {
        self.clauses.push(Clause::default());
    }

    /// Exactly-one over the given variables: an at-least-one clause plus an
    /// AMO group.
    pub fn add_eo(&mut self, vars: &[BoolVar]) {
        self.add_clause(vars.iter().map(|v| v.pos()));
        self.amos.push(vars.iter().map(|v| v.pos()).collect());
    }

    /// Adds `sum coefs * lits <= bound`.
    pub fn add_pb(
        &mut self,
        coefs: Vec<usize>,
        lits: Vec<Literal>,
        bound: usize,
        enc: PbEncoding,
        label: Option<String>,
    ) {
        debug_assert_eq!(coefs.len(), lits.len());
        self.pbs.push(PbConstr {
            coefs,
            lits,
            bound,
            enc,
            label,
        });
    }

    /// Adds an AMO-PB constraint over disjoint `(coefficients, literals)`
    /// groups.
    pub fn add_amo_pb(
        &mut self,
        groups: Vec<(Vec<usize>, Vec<Literal>)>,
        bound: usize,
        enc: PbEncoding,
        label: Option<String>,
    ) {
        debug_assert!(groups.iter().all(|(q, x)| q.len() == x.len()));
        self.amo_pbs.push(AmoPbConstr {
            groups,
            bound,
            enc,
            label,
        });
    }

    /// Emits a directive to minimize an integer variable.
    pub fn minimize(&mut self, var: IntVar) {
        self.objective = Some(Objective::Int(var));
    }

    /// Emits a directive to minimize a weighted sum of literals.
    pub fn minimize_pb(&mut self, terms: Vec<(usize, Literal)>) {
        self.objective = Some(Objective::Pb(terms));
    }

    /// Adds a unit-weight soft clause.
    pub fn add_soft_clause(&mut self, lits: impl IntoIterator<Item = Literal>) {
        let mut clause = Vec::new();
        for lit in lits {
            match lit {
                Literal::Const(true) => return,
                Literal::Const(false) => (),
                lit => clause.push(lit),
            }
        }
        self.soft_clauses.push(Clause { lits: clause });
    }

    pub fn n_bool_vars(&self) -> usize {
        self.bool_keys.len()
    }

    pub fn n_int_vars(&self) -> usize {
        self.int_keys.len()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn amos(&self) -> &[Vec<Literal>] {
        &self.amos
    }

    pub fn pbs(&self) -> &[PbConstr] {
        &self.pbs
    }

    pub fn amo_pbs(&self) -> &[AmoPbConstr] {
        &self.amo_pbs
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    pub fn soft_clauses(&self) -> &[Clause] {
        &self.soft_clauses
    }

    /// Printable name of a Boolean variable, used by the file emitters.
    pub(crate) fn bool_name(&self, var: BoolVar) -> String {
        key_name(&self.bool_keys[var.0 as usize])
    }

    /// Printable name of an integer variable, used by the file emitters.
    pub(crate) fn int_name(&self, var: IntVar) -> String {
        key_name(&self.int_keys[var.0 as usize])
    }

    /// Projects the value of a Boolean variable out of a model.
    pub fn get_b_value(&self, var: BoolVar, model: &Model) -> bool {
        model.bools[var.0 as usize]
    }

    /// Projects the value of an integer variable out of a model.
    pub fn get_i_value(&self, var: IntVar, model: &Model) -> i32 {
        model.ints[var.0 as usize]
    }
}

fn key_name(key: &VarKey) -> String {
    let mut name = key.name.to_owned();
    for d in 0..key.arity as usize {
        name.push('_');
        name.push_str(&key.idx[d].to_string());
    }
    name
}

/// Sorts coefficient/literal pairs by decreasing coefficient, keeping the
/// pairing intact. Applied before PB emission to stabilize solver behavior.
pub fn sort_coefs_decreasing(coefs: &mut [usize], lits: &mut [Literal]) {
    let mut perm: Vec<usize> = (0..coefs.len()).collect();
    perm.sort_by_key(|&k| std::cmp::Reverse(coefs[k]));
    let sorted_q: Vec<usize> = perm.iter().map(|&k| coefs[k]).collect();
    let sorted_x: Vec<Literal> = perm.iter().map(|&k| lits[k]).collect();
    coefs.copy_from_slice(&sorted_q);
    lits.copy_from_slice(&sorted_x);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_idempotent() {
        let mut f = SmtFormula::new();
        let x = f.new_bool_var("x", (1, 2, 0));
        assert_eq!(f.new_bool_var("x", (1, 2, 0)), x);
        assert_ne!(f.new_bool_var("x", (1, 3, 0)), x);
        assert_eq!(f.bvar("x", (1, 2, 0)), x);
        assert_eq!(f.n_bool_vars(), 2);

        let s = f.new_int_var("S", 4);
        assert_eq!(f.ivar("S", 4), s);
        // same indices under a different name is a different variable
        let x2 = f.new_bool_var("y", (1, 2, 0));
        assert_ne!(x2, x);
    }

    #[test]
    #[should_panic(expected = "unknown Boolean variable")]
    fn lookup_of_missing_variable_panics() {
        let f = SmtFormula::new();
        let _ = f.bvar("x", 0);
    }

    #[test]
    fn constants_simplify_clauses() {
        let mut f = SmtFormula::new();
        let x = f.new_bool_var("x", 0);
        f.add_clause([x.pos(), Literal::Const(false)]);
        f.add_clause([x.neg(), Literal::Const(true)]);
        assert_eq!(f.clauses().len(), 1);
        assert_eq!(f.clauses()[0].lits, vec![x.pos()]);
    }

    #[test]
    fn literal_negation() {
        let mut f = SmtFormula::new();
        let x = f.new_bool_var("x", 0);
        let s = f.new_int_var("S", 0);
        let t = f.new_int_var("S", 1);
        assert_eq!(!x.pos(), x.neg());
        assert_eq!(!Literal::le(s, 3), Literal::ge(s, 4));
        assert_eq!(!Literal::ge(s, 3), Literal::le(s, 2));
        assert_eq!(!Literal::diff_ge(s, t, 2), Literal::diff_ge(t, s, -1));
    }

    #[test]
    fn eo_posts_alo_and_amo() {
        let mut f = SmtFormula::new();
        let vars: Vec<BoolVar> = (0..3).map(|g| f.new_bool_var("sm", (1, g))).collect();
        f.add_eo(&vars);
        assert_eq!(f.clauses().len(), 1);
        assert_eq!(f.clauses()[0].lits.len(), 3);
        assert_eq!(f.amos().len(), 1);
    }

    #[test]
    fn coefficient_sorting_keeps_pairs() {
        let mut f = SmtFormula::new();
        let lits: Vec<Literal> = (0..3).map(|i| f.new_bool_var("x", i).pos()).collect();
        let mut coefs = vec![1, 5, 3];
        let mut sorted = lits.clone();
        sort_coefs_decreasing(&mut coefs, &mut sorted);
        assert_eq!(coefs, vec![5, 3, 1]);
        assert_eq!(sorted, vec![lits[1], lits[2], lits[0]]);
    }
}
