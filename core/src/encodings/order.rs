//! # Order Encoding
//!
//! Monotone Boolean variables `s(i,t)` ("activity `i` has started by `t`")
//! replace the integer start variables; everything else is Boolean as well,
//! so the formula is pure SAT.

use crate::encodings::{
    mode_vars, nonrenewable_amo_pbs, order_assume, order_lower_bound, order_narrow,
    order_precedences, order_process_vars, order_set_model, order_start_vars, renewable_amo_pbs,
};
use crate::formula::{Literal, SmtFormula};
use crate::instance::Mrcpsp;
use crate::options::EncodingConfig;
use crate::types::{Model, Schedule};

#[derive(Debug)]
pub struct Order<'a> {
    ins: &'a Mrcpsp,
    cfg: EncodingConfig,
}

impl<'a> Order<'a> {
    pub fn new(ins: &'a Mrcpsp, cfg: EncodingConfig) -> Self {
        Order { ins, cfg }
    }

    /// Builds the shared core of the order family. Returns the formula and
    /// whether the windows were non-empty (on an empty window the formula
    /// already carries the empty clause).
    pub(crate) fn encode_core(
        ins: &Mrcpsp,
        cfg: &EncodingConfig,
        lb: i32,
        ub: i32,
    ) -> (SmtFormula, bool) {
        let mut f = SmtFormula::new();
        mode_vars(&mut f, ins);
        if !order_start_vars(&mut f, ins, ub) {
            f.add_empty_clause();
            return (f, false);
        }
        order_lower_bound(&mut f, ins, ub, lb);
        order_process_vars(&mut f, ins, ub);
        order_precedences(&mut f, ins, ub);
        renewable_amo_pbs(&mut f, ins, ub, cfg, |f, i, t, g| {
            f.bvar("x", (i as i32, t, g as i32)).pos()
        });
        nonrenewable_amo_pbs(&mut f, ins, cfg);
        (f, true)
    }

    pub fn encode(&self, lb: i32, ub: i32) -> SmtFormula {
        Self::encode_core(self.ins, &self.cfg, lb, ub).0
    }

    pub fn set_model(&self, f: &SmtFormula, _lb: i32, ub: i32, model: &Model) -> Schedule {
        order_set_model(f, self.ins, ub, model)
    }

    pub fn narrow_bounds(
        &self,
        f: &mut SmtFormula,
        _last_lb: i32,
        last_ub: i32,
        lb: i32,
        ub: i32,
    ) -> bool {
        order_narrow(f, self.ins, last_ub, lb, ub)
    }

    pub fn assume_bounds(&self, f: &SmtFormula, enc_ub: i32, lb: i32, ub: i32) -> Vec<Literal> {
        order_assume(f, self.ins, enc_ub, lb, ub)
    }
}
