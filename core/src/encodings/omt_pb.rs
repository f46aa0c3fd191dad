//! # Pure-Boolean OMT Encodings
//!
//! The order-encoding core with an explicit objective over makespan
//! selector literals `u(t) = !s(sink, t-1)` ("the sink has not started by
//! `t-1`", so the makespan is at least `t`). The hard flavor emits a PB
//! bound plus a minimization directive over the selectors; the soft flavor
//! emits one unit-weight soft clause per candidate completion time.

use crate::encodings::order::Order;
use crate::formula::{Literal, SmtFormula};
use crate::instance::Mrcpsp;
use crate::options::EncodingConfig;
use crate::types::{Model, Schedule};

use super::{order_assume, order_narrow, order_set_model, slit};

#[derive(Debug)]
pub struct OmtPb<'a> {
    ins: &'a Mrcpsp,
    cfg: EncodingConfig,
    soft: bool,
}

impl<'a> OmtPb<'a> {
    /// Variant with a hard PB makespan selector and a minimize directive.
    pub fn hard(ins: &'a Mrcpsp, cfg: EncodingConfig) -> Self {
        OmtPb {
            ins,
            cfg,
            soft: false,
        }
    }

    /// Variant with unit-weight soft clauses over "sink started by t".
    pub fn soft(ins: &'a Mrcpsp, cfg: EncodingConfig) -> Self {
        OmtPb {
            ins,
            cfg,
            soft: true,
        }
    }

    pub fn encode(&self, lb: i32, ub: i32) -> SmtFormula {
        let ins = self.ins;
        let sink = ins.sink();
        let (mut f, ok) = Order::encode_core(ins, &self.cfg, lb, ub);
        if !ok {
            return f;
        }

        if self.soft {
            let range = ins.es(sink).max(lb)..ub;
            if range.is_empty() {
                // the window pins the makespan already; leave an empty
                // directive so native optimization degenerates to a check
                f.minimize_pb(Vec::new());
            }
            for t in range {
                let s = f.bvar("s", (sink as i32, t));
                f.add_soft_clause([s.pos()]);
            }
        } else {
            let mut terms = Vec::new();
            let mut committed = 0usize;
            for t in 1..=ub {
                match !slit(&f, ins, ub, sink, t - 1) {
                    Literal::Const(true) => committed += 1,
                    Literal::Const(false) => (),
                    lit => terms.push((1, lit)),
                }
            }
            let coefs = vec![1; terms.len()];
            let lits: Vec<Literal> = terms.iter().map(|&(_, l)| l).collect();
            let bound = (ub as usize).saturating_sub(committed);
            f.add_pb(coefs, lits, bound, self.cfg.pb, Some("makespan".to_owned()));
            f.minimize_pb(terms);
        }
        f
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
