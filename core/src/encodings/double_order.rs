//! # Double Order Encoding
//!
//! The order encoding extended with pairwise ordering variables `z(i,j)` for
//! activities not related by precedence. The extra structure gives the
//! solver stronger propagation at a quadratic variable cost.

use crate::encodings::order::Order;
use crate::formula::{Literal, SmtFormula};
use crate::instance::Mrcpsp;
use crate::options::EncodingConfig;
use crate::types::{Model, Schedule};

use super::{order_assume, order_narrow, order_set_model, slit};

#[derive(Debug)]
pub struct DoubleOrder<'a> {
    ins: &'a Mrcpsp,
    cfg: EncodingConfig,
}

impl<'a> DoubleOrder<'a> {
    pub fn new(ins: &'a Mrcpsp, cfg: EncodingConfig) -> Self {
        DoubleOrder { ins, cfg }
    }

    pub fn encode(&self, lb: i32, ub: i32) -> SmtFormula {
        let ins = self.ins;
        let (mut f, ok) = Order::encode_core(ins, &self.cfg, lb, ub);
        if !ok {
            return f;
        }

        // z(i,j) <-> AND_t a1(i,j,t) & a2(i,j,t)  with
        //   a1(i,j,t) <-> !s(j,t) | s(i,t)
        //   a2(i,j,t) <->  s(j,t) | !s(i, t - dur + 1)
        for i in 1..=ins.n_activities() {
            for j in 1..=ins.n_activities() {
                if i == j || ins.is_pred(i, j) {
                    continue;
                }
                let dur = ins.min_duration(i);
                let z = f.new_bool_var("z", (i as i32, j as i32));
                let mut reverse = vec![z.pos()];
                for t in ins.es(j)..=ins.ls(j, ub) {
                    let a1 = f.new_bool_var("za", (i as i32, j as i32, t));
                    let a2 = f.new_bool_var("zb", (i as i32, j as i32, t));
                    let si = slit(&f, ins, ub, i, t);
                    let si_pre = slit(&f, ins, ub, i, t - dur + 1);
                    let sj = f.bvar("s", (j as i32, t)).pos();

                    f.add_clause([a1.neg(), !sj, si]);
                    f.add_clause([sj, a1.pos()]);
                    f.add_clause([!si, a1.pos()]);

                    f.add_clause([a2.neg(), sj, !si_pre]);
                    f.add_clause([!sj, a2.pos()]);
                    f.add_clause([si_pre, a2.pos()]);

                    f.add_clause([a1.pos(), z.neg()]);
                    f.add_clause([a2.pos(), z.neg()]);
                    reverse.push(a1.neg());
                    reverse.push(a2.neg());
                }
                f.add_clause(reverse);
            }
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
