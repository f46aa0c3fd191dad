//! # Time-Indexed SMT Encoding
//!
//! Integer start variables `S(i)` linked to per-mode process variables
//! `x(i,t,g)` that feed the time-indexed resource constraints.

use crate::encodings::{
    int_precedences, int_start_vars, mode_vars, modes_from_model, nonrenewable_amo_pbs,
    renewable_amo_pbs,
};
use crate::formula::{Literal, SmtFormula};
use crate::instance::Mrcpsp;
use crate::options::EncodingConfig;
use crate::types::{Model, Schedule};

#[derive(Debug)]
pub struct SmtTime<'a> {
    ins: &'a Mrcpsp,
    cfg: EncodingConfig,
    omt: bool,
}

impl<'a> SmtTime<'a> {
    pub fn new(ins: &'a Mrcpsp, cfg: EncodingConfig, omt: bool) -> Self {
        SmtTime { ins, cfg, omt }
    }

    pub fn encode(&self, lb: i32, ub: i32) -> SmtFormula {
        let ins = self.ins;
        let sink = ins.sink();
        let mut f = SmtFormula::new();

        mode_vars(&mut f, ins);

        for i in 1..=ins.n_activities() {
            for g in 0..ins.n_modes(i) {
                for t in ins.es(i)..ins.lc(i, ub) {
                    let _ = f.new_bool_var("x", (i as i32, t, g as i32));
                }
            }
        }

        let starts = int_start_vars(&mut f, ins, lb, ub);
        if self.omt {
            f.minimize(starts[sink]);
        }

        // x(i,t,g) <-> S(i) <= t  &  t - dur(i,g) < S(i)  &  sm(i,g)
        for i in 1..=ins.n_activities() {
            let s = starts[i];
            for g in 0..ins.n_modes(i) {
                let dur = ins.duration(i, g);
                let sm = f.bvar("sm", (i as i32, g as i32));
                for t in ins.es(i)..ins.lc(i, ub) {
                    let x = f.bvar("x", (i as i32, t, g as i32));
                    f.add_clause([x.neg(), Literal::le(s, t)]);
                    f.add_clause([x.neg(), Literal::ge(s, t - dur + 1)]);
                    f.add_clause([x.neg(), sm.pos()]);
                    f.add_clause([
                        x.pos(),
                        Literal::ge(s, t + 1),
                        Literal::le(s, t - dur),
                        sm.neg(),
                    ]);
                }
            }
        }

        int_precedences(&mut f, ins);
        renewable_amo_pbs(&mut f, ins, ub, &self.cfg, |f, i, t, g| {
            f.bvar("x", (i as i32, t, g as i32)).pos()
        });
        nonrenewable_amo_pbs(&mut f, ins, &self.cfg);
        f
    }

    pub fn set_model(&self, f: &SmtFormula, _lb: i32, _ub: i32, model: &Model) -> Schedule {
        let ins = self.ins;
        let starts = (0..=ins.sink())
            .map(|i| f.get_i_value(f.ivar("S", i as i32), model))
            .collect();
        Schedule {
            starts,
            modes: modes_from_model(f, ins, model),
        }
    }

    pub fn narrow_bounds(
        &self,
        f: &mut SmtFormula,
        _last_lb: i32,
        last_ub: i32,
        lb: i32,
        ub: i32,
    ) -> bool {
        if ub > last_ub {
            return false;
        }
        let ins = self.ins;
        let s = f.ivar("S", ins.sink() as i32);
        f.add_clause([Literal::le(s, ub)]);
        f.add_clause([Literal::ge(s, lb)]);
        for i in 1..=ins.n_activities() {
            for t in ins.es(i).max(ins.lc(i, ub))..ins.lc(i, last_ub) {
                for g in 0..ins.n_modes(i) {
                    let x = f.bvar("x", (i as i32, t, g as i32));
                    f.add_clause([x.neg()]);
                }
            }
        }
        true
    }

    pub fn assume_bounds(&self, f: &SmtFormula, lb: i32, ub: i32) -> Vec<Literal> {
        let s = f.ivar("S", self.ins.sink() as i32);
        vec![Literal::le(s, ub), Literal::ge(s, lb)]
    }
}
