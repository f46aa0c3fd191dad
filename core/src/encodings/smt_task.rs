//! # Task-Indexed SMT Encoding
//!
//! Same semantics as the time-indexed encoding with a different geometry:
//! one pulse `x(i,t)` per activity and time, with modes collapsed into
//! duration classes `smd(i,d)` for the linking constraints. Mode-resolved
//! process variables `xm(i,t,g)` are only materialized for the renewable
//! resource constraints, where the demand depends on the exact mode.

use itertools::Itertools;

use crate::encodings::{
    int_start_vars, mode_vars, modes_from_model, nonrenewable_amo_pbs, renewable_amo_pbs,
};
use crate::formula::{Literal, SmtFormula};
use crate::instance::Mrcpsp;
use crate::options::EncodingConfig;
use crate::types::{Model, Schedule};

#[derive(Debug)]
pub struct SmtTask<'a> {
    ins: &'a Mrcpsp,
    cfg: EncodingConfig,
    omt: bool,
}

impl<'a> SmtTask<'a> {
    pub fn new(ins: &'a Mrcpsp, cfg: EncodingConfig, omt: bool) -> Self {
        SmtTask { ins, cfg, omt }
    }

    /// Distinct durations of an activity, ascending.
    fn duration_classes(&self, i: usize) -> Vec<i32> {
        (0..self.ins.n_modes(i))
            .map(|g| self.ins.duration(i, g))
            .sorted_unstable()
            .dedup()
            .collect()
    }

    pub fn encode(&self, lb: i32, ub: i32) -> SmtFormula {
        let ins = self.ins;
        let sink = ins.sink();
        let mut f = SmtFormula::new();

        mode_vars(&mut f, ins);

        // duration-class selectors: smd(i,d) <-> OR of sm(i,g) with dur d
        for i in 1..=ins.n_activities() {
            for d in self.duration_classes(i) {
                let smd = f.new_bool_var("smd", (i as i32, d));
                let class: Vec<Literal> = (0..ins.n_modes(i))
                    .filter(|&g| ins.duration(i, g) == d)
                    .map(|g| f.bvar("sm", (i as i32, g as i32)).pos())
                    .collect();
                for &sm in &class {
                    f.add_clause([!sm, smd.pos()]);
                }
                let mut clause = vec![smd.neg()];
                clause.extend(class);
                f.add_clause(clause);
            }
        }

        for i in 1..=ins.n_activities() {
            for t in ins.es(i)..ins.lc(i, ub) {
                let _ = f.new_bool_var("x", (i as i32, t));
            }
            if ins.n_renewable() > 0 {
                for g in 0..ins.n_modes(i) {
                    for t in ins.es(i)..ins.lc(i, ub) {
                        let _ = f.new_bool_var("xm", (i as i32, t, g as i32));
                    }
                }
            }
        }

        let starts = int_start_vars(&mut f, ins, lb, ub);
        if self.omt {
            f.minimize(starts[sink]);
        }

        // pulse linking: x(i,t) <-> S(i) <= t & (chosen duration reaches t)
        for i in 1..=ins.n_activities() {
            let s = starts[i];
            let durs = self.duration_classes(i);
            for t in ins.es(i)..ins.lc(i, ub) {
                let x = f.bvar("x", (i as i32, t));
                f.add_clause([x.neg(), Literal::le(s, t)]);
                for &d in &durs {
                    let smd = f.bvar("smd", (i as i32, d));
                    f.add_clause([x.neg(), smd.neg(), Literal::ge(s, t - d + 1)]);
                    f.add_clause([
                        x.pos(),
                        Literal::ge(s, t + 1),
                        Literal::le(s, t - d),
                        smd.neg(),
                    ]);
                }
            }
        }

        // mode-resolved process variables: xm(i,t,g) <-> x(i,t) & sm(i,g)
        if ins.n_renewable() > 0 {
            for i in 1..=ins.n_activities() {
                for g in 0..ins.n_modes(i) {
                    let sm = f.bvar("sm", (i as i32, g as i32));
                    for t in ins.es(i)..ins.lc(i, ub) {
                        let x = f.bvar("x", (i as i32, t));
                        let xm = f.bvar("xm", (i as i32, t, g as i32));
                        f.add_clause([xm.neg(), x.pos()]);
                        f.add_clause([xm.neg(), sm.pos()]);
                        f.add_clause([xm.pos(), x.neg(), sm.neg()]);
                    }
                }
            }
        }

        // extended precedences and duration-class direct precedences
        for i in 0..=sink {
            for j in 0..=sink {
                if ins.is_pred(i, j) {
                    f.add_clause([Literal::diff_ge(
                        starts[j],
                        starts[i],
                        ins.ext_prec(i, j),
                    )]);
                }
            }
            if i >= 1 && i <= ins.n_activities() {
                for &j in ins.successors(i) {
                    let min = ins.min_duration(i);
                    for d in self.duration_classes(i) {
                        if d > min {
                            let smd = f.bvar("smd", (i as i32, d));
                            f.add_clause([smd.neg(), Literal::diff_ge(starts[j], starts[i], d)]);
                        }
                    }
                }
            }
        }

        renewable_amo_pbs(&mut f, ins, ub, &self.cfg, |f, i, t, g| {
            f.bvar("xm", (i as i32, t, g as i32)).pos()
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
                let x = f.bvar("x", (i as i32, t));
                f.add_clause([x.neg()]);
            }
        }
        true
    }

    pub fn assume_bounds(&self, f: &SmtFormula, lb: i32, ub: i32) -> Vec<Literal> {
        let s = f.ivar("S", self.ins.sink() as i32);
        vec![Literal::le(s, ub), Literal::ge(s, lb)]
    }
}
