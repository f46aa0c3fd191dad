//! # Encoding Strategies
//!
//! The six interchangeable compilations of an instance into a formula. All
//! encodings share one contract: `encode` builds a fresh formula for a bounds
//! window, `set_model` projects a back-end model into a schedule,
//! `narrow_bounds` tightens an existing formula in place when the window
//! shrinks, and `assume_bounds` produces retractable bound literals instead.
//!
//! The encodings agree on the set of feasible schedules, so the optimizer
//! returns the same optimum whichever one is selected.

pub mod double_order;
pub mod omt_pb;
pub mod order;
pub mod smt_task;
pub mod smt_time;

pub use double_order::DoubleOrder;
pub use omt_pb::OmtPb;
pub use order::Order;
pub use smt_task::SmtTask;
pub use smt_time::SmtTime;

use crate::formula::{sort_coefs_decreasing, BoolVar, IntVar, Literal, SmtFormula};
use crate::instance::Mrcpsp;
use crate::options::{EncodingConfig, EncodingKind};
use crate::types::{Model, Schedule};

/// An encoding selected at run time; the optimizer owns it by value.
#[derive(Debug)]
pub enum MrcpspEncoding<'a> {
    SmtTime(SmtTime<'a>),
    SmtTask(SmtTask<'a>),
    Order(Order<'a>),
    DoubleOrder(DoubleOrder<'a>),
    OmtSatPb(OmtPb<'a>),
    OmtSoftPb(OmtPb<'a>),
}

impl<'a> MrcpspEncoding<'a> {
    /// Instantiates the encoding `kind` over a preprocessed instance. `omt`
    /// requests an optimization directive in the formula (native back-end
    /// minimization).
    pub fn new(kind: EncodingKind, ins: &'a Mrcpsp, cfg: EncodingConfig, omt: bool) -> Self {
        match kind {
            EncodingKind::SmtTime => MrcpspEncoding::SmtTime(SmtTime::new(ins, cfg, omt)),
            EncodingKind::SmtTask => MrcpspEncoding::SmtTask(SmtTask::new(ins, cfg, omt)),
            EncodingKind::Order => MrcpspEncoding::Order(Order::new(ins, cfg)),
            EncodingKind::DoubleOrder => MrcpspEncoding::DoubleOrder(DoubleOrder::new(ins, cfg)),
            EncodingKind::OmtSatPb => MrcpspEncoding::OmtSatPb(OmtPb::hard(ins, cfg)),
            EncodingKind::OmtSoftPb => MrcpspEncoding::OmtSoftPb(OmtPb::soft(ins, cfg)),
        }
    }

    /// Compiles the instance into a fresh formula for makespans in
    /// `[lb, ub]`.
    pub fn encode(&self, lb: i32, ub: i32) -> SmtFormula {
        match self {
            MrcpspEncoding::SmtTime(e) => e.encode(lb, ub),
            MrcpspEncoding::SmtTask(e) => e.encode(lb, ub),
            MrcpspEncoding::Order(e) => e.encode(lb, ub),
            MrcpspEncoding::DoubleOrder(e) => e.encode(lb, ub),
            MrcpspEncoding::OmtSatPb(e) | MrcpspEncoding::OmtSoftPb(e) => e.encode(lb, ub),
        }
    }

    /// Projects a model of a formula encoded with bounds `[lb, ub]` into
    /// start times and modes.
    pub fn set_model(&self, f: &SmtFormula, lb: i32, ub: i32, model: &Model) -> Schedule {
        match self {
            MrcpspEncoding::SmtTime(e) => e.set_model(f, lb, ub, model),
            MrcpspEncoding::SmtTask(e) => e.set_model(f, lb, ub, model),
            MrcpspEncoding::Order(e) => e.set_model(f, lb, ub, model),
            MrcpspEncoding::DoubleOrder(e) => e.set_model(f, lb, ub, model),
            MrcpspEncoding::OmtSatPb(e) | MrcpspEncoding::OmtSoftPb(e) => {
                e.set_model(f, lb, ub, model)
            }
        }
    }

    /// Mutates the formula to reflect tighter bounds. Returns false when the
    /// formula cannot be reused and must be re-encoded.
    pub fn narrow_bounds(
        &self,
        f: &mut SmtFormula,
        last_lb: i32,
        last_ub: i32,
        lb: i32,
        ub: i32,
    ) -> bool {
        match self {
            MrcpspEncoding::SmtTime(e) => e.narrow_bounds(f, last_lb, last_ub, lb, ub),
            MrcpspEncoding::SmtTask(e) => e.narrow_bounds(f, last_lb, last_ub, lb, ub),
            MrcpspEncoding::Order(e) => e.narrow_bounds(f, last_lb, last_ub, lb, ub),
            MrcpspEncoding::DoubleOrder(e) => e.narrow_bounds(f, last_lb, last_ub, lb, ub),
            MrcpspEncoding::OmtSatPb(e) | MrcpspEncoding::OmtSoftPb(e) => {
                e.narrow_bounds(f, last_lb, last_ub, lb, ub)
            }
        }
    }

    /// Temporary bound literals for the solver instead of permanent clauses.
    /// `enc_ub` is the upper bound the formula was encoded with.
    pub fn assume_bounds(&self, f: &SmtFormula, enc_ub: i32, lb: i32, ub: i32) -> Vec<Literal> {
        match self {
            MrcpspEncoding::SmtTime(e) => e.assume_bounds(f, lb, ub),
            MrcpspEncoding::SmtTask(e) => e.assume_bounds(f, lb, ub),
            MrcpspEncoding::Order(e) => e.assume_bounds(f, enc_ub, lb, ub),
            MrcpspEncoding::DoubleOrder(e) => e.assume_bounds(f, enc_ub, lb, ub),
            MrcpspEncoding::OmtSatPb(e) | MrcpspEncoding::OmtSoftPb(e) => {
                e.assume_bounds(f, enc_ub, lb, ub)
            }
        }
    }
}

// ===== helpers shared across the encoding family =====

/// Creates the mode selector variables `sm(i,g)` with an exactly-one
/// constraint per activity.
pub(crate) fn mode_vars(f: &mut SmtFormula, ins: &Mrcpsp) {
    for i in 0..=ins.sink() {
        let vars: Vec<BoolVar> = (0..ins.n_modes(i))
            .map(|g| f.new_bool_var("sm", (i as i32, g as i32)))
            .collect();
        f.add_eo(&vars);
    }
}

/// Reads the chosen mode of every activity out of a model.
pub(crate) fn modes_from_model(f: &SmtFormula, ins: &Mrcpsp, model: &Model) -> Vec<usize> {
    (0..=ins.sink())
        .map(|i| {
            (0..ins.n_modes(i))
                .find(|&g| f.get_b_value(f.bvar("sm", (i as i32, g as i32)), model))
                .unwrap_or(0)
        })
        .collect()
}

/// Sorts each AMO-PB group by decreasing coefficient and the groups by their
/// leading coefficient.
pub(crate) fn sort_amo_pb_groups(groups: &mut [(Vec<usize>, Vec<Literal>)]) {
    for (coefs, lits) in groups.iter_mut() {
        sort_coefs_decreasing(coefs, lits);
    }
    groups.sort_by_key(|(coefs, _)| std::cmp::Reverse(coefs.first().copied().unwrap_or(0)));
}

/// Posts the renewable resource constraints: for every resource and time
/// point, the activities whose window covers the point are partitioned into
/// precedence chains (at most one of a chain runs at a time) and bounded by
/// an AMO-PB. `lit_at` supplies the process literal of `(i, t, g)`.
pub(crate) fn renewable_amo_pbs(
    f: &mut SmtFormula,
    ins: &Mrcpsp,
    ub: i32,
    cfg: &EncodingConfig,
    lit_at: impl Fn(&SmtFormula, usize, i32, usize) -> Literal,
) {
    for r in 0..ins.n_renewable() {
        for t in 0..ub {
            let tasks: Vec<usize> = (1..=ins.n_activities())
                .filter(|&i| t >= ins.es(i) && t < ins.lc(i, ub))
                .collect();
            if tasks.is_empty() {
                continue;
            }
            let mut groups = Vec::new();
            for chain in ins.compute_min_path_cover(&tasks) {
                let mut coefs = Vec::new();
                let mut lits = Vec::new();
                for i in chain {
                    for g in 0..ins.n_modes(i) {
                        let q = ins.demand(i, r, g);
                        if q != 0 {
                            coefs.push(q as usize);
                            lits.push(lit_at(f, i, t, g));
                        }
                    }
                }
                if !coefs.is_empty() {
                    groups.push((coefs, lits));
                }
            }
            if groups.is_empty() {
                continue;
            }
            sort_amo_pb_groups(&mut groups);
            f.add_amo_pb(
                groups,
                ins.capacity(r) as usize,
                cfg.amopb,
                Some(format!("R_{r}_{t}")),
            );
        }
    }
}

/// Posts one global AMO-PB per nonrenewable resource over the mode
/// selectors.
pub(crate) fn nonrenewable_amo_pbs(f: &mut SmtFormula, ins: &Mrcpsp, cfg: &EncodingConfig) {
    for r in ins.n_renewable()..ins.n_resources() {
        let mut groups = Vec::new();
        for j in 1..=ins.n_activities() {
            let mut coefs = Vec::new();
            let mut lits = Vec::new();
            for g in 0..ins.n_modes(j) {
                let q = ins.demand(j, r, g);
                if q != 0 {
                    coefs.push(q as usize);
                    lits.push(f.bvar("sm", (j as i32, g as i32)).pos());
                }
            }
            if !coefs.is_empty() {
                groups.push((coefs, lits));
            }
        }
        if groups.is_empty() {
            continue;
        }
        sort_amo_pb_groups(&mut groups);
        f.add_amo_pb(
            groups,
            ins.capacity(r) as usize,
            cfg.amopb,
            Some(format!("N_{r}")),
        );
    }
}

// ===== integer-start helpers (SMT flavors) =====

/// Creates the start-time integer variables with their window bounds, pins
/// the source to 0 and the sink into `[lb, ub]`.
pub(crate) fn int_start_vars(f: &mut SmtFormula, ins: &Mrcpsp, lb: i32, ub: i32) -> Vec<IntVar> {
    let sink = ins.sink();
    let starts: Vec<IntVar> = (0..=sink)
        .map(|i| f.new_int_var("S", i as i32))
        .collect();
    for (i, &s) in starts.iter().enumerate().take(sink).skip(1) {
        f.add_clause([Literal::ge(s, ins.es(i))]);
        f.add_clause([Literal::le(s, ins.ls(i, ub))]);
    }
    f.add_clause([Literal::ge(starts[0], 0)]);
    f.add_clause([Literal::le(starts[0], 0)]);
    f.add_clause([Literal::ge(starts[sink], lb.max(ins.es(sink)))]);
    f.add_clause([Literal::le(starts[sink], ub)]);
    starts
}

/// Extended precedence constraints `S(j) - S(i) >= lag` plus the per-mode
/// direct precedences that are stronger than the extended lag.
pub(crate) fn int_precedences(f: &mut SmtFormula, ins: &Mrcpsp) {
    let sink = ins.sink();
    for i in 0..=sink {
        for j in 0..=sink {
            if ins.is_pred(i, j) {
                let si = f.ivar("S", i as i32);
                let sj = f.ivar("S", j as i32);
                f.add_clause([Literal::diff_ge(sj, si, ins.ext_prec(i, j))]);
            }
        }
        for &j in ins.successors(i) {
            let min = ins.min_duration(i);
            for g in 0..ins.n_modes(i) {
                if ins.duration(i, g) > min {
                    let si = f.ivar("S", i as i32);
                    let sj = f.ivar("S", j as i32);
                    let sm = f.bvar("sm", (i as i32, g as i32));
                    f.add_clause([sm.neg(), Literal::diff_ge(sj, si, ins.duration(i, g))]);
                }
            }
        }
    }
}

// ===== order-encoding helpers =====

/// Order literal "activity `i` has started by time `t`"; constant outside
/// the start window.
pub(crate) fn slit(f: &SmtFormula, ins: &Mrcpsp, ub: i32, i: usize, t: i32) -> Literal {
    if t < ins.es(i) {
        Literal::Const(false)
    } else if t > ins.ls(i, ub) {
        Literal::Const(true)
    } else {
        f.bvar("s", (i as i32, t)).pos()
    }
}

/// Creates the order variables `s(i,t)` with monotonicity clauses and
/// anchors. Returns false when some start window is empty, in which case the
/// caller emits the empty clause.
pub(crate) fn order_start_vars(f: &mut SmtFormula, ins: &Mrcpsp, ub: i32) -> bool {
    for i in 0..=ins.sink() {
        let es = ins.es(i);
        let ls = ins.ls(i, ub);
        if es > ls {
            return false;
        }
        for t in es..=ls {
            let s = f.new_bool_var("s", (i as i32, t));
            if t > es {
                let prev = f.bvar("s", (i as i32, t - 1));
                f.add_clause([prev.neg(), s.pos()]);
            }
        }
        // started for sure at the latest start
        f.add_clause([f.bvar("s", (i as i32, ls)).pos()]);
    }
    // the source starts at time 0
    f.add_clause([f.bvar("s", (0, 0)).pos()]);
    true
}

/// Lower bound on the makespan: the sink must not have started before
/// `lb - 1`.
pub(crate) fn order_lower_bound(f: &mut SmtFormula, ins: &Mrcpsp, ub: i32, lb: i32) {
    let lit = slit(f, ins, ub, ins.sink(), lb - 1);
    f.add_clause([!lit]);
}

/// Creates the process variables `x(i,t,g)` and links them to the order
/// variables and mode selectors:
/// `x(i,t,g) <-> s(i,t) & !s(i, t - dur(i,g)) & sm(i,g)`.
pub(crate) fn order_process_vars(f: &mut SmtFormula, ins: &Mrcpsp, ub: i32) {
    for i in 1..=ins.n_activities() {
        for g in 0..ins.n_modes(i) {
            for t in ins.es(i)..ins.lc(i, ub) {
                let _ = f.new_bool_var("x", (i as i32, t, g as i32));
            }
        }
    }
    for i in 1..=ins.n_activities() {
        for g in 0..ins.n_modes(i) {
            let dur = ins.duration(i, g);
            let sm = f.bvar("sm", (i as i32, g as i32));
            for t in ins.es(i)..ins.lc(i, ub) {
                let x = f.bvar("x", (i as i32, t, g as i32));
                let s = slit(f, ins, ub, i, t);
                let s_pre = slit(f, ins, ub, i, t - dur);
                f.add_clause([x.neg(), s]);
                f.add_clause([x.neg(), !s_pre]);
                f.add_clause([x.neg(), sm.pos()]);
                f.add_clause([x.pos(), !s, s_pre, sm.neg()]);
            }
        }
    }
}

/// Precedence clauses over order variables: extended lags for every related
/// pair and mode-guarded direct precedences where a mode's duration exceeds
/// the extended lag.
pub(crate) fn order_precedences(f: &mut SmtFormula, ins: &Mrcpsp, ub: i32) {
    let sink = ins.sink();
    for i in 0..=sink {
        for j in 0..=sink {
            if !ins.is_pred(i, j) {
                continue;
            }
            let lag = ins.ext_prec(i, j);
            let lo = ins.es(i).min(ins.es(j) - lag);
            let hi = ins.ls(i, ub).max(ins.ls(j, ub) - lag);
            for t in lo..=hi {
                let si = slit(f, ins, ub, i, t);
                let sj = slit(f, ins, ub, j, t + lag);
                f.add_clause([si, !sj]);
            }
        }
        for &j in ins.successors(i) {
            for g in 0..ins.n_modes(i) {
                let dur = ins.duration(i, g);
                if dur <= ins.ext_prec(i, j) {
                    continue;
                }
                let sm = f.bvar("sm", (i as i32, g as i32));
                let lo = ins.es(i).min(ins.es(j) - dur);
                let hi = ins.ls(i, ub).max(ins.ls(j, ub) - dur);
                for t in lo..=hi {
                    let si = slit(f, ins, ub, i, t);
                    let sj = slit(f, ins, ub, j, t + dur);
                    f.add_clause([sm.neg(), si, !sj]);
                }
            }
        }
    }
}

/// Projects a model of an order-encoded formula into a schedule.
pub(crate) fn order_set_model(f: &SmtFormula, ins: &Mrcpsp, ub: i32, model: &Model) -> Schedule {
    let modes = modes_from_model(f, ins, model);
    let starts = (0..=ins.sink())
        .map(|i| {
            (ins.es(i)..=ins.ls(i, ub))
                .find(|&t| f.get_b_value(f.bvar("s", (i as i32, t)), model))
                .unwrap_or(ins.ls(i, ub))
        })
        .collect();
    Schedule { starts, modes }
}

/// In-place bound tightening shared by the order family: anchors the sink
/// into the new window and switches off process variables beyond the new
/// latest completions.
pub(crate) fn order_narrow(
    f: &mut SmtFormula,
    ins: &Mrcpsp,
    last_ub: i32,
    lb: i32,
    ub: i32,
) -> bool {
    if ub > last_ub {
        return false;
    }
    let sink = ins.sink();
    if ub < ins.es(sink) {
        f.add_empty_clause();
        return true;
    }
    f.add_clause([f.bvar("s", (sink as i32, ub)).pos()]);
    if lb - 1 >= ins.es(sink) && lb - 1 <= last_ub {
        let s = f.bvar("s", (sink as i32, lb - 1));
        f.add_clause([s.neg()]);
    }
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

/// Assumption literals for the order family; `enc_ub` is the bound the
/// formula was encoded with (its windows are sized for it).
pub(crate) fn order_assume(
    f: &SmtFormula,
    ins: &Mrcpsp,
    enc_ub: i32,
    lb: i32,
    ub: i32,
) -> Vec<Literal> {
    let sink = ins.sink();
    let mut assumps = Vec::new();
    match slit(f, ins, enc_ub, sink, ub) {
        Literal::Const(true) => (),
        lit => assumps.push(lit),
    }
    match slit(f, ins, enc_ub, sink, lb - 1) {
        Literal::Const(false) => (),
        lit => assumps.push(!lit),
    }
    assumps
}
