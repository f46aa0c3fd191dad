//! # Instance Model
//!
//! In-memory representation of an MRCPSP instance together with the derived
//! quantities the encodings consume: extended precedences, time windows,
//! energy-based precedence strengthening, the nonrenewable dominance
//! reduction, the greedy schedule heuristic, and the minimum path cover used
//! to group non-concurrent activities.
//!
//! An instance is built incrementally by a parser (or by hand in tests) and
//! then sealed with [`Mrcpsp::preprocess`]. After preprocessing the instance
//! is read-only; encoders borrow it immutably.

use itertools::Itertools;

use crate::types::Schedule;
use crate::Error;

/// Sentinel for "no path" in the extended precedence matrix.
pub const NO_PREC: i32 = i32::MIN;

/// One execution mode of an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    /// Processing time of the activity in this mode
    pub duration: i32,
    /// Demand per resource, renewable resources first
    pub demands: Vec<i32>,
}

/// An MRCPSP instance.
///
/// Activities are indexed `0..=n+1` where `0` is the dummy source and `n+1`
/// the dummy sink, both with a single zero-duration, zero-demand mode.
/// Resources are indexed with the renewable ones first.
#[derive(Debug, Clone)]
pub struct Mrcpsp {
    n: usize,
    n_renewable: usize,
    capacities: Vec<i32>,
    modes: Vec<Vec<Mode>>,
    successors: Vec<Vec<usize>>,
    /// Direct start-to-start lags, including energy-derived ones
    lags: Vec<Vec<i32>>,
    /// All-pairs longest-path matrix over `lags`
    ext_prec: Vec<Vec<i32>>,
}

impl Mrcpsp {
    /// Creates an empty instance with `n` real activities and the given
    /// resource capacities. The two dummy activities are created implicitly.
    pub fn new(n: usize, renewable_caps: Vec<i32>, nonrenewable_caps: Vec<i32>) -> Mrcpsp {
        let n_renewable = renewable_caps.len();
        let mut capacities = renewable_caps;
        capacities.extend(nonrenewable_caps);
        let n_resources = capacities.len();
        let dummy = vec![Mode {
            duration: 0,
            demands: vec![0; n_resources],
        }];
        let mut modes = vec![Vec::new(); n + 2];
        modes[0] = dummy.clone();
        modes[n + 1] = dummy;
        Mrcpsp {
            n,
            n_renewable,
            capacities,
            modes,
            successors: vec![Vec::new(); n + 2],
            lags: Vec::new(),
            ext_prec: Vec::new(),
        }
    }

    /// Adds an execution mode to activity `i`.
    pub fn add_mode(&mut self, i: usize, duration: i32, demands: Vec<i32>) {
        debug_assert!(i >= 1 && i <= self.n, "modes of dummies are fixed");
        self.modes[i].push(Mode { duration, demands });
    }

    /// Records that `j` must start after `i` completes.
    pub fn add_precedence(&mut self, i: usize, j: usize) {
        if !self.successors[i].contains(&j) {
            self.successors[i].push(j);
        }
    }

    /// Number of real activities (excluding the dummies).
    pub fn n_activities(&self) -> usize {
        self.n
    }

    /// Index of the dummy sink activity.
    pub fn sink(&self) -> usize {
        self.n + 1
    }

    pub fn n_resources(&self) -> usize {
        self.capacities.len()
    }

    pub fn n_renewable(&self) -> usize {
        self.n_renewable
    }

    pub fn n_nonrenewable(&self) -> usize {
        self.capacities.len() - self.n_renewable
    }

    /// Per-period capacity (renewable) or global budget (nonrenewable).
    pub fn capacity(&self, r: usize) -> i32 {
        self.capacities[r]
    }

    pub fn n_modes(&self, i: usize) -> usize {
        self.modes[i].len()
    }

    pub fn duration(&self, i: usize, g: usize) -> i32 {
        self.modes[i][g].duration
    }

    pub fn demand(&self, i: usize, r: usize, g: usize) -> i32 {
        self.modes[i][g].demands[r]
    }

    pub fn min_duration(&self, i: usize) -> i32 {
        self.modes[i]
            .iter()
            .map(|m| m.duration)
            .min()
            .unwrap_or(0)
    }

    pub fn max_duration(&self, i: usize) -> i32 {
        self.modes[i]
            .iter()
            .map(|m| m.duration)
            .max()
            .unwrap_or(0)
    }

    pub fn successors(&self, i: usize) -> &[usize] {
        &self.successors[i]
    }

    /// Transitive minimum start-to-start lag from `i` to `j`, or [`NO_PREC`]
    /// when no precedence path exists.
    pub fn ext_prec(&self, i: usize, j: usize) -> i32 {
        self.ext_prec[i][j]
    }

    /// Whether a precedence path from `i` to `j` exists.
    pub fn is_pred(&self, i: usize, j: usize) -> bool {
        i != j && self.ext_prec[i][j] > NO_PREC
    }

    /// Earliest start of `i`.
    pub fn es(&self, i: usize) -> i32 {
        self.ext_prec[0][i].max(0)
    }

    /// Earliest completion of `i`.
    pub fn ec(&self, i: usize) -> i32 {
        self.es(i) + self.min_duration(i)
    }

    /// Latest start of `i` such that the sink can complete by `ub`.
    pub fn ls(&self, i: usize, ub: i32) -> i32 {
        if i == 0 {
            return 0;
        }
        match self.ext_prec[i][self.sink()] {
            NO_PREC => ub,
            lag => ub - lag,
        }
    }

    /// Latest completion of `i` under `ub`.
    pub fn lc(&self, i: usize, ub: i32) -> i32 {
        self.ls(i, ub) + self.max_duration(i)
    }

    /// Critical-path length under minimum durations.
    pub fn trivial_lb(&self) -> i32 {
        self.ext_prec[0][self.sink()].max(0)
    }

    /// Sum of maximum durations; a makespan this long always admits a
    /// resource-feasible left-shifted schedule.
    pub fn horizon(&self) -> i32 {
        (1..=self.n).map(|i| self.max_duration(i)).sum()
    }

    /// Seals the instance: wires the dummies into the precedence graph,
    /// validates the data, computes the extended precedences, strengthens
    /// them with energy reasoning and applies the nonrenewable dominance
    /// reduction.
    pub fn preprocess(mut self) -> Result<Mrcpsp, Error> {
        let n_resources = self.n_resources();
        for i in 1..=self.n {
            if self.modes[i].is_empty() {
                return Err(Error::parse(format!("activity {i} has no modes")));
            }
            for mode in &self.modes[i] {
                if mode.demands.len() != n_resources {
                    return Err(Error::parse(format!(
                        "activity {i}: expected {n_resources} demands, got {}",
                        mode.demands.len()
                    )));
                }
                if mode.duration < 0 {
                    return Err(Error::parse(format!("activity {i} has negative duration")));
                }
            }
            let feasible = self.modes[i].iter().any(|m| {
                m.demands[..self.n_renewable]
                    .iter()
                    .zip(&self.capacities)
                    .all(|(&d, &c)| d <= c)
            });
            if !feasible {
                return Err(Error::Infeasible(format!(
                    "activity {i} exceeds a renewable capacity in every mode"
                )));
            }
        }

        self.wire_dummies();
        self.compute_ext_precs()?;
        if self.compute_energy_precedences() {
            self.compute_ext_precs()?;
        }
        self.reduce_nr_demand_min()?;
        Ok(self)
    }

    /// Connects activities without predecessors to the source and activities
    /// without successors to the sink.
    fn wire_dummies(&mut self) {
        let sink = self.sink();
        let mut has_pred = vec![false; self.n + 2];
        for i in 0..=self.n {
            for &j in &self.successors[i] {
                has_pred[j] = true;
            }
        }
        for i in 1..=self.n {
            if !has_pred[i] {
                self.add_precedence(0, i);
            }
            if self.successors[i].is_empty() {
                self.add_precedence(i, sink);
            }
        }
        if !(0..=self.n).any(|i| self.successors[i].contains(&sink)) {
            self.add_precedence(0, sink);
        }
    }

    /// Floyd–Warshall longest-path relaxation over minimum-duration lags.
    /// Rejects precedence cycles of positive weight.
    fn compute_ext_precs(&mut self) -> Result<(), Error> {
        let v = self.n + 2;
        let mut dist = vec![vec![NO_PREC; v]; v];
        for (i, row) in dist.iter_mut().enumerate() {
            row[i] = 0;
            for &j in &self.successors[i] {
                row[j] = row[j].max(self.min_duration(i));
            }
        }
        if !self.lags.is_empty() {
            for i in 0..v {
                for j in 0..v {
                    if self.lags[i][j] > NO_PREC {
                        dist[i][j] = dist[i][j].max(self.lags[i][j]);
                    }
                }
            }
        }
        for k in 0..v {
            for i in 0..v {
                if dist[i][k] == NO_PREC {
                    continue;
                }
                for j in 0..v {
                    if dist[k][j] == NO_PREC {
                        continue;
                    }
                    let cand = dist[i][k] + dist[k][j];
                    if cand > dist[i][j] {
                        dist[i][j] = cand;
                    }
                }
            }
        }
        for (i, row) in dist.iter().enumerate() {
            if row[i] > 0 {
                return Err(Error::Infeasible(format!(
                    "positive-weight precedence cycle through activity {i}"
                )));
            }
        }
        self.ext_prec = dist;
        Ok(())
    }

    /// Strengthens lags between precedence-related pairs: every activity on a
    /// path between `i` and `j` must run entirely between them, so its
    /// minimum energy claims time on the bottleneck renewable resource.
    /// Returns whether any lag grew.
    fn compute_energy_precedences(&mut self) -> bool {
        let v = self.n + 2;
        if self.lags.is_empty() {
            self.lags = vec![vec![NO_PREC; v]; v];
        }
        let mut changed = false;
        for i in 0..v {
            for j in 0..v {
                if !self.is_pred(i, j) {
                    continue;
                }
                let mids: Vec<usize> = (1..=self.n)
                    .filter(|&k| k != i && k != j && self.is_pred(i, k) && self.is_pred(k, j))
                    .collect();
                if mids.is_empty() {
                    continue;
                }
                let mut gap = 0i32;
                for r in 0..self.n_renewable {
                    let cap = self.capacities[r];
                    if cap <= 0 {
                        continue;
                    }
                    let energy: i64 = mids
                        .iter()
                        .map(|&k| {
                            self.modes[k]
                                .iter()
                                .map(|m| i64::from(m.duration) * i64::from(m.demands[r]))
                                .min()
                                .unwrap_or(0)
                        })
                        .sum();
                    let periods = ((energy + i64::from(cap) - 1) / i64::from(cap)) as i32;
                    gap = gap.max(periods);
                }
                let cand = self.min_duration(i) + gap;
                if cand > self.ext_prec[i][j] {
                    self.lags[i][j] = self.lags[i][j].max(cand);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Dominance reduction on nonrenewable resources: the per-activity
    /// minimum demand is committed in every schedule, so it is subtracted
    /// from all modes and from the budget. Surfaces budget exhaustion as
    /// infeasibility before any encoding is built.
    fn reduce_nr_demand_min(&mut self) -> Result<(), Error> {
        for r in self.n_renewable..self.n_resources() {
            let mut committed = 0i32;
            for i in 1..=self.n {
                let min = self.modes[i]
                    .iter()
                    .map(|m| m.demands[r])
                    .min()
                    .unwrap_or(0);
                committed += min;
                for mode in &mut self.modes[i] {
                    mode.demands[r] -= min;
                }
            }
            if committed > self.capacities[r] {
                return Err(Error::Infeasible(format!(
                    "minimum demands exceed the budget of nonrenewable resource {r}"
                )));
            }
            self.capacities[r] -= committed;
        }
        Ok(())
    }

    /// Time points at which some activity's window changes under `ub`:
    /// window starts and window ends, deduplicated and sorted.
    pub fn compute_steps(&self, ub: i32) -> Vec<i32> {
        (0..=self.sink())
            .flat_map(|i| [self.es(i), self.lc(i, ub)])
            .chain([0, ub])
            .filter(|&t| t >= 0 && t <= ub)
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Partitions `tasks` into the fewest chains of the precedence DAG; any
    /// two activities in the same chain cannot run concurrently. The chain
    /// count equals the size of a maximum antichain (Dilworth, via a maximum
    /// bipartite matching on the comparability relation).
    pub fn compute_min_path_cover(&self, tasks: &[usize]) -> Vec<Vec<usize>> {
        let m = tasks.len();
        let adj: Vec<Vec<usize>> = (0..m)
            .map(|a| {
                (0..m)
                    .filter(|&b| self.is_pred(tasks[a], tasks[b]))
                    .collect()
            })
            .collect();
        let mut next = vec![None; m];
        let mut prev = vec![None; m];
        for a in 0..m {
            let mut seen = vec![false; m];
            let _ = augment(a, &adj, &mut seen, &mut next, &mut prev);
        }
        let mut chains = Vec::new();
        for start in 0..m {
            if prev[start].is_some() {
                continue;
            }
            let mut chain = vec![tasks[start]];
            let mut cur = start;
            while let Some(succ) = next[cur] {
                chain.push(tasks[succ]);
                cur = succ;
            }
            chains.push(chain);
        }
        chains
    }

    /// Greedy upper bound: selects modes (minimum duration, repaired towards
    /// the nonrenewable budgets) and builds a schedule with the serial
    /// schedule-generation scheme. Returns `None` when the mode repair fails.
    pub fn compute_pss(&self) -> Option<Schedule> {
        let modes = self.greedy_modes()?;
        Some(self.schedule_modes(&modes))
    }

    fn greedy_modes(&self) -> Option<Vec<usize>> {
        let renewable_ok = |i: usize, g: usize| {
            self.modes[i][g].demands[..self.n_renewable]
                .iter()
                .zip(&self.capacities)
                .all(|(&d, &c)| d <= c)
        };
        let mut chosen = vec![0usize; self.n + 2];
        for i in 1..=self.n {
            chosen[i] = (0..self.n_modes(i))
                .filter(|&g| renewable_ok(i, g))
                .min_by_key(|&g| self.duration(i, g))?;
        }
        // Swap modes until all nonrenewable budgets are met; each swap picks
        // the largest demand reduction at the smallest duration penalty.
        let mut budget = self.n * self.modes.iter().map(Vec::len).sum::<usize>() + 1;
        loop {
            let overloaded = (self.n_renewable..self.n_resources()).find(|&r| {
                (1..=self.n)
                    .map(|i| self.demand(i, r, chosen[i]))
                    .sum::<i32>()
                    > self.capacities[r]
            });
            let Some(r) = overloaded else {
                return Some(chosen);
            };
            budget = budget.checked_sub(1)?;
            let mut best: Option<(i32, i32, usize, usize)> = None;
            for i in 1..=self.n {
                let cur = self.demand(i, r, chosen[i]);
                for g in 0..self.n_modes(i) {
                    if !renewable_ok(i, g) || self.demand(i, r, g) >= cur {
                        continue;
                    }
                    let gain = cur - self.demand(i, r, g);
                    let penalty = self.duration(i, g) - self.duration(i, chosen[i]);
                    if best
                        .map(|(bg, bp, _, _)| (gain, -penalty) > (bg, -bp))
                        .unwrap_or(true)
                    {
                        best = Some((gain, penalty, i, g));
                    }
                }
            }
            let (_, _, i, g) = best?;
            chosen[i] = g;
        }
    }

    /// Serial schedule-generation scheme over a fixed mode assignment:
    /// activities are placed in topological order at the earliest
    /// resource-feasible start after all predecessors completed.
    fn schedule_modes(&self, chosen: &[usize]) -> Schedule {
        let sink = self.sink();
        let horizon = (1..=self.n)
            .map(|i| self.duration(i, chosen[i]))
            .sum::<i32>()
            .max(0) as usize;
        let mut usage = vec![vec![0i32; horizon]; self.n_renewable];
        let mut starts = vec![0i32; self.n + 2];
        let mut finishes = vec![0i32; self.n + 2];
        for i in self.topological_order() {
            if i == 0 {
                continue;
            }
            let est = (0..=self.n)
                .filter(|&p| self.successors[p].contains(&i))
                .map(|p| finishes[p])
                .max()
                .unwrap_or(0);
            if i == sink {
                starts[i] = est;
                finishes[i] = est;
                continue;
            }
            let dur = self.duration(i, chosen[i]) as usize;
            let mut t = est as usize;
            'place: loop {
                for tau in t..t + dur {
                    for r in 0..self.n_renewable {
                        if usage[r][tau] + self.demand(i, r, chosen[i]) > self.capacities[r] {
                            t = tau + 1;
                            continue 'place;
                        }
                    }
                }
                break;
            }
            for tau in t..t + dur {
                for (r, usage) in usage.iter_mut().enumerate() {
                    usage[tau] += self.demand(i, r, chosen[i]);
                }
            }
            starts[i] = t as i32;
            finishes[i] = (t + dur) as i32;
        }
        Schedule {
            starts,
            modes: chosen.to_vec(),
        }
    }

    fn topological_order(&self) -> Vec<usize> {
        let v = self.n + 2;
        let mut indegree = vec![0usize; v];
        for succs in &self.successors {
            for &j in succs {
                indegree[j] += 1;
            }
        }
        let mut queue: Vec<usize> = (0..v).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(v);
        while let Some(i) = queue.pop() {
            order.push(i);
            for &j in &self.successors[i] {
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    queue.push(j);
                }
            }
        }
        order
    }

    /// Checks a schedule against precedences, renewable capacities and
    /// nonrenewable budgets. Used by tests and by the model read-back
    /// debug assertions.
    pub fn validate(&self, sched: &Schedule) -> Result<(), String> {
        if sched.starts.len() != self.n + 2 || sched.modes.len() != self.n + 2 {
            return Err("schedule length does not match the instance".into());
        }
        for i in 0..=self.sink() {
            if sched.modes[i] >= self.n_modes(i) {
                return Err(format!("activity {i}: mode {} out of range", sched.modes[i]));
            }
            let finish = sched.starts[i] + self.duration(i, sched.modes[i]);
            for &j in &self.successors[i] {
                if sched.starts[j] < finish {
                    return Err(format!("precedence {i} -> {j} violated"));
                }
            }
        }
        for r in 0..self.n_renewable {
            let makespan = sched.makespan();
            for t in 0..makespan {
                let used: i32 = (1..=self.n)
                    .filter(|&i| {
                        sched.starts[i] <= t
                            && t < sched.starts[i] + self.duration(i, sched.modes[i])
                    })
                    .map(|i| self.demand(i, r, sched.modes[i]))
                    .sum();
                if used > self.capacities[r] {
                    return Err(format!("renewable resource {r} overloaded at time {t}"));
                }
            }
        }
        for r in self.n_renewable..self.n_resources() {
            let used: i32 = (1..=self.n).map(|i| self.demand(i, r, sched.modes[i])).sum();
            if used > self.capacities[r] {
                return Err(format!("nonrenewable resource {r} over budget"));
            }
        }
        Ok(())
    }
}

/// Kuhn augmenting-path step of the maximum bipartite matching.
fn augment(
    a: usize,
    adj: &[Vec<usize>],
    seen: &mut [bool],
    next: &mut [Option<usize>],
    prev: &mut [Option<usize>],
) -> bool {
    for &b in &adj[a] {
        if seen[b] {
            continue;
        }
        seen[b] = true;
        if prev[b].is_none() || augment(prev[b].unwrap(), adj, seen, next, prev) {
            next[a] = Some(b);
            prev[b] = Some(a);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two parallel activities followed by a third one, one renewable
    /// resource of capacity 2.
    fn diamond() -> Mrcpsp {
        let mut ins = Mrcpsp::new(3, vec![2], vec![]);
        ins.add_mode(1, 3, vec![1]);
        ins.add_mode(2, 2, vec![1]);
        ins.add_mode(3, 4, vec![2]);
        ins.add_precedence(1, 3);
        ins.add_precedence(2, 3);
        ins.preprocess().unwrap()
    }

    #[test]
    fn ext_precs_longest_paths() {
        let ins = diamond();
        assert_eq!(ins.ext_prec(0, 1), 0);
        assert_eq!(ins.ext_prec(1, 3), 3);
        assert_eq!(ins.ext_prec(2, 3), 2);
        assert_eq!(ins.ext_prec(0, ins.sink()), 7);
        assert_eq!(ins.trivial_lb(), 7);
        assert!(!ins.is_pred(1, 2));
        assert!(ins.is_pred(0, ins.sink()));
        // no positive self-lags on a DAG
        for i in 0..=ins.sink() {
            assert!(ins.ext_prec(i, i) <= 0);
        }
    }

    #[test]
    fn windows_against_upper_bound() {
        let ins = diamond();
        let ub = 10;
        assert_eq!(ins.es(0), 0);
        assert_eq!(ins.ls(0, ub), 0);
        assert_eq!(ins.es(3), 3);
        assert_eq!(ins.ls(3, ub), 6);
        assert_eq!(ins.ec(3), 7);
        assert_eq!(ins.lc(3, ub), 10);
        assert_eq!(ins.ls(ins.sink(), ub), ub);
    }

    #[test]
    fn positive_cycle_rejected() {
        let mut ins = Mrcpsp::new(2, vec![], vec![]);
        ins.add_mode(1, 2, vec![]);
        ins.add_mode(2, 3, vec![]);
        ins.add_precedence(1, 2);
        ins.add_precedence(2, 1);
        match ins.preprocess() {
            Err(Error::Infeasible(msg)) => assert!(msg.contains("cycle")),
            other => panic!("expected infeasibility, got {other:?}"),
        }
    }

    #[test]
    fn nonrenewable_reduction_infeasible() {
        let mut ins = Mrcpsp::new(2, vec![], vec![3]);
        ins.add_mode(1, 1, vec![2]);
        ins.add_mode(2, 1, vec![2]);
        assert!(matches!(ins.preprocess(), Err(Error::Infeasible(_))));
    }

    #[test]
    fn nonrenewable_reduction_shifts_demands() {
        let mut ins = Mrcpsp::new(1, vec![], vec![3]);
        ins.add_mode(1, 3, vec![4]);
        ins.add_mode(1, 5, vec![2]);
        let ins = ins.preprocess().unwrap();
        // the committed minimum of 2 is subtracted from modes and budget
        assert_eq!(ins.demand(1, 0, 0), 2);
        assert_eq!(ins.demand(1, 0, 1), 0);
        assert_eq!(ins.capacity(0), 1);
    }

    #[test]
    fn min_path_cover_chains() {
        let ins = diamond();
        // 1 and 2 are incomparable, 3 follows both
        let chains = ins.compute_min_path_cover(&[1, 2, 3]);
        assert_eq!(chains.len(), 2);
        let mut covered: Vec<usize> = chains.iter().flatten().copied().collect();
        covered.sort_unstable();
        assert_eq!(covered, vec![1, 2, 3]);
        for chain in &chains {
            for pair in chain.windows(2) {
                assert!(ins.is_pred(pair[0], pair[1]));
            }
        }
    }

    #[test]
    fn min_path_cover_single_chain() {
        let mut ins = Mrcpsp::new(3, vec![], vec![]);
        for i in 1..=3 {
            ins.add_mode(i, 1, vec![]);
        }
        ins.add_precedence(1, 2);
        ins.add_precedence(2, 3);
        let ins = ins.preprocess().unwrap();
        let chains = ins.compute_min_path_cover(&[1, 2, 3]);
        assert_eq!(chains, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn pss_produces_feasible_schedule() {
        let ins = diamond();
        let sched = ins.compute_pss().unwrap();
        ins.validate(&sched).unwrap();
        // capacity 2 forces 1 and 2 to overlap at most partially; the serial
        // scheme still has to respect the critical path
        assert!(sched.makespan() >= ins.trivial_lb());
    }

    #[test]
    fn pss_mode_repair_meets_budget() {
        // short mode is too hungry for the budget, repair must pick mode 1
        let mut ins = Mrcpsp::new(1, vec![], vec![3]);
        ins.add_mode(1, 3, vec![4]);
        ins.add_mode(1, 5, vec![2]);
        let ins = ins.preprocess().unwrap();
        let sched = ins.compute_pss().unwrap();
        ins.validate(&sched).unwrap();
        assert_eq!(sched.modes[1], 1);
        assert_eq!(sched.makespan(), 5);
    }

    #[test]
    fn energy_precedences_strengthen_lags() {
        // 1 -> 4 with 2 and 3 in between; capacity 1 serializes the middle
        let mut ins = Mrcpsp::new(4, vec![1], vec![]);
        ins.add_mode(1, 1, vec![0]);
        ins.add_mode(2, 2, vec![1]);
        ins.add_mode(3, 2, vec![1]);
        ins.add_mode(4, 1, vec![0]);
        ins.add_precedence(1, 2);
        ins.add_precedence(1, 3);
        ins.add_precedence(2, 4);
        ins.add_precedence(3, 4);
        let ins = ins.preprocess().unwrap();
        // plain longest path gives 1 + 2 = 3, energy gives 1 + ceil(4/1) = 5
        assert_eq!(ins.ext_prec(1, 4), 5);
        // 0 -> 1 -> (energy lag) 4 -> sink
        assert_eq!(ins.trivial_lb(), 6);
    }

    #[test]
    fn steps_cover_window_changes() {
        let ins = diamond();
        let steps = ins.compute_steps(10);
        assert!(steps.contains(&0));
        assert!(steps.contains(&ins.es(3)));
        assert!(steps.contains(&10));
        assert!(steps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_instance_trivial() {
        let ins = Mrcpsp::new(0, vec![], vec![]).preprocess().unwrap();
        assert_eq!(ins.trivial_lb(), 0);
        assert_eq!(ins.horizon(), 0);
        let sched = ins.compute_pss().unwrap();
        assert_eq!(sched.makespan(), 0);
    }
}
