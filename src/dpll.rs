//! A from-scratch DPLL engine: two-watched-literal unit propagation and
//! chronological backtracking, with an optional decision budget standing in
//! for a timeout.
//!
//! No clause learning and no heuristics beyond false-first phase; the
//! encodings in this crate propagate hard enough that plain search carries
//! the built-in fixtures comfortably, and [`Varisat`](crate::engine::Varisat)
//! remains available for anything heavier.

use std::mem;

use crate::engine::{Engine, Verdict};
use crate::formula::{Lit, Var};

// a decision and where the trail stood when it was made
struct Mark {
    trail_at: usize,
    lit: Lit,
    flipped: bool,
}

/// The built-in search engine. See the [module docs](self) for its shape.
pub struct Search {
    // clauses of two or more literals; positions 0 and 1 are the watched ones
    clauses: Vec<Vec<Lit>>,
    // watches[slot(lit)] lists clauses currently watching lit
    watches: Vec<Vec<usize>>,
    units: Vec<Lit>,
    saw_empty_clause: bool,
    // by var index: 0 unknown, 1 true, -1 false
    assign: Vec<i8>,
    trail: Vec<Lit>,
    head: usize,
    marks: Vec<Mark>,
    budget: Option<u64>,
    decisions: u64,
}

#[inline]
fn slot(lit: Lit) -> usize {
    lit.var().index() * 2 + lit.is_positive() as usize
}

impl Search {
    /// A fresh engine with no decision budget.
    pub fn new() -> Self {
        Self {
            clauses: Vec::new(),
            watches: Vec::new(),
            units: Vec::new(),
            saw_empty_clause: false,
            assign: Vec::new(),
            trail: Vec::new(),
            head: 0,
            marks: Vec::new(),
            budget: None,
            decisions: 0,
        }
    }

    /// A fresh engine that answers [`Verdict::Unknown`] once it has made
    /// `decisions` decisions without concluding.
    pub fn with_budget(decisions: u64) -> Self {
        Self {
            budget: Some(decisions),
            ..Self::new()
        }
    }

    /// Decisions made by the last [`solve`](Engine::solve).
    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    fn grow_to(&mut self, vars: usize) {
        if self.assign.len() < vars {
            self.assign.resize(vars, 0);
            self.watches.resize(vars * 2, Vec::new());
        }
    }

    #[inline]
    fn lit_value(&self, lit: Lit) -> Option<bool> {
        match self.assign[lit.var().index()] {
            0 => None,
            value => Some((value > 0) == lit.is_positive()),
        }
    }

    // make lit true now; false if it is already false
    fn assume(&mut self, lit: Lit) -> bool {
        match self.lit_value(lit) {
            Some(value) => value,
            None => {
                self.assign[lit.var().index()] = if lit.is_positive() { 1 } else { -1 };
                self.trail.push(lit);
                true
            }
        }
    }

    // exhaust the trail; false on conflict
    fn propagate(&mut self) -> bool {
        while self.head < self.trail.len() {
            let made_true = self.trail[self.head];
            self.head += 1;
            let false_lit = !made_true;

            let mut watching = mem::take(&mut self.watches[slot(false_lit)]);
            let mut i = 0;
            while i < watching.len() {
                let ci = watching[i];
                if self.clauses[ci][0] == false_lit {
                    self.clauses[ci].swap(0, 1);
                }
                let other = self.clauses[ci][0];
                if self.lit_value(other) == Some(true) {
                    i += 1;
                    continue;
                }

                // hunt for a non-false literal to watch instead
                let replacement = (2..self.clauses[ci].len())
                    .find(|&k| self.lit_value(self.clauses[ci][k]) != Some(false));

                match replacement {
                    Some(k) => {
                        self.clauses[ci].swap(1, k);
                        let moved = self.clauses[ci][1];
                        self.watches[slot(moved)].push(ci);
                        watching.swap_remove(i);
                    }
                    None => {
                        // whole rest is false; clause is unit on `other` or conflicting
                        if self.lit_value(other) == Some(false) {
                            self.watches[slot(false_lit)] = watching;
                            return false;
                        }
                        self.assume(other);
                        i += 1;
                    }
                }
            }
            self.watches[slot(false_lit)] = watching;
        }

        true
    }

    // undo through the most recent unflipped decision and flip it;
    // false once no decision is left to flip
    fn backtrack(&mut self) -> bool {
        while let Some(mark) = self.marks.pop() {
            for lit in self.trail.drain(mark.trail_at..) {
                self.assign[lit.var().index()] = 0;
            }
            self.head = mark.trail_at;

            if !mark.flipped {
                let flip = !mark.lit;
                self.marks.push(Mark { trail_at: mark.trail_at, lit: flip, flipped: true });
                self.assume(flip);
                return true;
            }
        }

        false
    }

    fn next_unassigned(&self) -> Option<Var> {
        self.assign.iter().position(|value| *value == 0).map(Var::from_index)
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Search {
    fn reserve(&mut self, vars: usize) {
        self.grow_to(vars);
    }

    fn add_clause(&mut self, clause: &[Lit]) {
        if let Some(widest) = clause.iter().map(|lit| lit.var().index() + 1).max() {
            self.grow_to(widest);
        }

        match clause.len() {
            0 => self.saw_empty_clause = true,
            1 => self.units.push(clause[0]),
            _ => {
                let ci = self.clauses.len();
                self.clauses.push(clause.to_vec());
                self.watches[slot(clause[0])].push(ci);
                self.watches[slot(clause[1])].push(ci);
            }
        }
    }

    fn solve(&mut self) -> Verdict {
        if self.saw_empty_clause {
            return Verdict::Unsat;
        }

        // solve() restarts from scratch; watches survive, assignments do not
        self.assign.iter_mut().for_each(|value| *value = 0);
        self.trail.clear();
        self.head = 0;
        self.marks.clear();
        self.decisions = 0;

        for i in 0..self.units.len() {
            if !self.assume(self.units[i]) {
                return Verdict::Unsat;
            }
        }
        if !self.propagate() {
            return Verdict::Unsat;
        }

        loop {
            let var = match self.next_unassigned() {
                None => return Verdict::Sat,
                Some(var) => var,
            };

            if self.budget.is_some_and(|budget| self.decisions >= budget) {
                return Verdict::Unknown;
            }
            self.decisions += 1;
            self.marks.push(Mark { trail_at: self.trail.len(), lit: var.negative(), flipped: false });
            self.assume(var.negative());

            while !self.propagate() {
                if !self.backtrack() {
                    return Verdict::Unsat;
                }
            }
        }
    }

    fn value(&self, var: Var) -> bool {
        self.assign.get(var.index()).map_or(false, |value| *value > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Engine, Verdict};
    use crate::formula::Var;

    use super::Search;

    fn vars(n: usize) -> Vec<Var> {
        (0..n).map(Var::from_index).collect()
    }

    #[test]
    fn propagates_chained_units() {
        let mut engine = Search::new();
        let v = vars(3);
        engine.reserve(3);
        engine.add_clause(&[v[0].positive()]);
        engine.add_clause(&[v[0].negative(), v[1].positive()]);
        engine.add_clause(&[v[1].negative(), v[2].positive()]);

        assert_eq!(engine.solve(), Verdict::Sat);
        assert!(engine.value(v[0]));
        assert!(engine.value(v[1]));
        assert!(engine.value(v[2]));
        // pure propagation, no decisions spent
        assert_eq!(engine.decisions(), 0);
    }

    #[test]
    fn refutes_contradictory_units() {
        let mut engine = Search::new();
        let v = vars(2);
        engine.reserve(2);
        engine.add_clause(&[v[0].positive()]);
        engine.add_clause(&[v[1].positive()]);
        engine.add_clause(&[v[0].negative(), v[1].negative()]);

        assert_eq!(engine.solve(), Verdict::Unsat);
    }

    #[test]
    fn empty_clause_is_fatal() {
        let mut engine = Search::new();
        engine.add_clause(&[]);
        assert_eq!(engine.solve(), Verdict::Unsat);
    }

    #[test]
    fn backtracks_through_bad_phases() {
        // the all-false phase fails twice here before a model appears
        let mut engine = Search::new();
        let v = vars(2);
        engine.reserve(2);
        engine.add_clause(&[v[0].positive(), v[1].positive()]);
        engine.add_clause(&[v[0].positive(), v[1].negative()]);
        engine.add_clause(&[v[0].negative(), v[1].positive()]);

        assert_eq!(engine.solve(), Verdict::Sat);
        assert!(engine.value(v[0]));
        assert!(engine.value(v[1]));
    }

    #[test]
    fn unsat_without_any_units() {
        // all four sign combinations over two vars
        let mut engine = Search::new();
        let v = vars(2);
        engine.reserve(2);
        engine.add_clause(&[v[0].positive(), v[1].positive()]);
        engine.add_clause(&[v[0].positive(), v[1].negative()]);
        engine.add_clause(&[v[0].negative(), v[1].positive()]);
        engine.add_clause(&[v[0].negative(), v[1].negative()]);

        assert_eq!(engine.solve(), Verdict::Unsat);
    }

    #[test]
    fn budget_runs_out_as_unknown() {
        let mut engine = Search::with_budget(0);
        let v = vars(2);
        engine.reserve(2);
        engine.add_clause(&[v[0].positive(), v[1].positive()]);

        assert_eq!(engine.solve(), Verdict::Unknown);
    }

    #[test]
    fn unconstrained_vars_read_false() {
        let mut engine = Search::new();
        let v = vars(4);
        engine.reserve(4);
        engine.add_clause(&[v[1].positive()]);

        assert_eq!(engine.solve(), Verdict::Sat);
        assert!(!engine.value(v[0]));
        assert!(engine.value(v[1]));
        assert!(!engine.value(v[3]));
    }
}
