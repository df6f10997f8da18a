use std::collections::HashMap;
use std::ops::Not;

use itertools::Itertools;
use unordered_pair::UnorderedPair;

use crate::net::{GroupId, NodeId};
use crate::quotient::ClassId;

/// A propositional variable, numbered upward from 1 in order of first use.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct Var(u32);

impl Var {
    /// The slot of this variable in a zero-based assignment or model array.
    #[inline]
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// The variable stored at `index` in a zero-based assignment or model array.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    /// The literal asserting this variable.
    #[inline]
    pub fn positive(self) -> Lit {
        Lit(self.0 as i32)
    }

    /// The literal refuting this variable.
    #[inline]
    pub fn negative(self) -> Lit {
        Lit(-(self.0 as i32))
    }

    /// [`positive`](Self::positive) if `polarity` is true, else [`negative`](Self::negative).
    #[inline]
    pub fn lit(self, polarity: bool) -> Lit {
        if polarity { self.positive() } else { self.negative() }
    }
}

/// A positive or negative occurrence of a [`Var`], as placed in clauses.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct Lit(i32);

impl Lit {
    /// The variable this literal asserts or refutes.
    #[inline]
    pub fn var(self) -> Var {
        Var(self.0.unsigned_abs())
    }

    /// Whether this literal asserts its variable.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// The signed DIMACS-style number of this literal.
    #[inline]
    pub fn to_dimacs(self) -> i32 {
        self.0
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit(-self.0)
    }
}

/// The role a named variable plays in an encoding.
///
/// Counter and comparator internals are allocated anonymously instead and
/// never looked up again.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub(crate) enum Key {
    /// `child` hangs from the adjacent `parent` in the forest.
    Parent { child: NodeId, parent: NodeId },
    /// `node` is claimed by `group`.
    Member { node: NodeId, group: GroupId },
    /// The edge between these two nodes survives into the output.
    Kept(UnorderedPair<NodeId>),
    /// Bit `bit` of the binary level counter of `node`.
    LevelBit { node: NodeId, bit: u32 },
    /// `node` sits at least `bound` parent steps below its root.
    DistAtLeast { node: NodeId, bound: u32 },
    /// Quotient class `class` routes its parent through incident edge `edge`.
    Choose { class: ClassId, edge: usize },
    /// A lifted node holds a parent through some slot.
    HasParent { node: NodeId },
    /// A closed walk stands on `node` at `step`.
    Visit { step: u32, node: NodeId },
    /// `node` is reachable from `root` within `step` kept edges.
    Reach { root: NodeId, step: u32, node: NodeId },
    /// Reachability of `node` from `root` at `step` arrived through `via`.
    Through { root: NodeId, step: u32, via: NodeId, node: NodeId },
}

// above this many literals, at_most_one switches from pairwise clauses to a
// sequential counter
const PAIRWISE_LIMIT: usize = 6;

/// One request's worth of variables and clauses, built up by the encoders and
/// then fed to an [`Engine`](crate::engine::Engine).
///
/// Clauses are normalized on entry: duplicate literals collapse and
/// tautologies vanish. A formula known to be unsatisfiable before the engine
/// ever runs is [`poison`](Self::poison)ed with an explicit empty clause and
/// remembers why.
pub(crate) struct Formula {
    by_key: HashMap<Key, Var>,
    next: u32,
    clauses: Vec<Vec<Lit>>,
    poison: Option<String>,
}

impl Formula {
    pub(crate) fn new() -> Self {
        Self {
            by_key: HashMap::new(),
            next: 1,
            clauses: Vec::new(),
            poison: None,
        }
    }

    /// The variable for `key`, created on first use.
    pub(crate) fn var(&mut self, key: Key) -> Var {
        match self.by_key.get(&key) {
            Some(var) => *var,
            None => {
                let var = Var(self.next);
                self.next += 1;
                self.by_key.insert(key, var);
                var
            }
        }
    }

    /// The variable for `key`, if any encoder has created it.
    pub(crate) fn lookup(&self, key: Key) -> Option<Var> {
        self.by_key.get(&key).copied()
    }

    /// An anonymous variable for counter or comparator internals.
    pub(crate) fn fresh(&mut self) -> Var {
        let var = Var(self.next);
        self.next += 1;
        var
    }

    pub(crate) fn num_vars(&self) -> usize {
        (self.next - 1) as usize
    }

    pub(crate) fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub(crate) fn clauses(&self) -> &[Vec<Lit>] {
        &self.clauses
    }

    /// Record that this formula cannot be satisfied no matter the engine, and why.
    ///
    /// The first reason recorded wins; each call still contributes an empty
    /// clause so any engine agrees.
    pub(crate) fn poison(&mut self, reason: impl Into<String>) {
        if self.poison.is_none() {
            self.poison = Some(reason.into());
        }
        self.clauses.push(Vec::new());
    }

    pub(crate) fn poison_reason(&self) -> Option<&str> {
        self.poison.as_deref()
    }

    /// Add a clause, dropping duplicate literals and whole tautologies.
    pub(crate) fn add_clause(&mut self, lits: impl IntoIterator<Item = Lit>) {
        let mut clause = lits.into_iter().collect_vec();
        clause.sort_unstable_by_key(|lit| (lit.var(), lit.is_positive()));
        clause.dedup();

        // a var surviving twice after dedup occurs with both signs; X + !X + ... is true already
        if clause.windows(2).any(|pair| pair[0].var() == pair[1].var()) {
            return;
        }

        self.clauses.push(clause);
    }

    /// `premise` forces `conclusion`; !A + B.
    pub(crate) fn implies(&mut self, premise: Lit, conclusion: Lit) {
        self.add_clause([!premise, conclusion]);
    }

    /// At most one of `lits` is true.
    ///
    /// Small inputs take the quadratic pairwise form; larger ones pay a
    /// register rail instead.
    pub(crate) fn at_most_one(&mut self, lits: &[Lit]) {
        if lits.len() <= 1 {
            return;
        }

        if lits.len() <= PAIRWISE_LIMIT {
            // no two are true; (!A + !B) * (!A + !C) * ...
            for (a, b) in lits.iter().tuple_combinations() {
                self.add_clause([!*a, !*b]);
            }
        } else {
            self.sequential_counter(lits);
        }
    }

    /// Sinz-style sequential counter for at most one: register i says "some
    /// literal at or before position i is true".
    ///
    /// Registers are free to be true ahead of any true literal; nothing decodes
    /// them, so the slack is harmless.
    pub(crate) fn sequential_counter(&mut self, lits: &[Lit]) {
        let registers = (1..lits.len()).map(|_| self.fresh()).collect_vec();

        for (i, &lit) in lits.iter().enumerate() {
            if i < registers.len() {
                self.implies(lit, registers[i].positive());
            }
            if i > 0 {
                // a true literal here contradicts any true literal before it
                self.add_clause([!lit, registers[i - 1].negative()]);
            }
        }

        for pair in registers.windows(2) {
            self.implies(pair[0].positive(), pair[1].positive());
        }
    }

    /// Exactly one of `lits` is true. `lits` must be non-empty; callers with a
    /// possibly-empty candidate set poison with their own reason instead.
    pub(crate) fn exactly_one(&mut self, lits: &[Lit]) {
        self.add_clause(lits.iter().copied());
        self.at_most_one(lits);
    }
}
