//! The caller-facing problem types and the per-request pipeline.
//!
//! Each `solve` call is isolated: a fresh [`Formula`], one engine, one
//! decode. Nothing is shared or reused across requests, so concurrent
//! callers just build their own problems.

use std::collections::BTreeMap;

use crate::circuit;
use crate::engine::{Engine, Varisat, Verdict};
use crate::extract::{self, Arborescence, Forest, Walk};
use crate::formula::Formula;
use crate::forest::{self, Order};
use crate::net::{Membership, Net, NodeId};
use crate::quotient::{self, Depth, Lift, Quotient};
use crate::reach::{self, AdjacencyFloor, LowerBound};

/// Why a request produced no solution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request was malformed; nothing was encoded.
    #[error("invalid request: {0}")]
    Invalid(String),
    /// The encoder proved the request impossible while building the formula,
    /// so the engine's refutation was known ahead of time.
    #[error("impossible request: {0}")]
    Impossible(String),
    /// The engine refuted the formula; the request is consistent but has no
    /// solution.
    #[error("no solution exists")]
    Unsatisfiable,
    /// The engine gave up before deciding.
    #[error("the engine gave up; shrink the problem or raise its budget")]
    Exhausted,
    /// The engine affirmed a model the decoder could not read back. This
    /// points at a defect, not at the request.
    #[error("model decoded inconsistently: {0}")]
    Incoherent(String),
}

/// One minimum-distance demand: the target's BFS distance from the root of
/// its group, measured over kept edges, must be at least `hops` (or the
/// target must be unreachable outright).
#[derive(Copy, Clone, Debug)]
pub struct DistanceRule {
    /// The measured node; must be [`Membership::Fixed`].
    pub target: NodeId,
    /// The required minimum distance.
    pub hops: u32,
}

/// A rooted spanning forest request: one tree per group, every fixed node
/// claimed, optional distance floors on fixed nodes.
pub struct SpanningProblem<'a> {
    net: &'a Net,
    rules: Vec<DistanceRule>,
    cover_all: bool,
    order: Order,
    floor: Option<&'a dyn LowerBound>,
}

impl<'a> SpanningProblem<'a> {
    /// A request over `net` with no extra demands.
    pub fn new(net: &'a Net) -> Self {
        Self {
            net,
            rules: Vec::new(),
            cover_all: false,
            order: Order::default(),
            floor: None,
        }
    }

    /// Demand a minimum BFS distance for `target`; see [`DistanceRule`].
    pub fn minimum_distance(mut self, target: NodeId, hops: u32) -> Self {
        self.rules.push(DistanceRule { target, hops });
        self
    }

    /// Demand that every free node be claimed by some group.
    pub fn cover_all(mut self) -> Self {
        self.cover_all = true;
        self
    }

    /// Pick the cycle-elimination order; see [`Order`].
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Prune the distance encoding with a custom metric instead of the
    /// built-in adjacency BFS floor.
    pub fn with_floor(mut self, floor: &'a dyn LowerBound) -> Self {
        self.floor = Some(floor);
        self
    }

    /// Solve with the default [`Varisat`] engine.
    pub fn solve(self) -> Result<Forest, Error> {
        self.solve_with(&mut Varisat::new())
    }

    /// Solve with a caller-chosen engine.
    pub fn solve_with(self, engine: &mut dyn Engine) -> Result<Forest, Error> {
        self.net.validate()?;
        for rule in &self.rules {
            if !self.net.contains(rule.target) {
                return Err(Error::Invalid(format!("distance target {} is not in the net", rule.target)));
            }
            if !matches!(self.net.membership(rule.target), Membership::Fixed(_)) {
                return Err(Error::Invalid(format!(
                    "distance target {} must be fixed to a group", rule.target
                )));
            }
        }

        let mut formula = Formula::new();
        forest::encode(&mut formula, self.net, self.order, self.cover_all);

        let usable = self.net.nodes()
            .filter(|node| self.net.membership(*node) != Membership::Excluded)
            .count() as u32;

        // per-root batches; each root prunes with its own floor
        let mut by_root: BTreeMap<NodeId, Vec<(NodeId, u32)>> = BTreeMap::new();
        for rule in &self.rules {
            let group = match self.net.membership(rule.target) {
                Membership::Fixed(group) => group,
                _ => unreachable!(),
            };
            let root = match self.net.root_of(group) {
                None => return Err(Error::Invalid(format!("group {group} has no root"))),
                Some(root) => root,
            };
            if rule.target == root && rule.hops >= 1 {
                formula.poison(format!("node {} is the root of its group, distance 0", rule.target));
                continue;
            }
            if rule.hops >= usable {
                // a fixed target is always connected, so its distance tops
                // out below the usable node count
                formula.poison(format!(
                    "distance {} cannot be realized among {usable} usable nodes", rule.hops
                ));
                continue;
            }
            by_root.entry(root).or_default().push((rule.target, rule.hops));
        }

        for (root, demands) in by_root {
            match self.floor {
                Some(floor) => {
                    reach::encode(&mut formula, self.net.graph(), root, &demands, &[], floor);
                }
                None => {
                    let floor = AdjacencyFloor::new(self.net.graph(), root);
                    reach::encode(&mut formula, self.net.graph(), root, &demands, &[], &floor);
                }
            }
        }

        let net = self.net;
        run(formula, engine, |formula, engine| Ok(extract::forest(formula, engine, net)))
    }
}

/// A fixed-length simple closed walk request: starting and ending at
/// `start`, touching exactly `span` distinct nodes. Groups and roots of the
/// net are ignored; excluded nodes are off limits.
pub struct CircuitProblem<'a> {
    net: &'a Net,
    start: NodeId,
    span: u32,
}

impl<'a> CircuitProblem<'a> {
    /// A walk request over `net`.
    pub fn new(net: &'a Net, start: NodeId, span: u32) -> Self {
        Self { net, start, span }
    }

    /// Solve with the default [`Varisat`] engine.
    pub fn solve(self) -> Result<Walk, Error> {
        self.solve_with(&mut Varisat::new())
    }

    /// Solve with a caller-chosen engine.
    pub fn solve_with(self, engine: &mut dyn Engine) -> Result<Walk, Error> {
        if self.net.node_count() == 0 {
            return Err(Error::Invalid("the net has no nodes".into()));
        }
        if !self.net.contains(self.start) {
            return Err(Error::Invalid(format!("start {} is not in the net", self.start)));
        }
        if self.net.membership(self.start) == Membership::Excluded {
            return Err(Error::Invalid(format!("start {} is excluded", self.start)));
        }
        if self.span < 2 {
            return Err(Error::Invalid("a closed walk spans at least 2 distinct nodes".into()));
        }

        let mut formula = Formula::new();
        let stranded = !self.net.neighbors(self.start)
            .any(|node| self.net.membership(node) != Membership::Excluded);
        if stranded {
            formula.poison(format!("start {} has no usable neighbors", self.start));
        }
        circuit::encode(&mut formula, self.net, self.start, self.span);

        let (net, start, span) = (self.net, self.start, self.span);
        run(formula, engine, |formula, engine| extract::walk(formula, engine, net, start, span))
    }
}

/// An arborescence request over a covering graph, chosen in the quotient;
/// see the [`quotient`](crate::quotient) module docs.
pub struct QuotientProblem<'a> {
    quotient: &'a Quotient,
    lift: &'a Lift,
    depth: Option<(NodeId, Depth)>,
}

impl<'a> QuotientProblem<'a> {
    /// A request over `quotient` and its covering `lift`.
    pub fn new(quotient: &'a Quotient, lift: &'a Lift) -> Self {
        Self { quotient, lift, depth: None }
    }

    /// Demand a parent-chain depth for one lifted node; see [`Depth`].
    pub fn depth(mut self, target: NodeId, depth: Depth) -> Self {
        self.depth = Some((target, depth));
        self
    }

    /// Solve with the default [`Varisat`] engine.
    pub fn solve(self) -> Result<Arborescence, Error> {
        self.solve_with(&mut Varisat::new())
    }

    /// Solve with a caller-chosen engine.
    pub fn solve_with(self, engine: &mut dyn Engine) -> Result<Arborescence, Error> {
        quotient::validate(self.quotient, self.lift)?;
        if let Some((target, _)) = self.depth {
            if !self.lift.nodes().iter().any(|&(node, _)| node == target) {
                return Err(Error::Invalid(format!("depth target {target} is not a lifted node")));
            }
        }

        let mut formula = Formula::new();
        quotient::encode(&mut formula, self.quotient, self.lift, self.depth);

        let (quotient, lift) = (self.quotient, self.lift);
        run(formula, engine, |formula, engine| {
            extract::arborescence(formula, engine, quotient, lift)
        })
    }
}

// feed, announce, solve, decode
fn run<T>(
    formula: Formula,
    engine: &mut dyn Engine,
    decode: impl FnOnce(&Formula, &dyn Engine) -> Result<T, Error>,
) -> Result<T, Error> {
    engine.reserve(formula.num_vars());
    for clause in formula.clauses() {
        engine.add_clause(clause);
    }
    tracing::debug!(
        variables = formula.num_vars(),
        clauses = formula.num_clauses(),
        "formula encoded, handing to the engine"
    );

    match engine.solve() {
        Verdict::Sat => decode(&formula, &*engine),
        Verdict::Unsat => Err(match formula.poison_reason() {
            Some(reason) => Error::Impossible(reason.to_owned()),
            None => Error::Unsatisfiable,
        }),
        Verdict::Unknown => Err(Error::Exhausted),
    }
}
