//! Arborescences over a covering graph, chosen in the quotient.
//!
//! The caller describes a small quotient multigraph and a covering lift of
//! it: every lifted node names, per incident quotient edge, the lifted
//! neighbors realizing that edge at its own copy. Each quotient class then
//! picks exactly one incident edge, every non-root preimage of the class
//! takes its parent through a slot of the picked edge, and unary depth
//! chains over the lift keep the parent relation a spanning arborescence
//! rooted at the designated lifted root.
//!
//! When a slot holds exactly one neighbor the choice lifts as a
//! biconditional; wider slots fall back to one-of plus a has-parent
//! indicator. A choice some preimage cannot realize at all is refuted
//! outright, since the choice must lift uniformly.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;
use petgraph::graphmap::UnGraphMap;
use unordered_pair::UnorderedPair;

use crate::formula::{Formula, Key};
use crate::forest::depth_chains;
use crate::net::NodeId;
use crate::reach::{self, AdjacencyFloor};
use crate::session::Error;

/// Identifies a class (node) of the quotient multigraph.
pub type ClassId = u32;

/// One edge of the quotient multigraph. Parallel edges between the same two
/// classes are distinct and addressed by index.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct QuotientEdge {
    /// The two classes the edge connects; a self-edge repeats one class.
    pub ends: UnorderedPair<ClassId>,
    /// The geometry supplier's transform tag, carried through untouched. The
    /// slots of a [`Lift`] spell out what it means; nothing here reads it.
    pub transform: u32,
}

/// The quotient multigraph: classes and indexed edges.
#[derive(Clone, Debug, Default)]
pub struct Quotient {
    classes: Vec<ClassId>,
    edges: Vec<QuotientEdge>,
}

impl Quotient {
    /// An empty quotient.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class.
    pub fn add_class(&mut self, class: ClassId) -> &mut Self {
        self.classes.push(class);
        self
    }

    /// Add an edge between `a` and `b` (possibly equal) carrying `transform`,
    /// returning its index.
    pub fn add_edge(&mut self, a: ClassId, b: ClassId, transform: u32) -> usize {
        self.edges.push(QuotientEdge { ends: UnorderedPair(a, b), transform });
        self.edges.len() - 1
    }

    /// The classes, in insertion order.
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    /// The edges, by index.
    pub fn edges(&self) -> &[QuotientEdge] {
        &self.edges
    }

    // indices of edges incident to `class`, ascending
    pub(crate) fn incident(&self, class: ClassId) -> Vec<usize> {
        self.edges.iter()
            .positions(|edge| edge.ends.0 == class || edge.ends.1 == class)
            .collect_vec()
    }

    // the class across `edge` from `class`
    fn across(&self, edge: usize, class: ClassId) -> ClassId {
        let UnorderedPair(a, b) = self.edges[edge].ends;
        if a == class { b } else { a }
    }
}

/// A covering graph over a [`Quotient`]: lifted nodes tagged with their
/// class, a designated lifted root, and per-(node, edge) neighbor slots
/// spelling out how each quotient edge lands at each copy.
#[derive(Clone, Debug)]
pub struct Lift {
    nodes: Vec<(NodeId, ClassId)>,
    root: NodeId,
    slots: BTreeMap<(NodeId, usize), Vec<NodeId>>,
}

impl Lift {
    /// An empty lift rooted at `root`; add the root like any other node.
    pub fn new(root: NodeId) -> Self {
        Self {
            nodes: Vec::new(),
            root,
            slots: BTreeMap::new(),
        }
    }

    /// Add a lifted node belonging to `class`.
    pub fn add_node(&mut self, node: NodeId, class: ClassId) -> &mut Self {
        self.nodes.push((node, class));
        self
    }

    /// Record that quotient edge `edge` lands at `node` as the lifted
    /// neighbor `neighbor`. A self-edge of the quotient usually lands twice,
    /// once per direction of its transform.
    pub fn add_slot(&mut self, node: NodeId, edge: usize, neighbor: NodeId) -> &mut Self {
        self.slots.entry((node, edge)).or_default().push(neighbor);
        self
    }

    /// The lifted nodes with their classes, in insertion order.
    pub fn nodes(&self) -> &[(NodeId, ClassId)] {
        &self.nodes
    }

    /// The designated root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The lifted neighbors recorded for quotient edge `edge` at `node`.
    pub fn slots_at(&self, node: NodeId, edge: usize) -> &[NodeId] {
        self.slots.get(&(node, edge)).map_or(&[], Vec::as_slice)
    }

    // the lift as a plain undirected graph, edges in slot order
    pub(crate) fn graph(&self, edge_count: usize) -> UnGraphMap<NodeId, ()> {
        let mut graph = UnGraphMap::new();
        for &(node, _) in &self.nodes {
            graph.add_node(node);
        }
        for &(node, _) in &self.nodes {
            for edge in 0..edge_count {
                for &neighbor in self.slots_at(node, edge) {
                    graph.add_edge(node, neighbor, ());
                }
            }
        }
        graph
    }
}

/// Required parent-chain depth of one lifted target node.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Depth {
    /// Parent-chain depth at least this many hops.
    AtLeast(u32),
    /// Parent-chain depth of exactly `hops`.
    Exactly {
        /// How many parent steps separate the target from the root.
        hops: u32,
        /// Also enforce the demand through the kept-edge reachability
        /// encoding, so the breadth-first read-back provably agrees with
        /// the chain value instead of taking it on faith.
        certified: bool,
    },
}

pub(crate) fn validate(quotient: &Quotient, lift: &Lift) -> Result<(), Error> {
    if quotient.classes.is_empty() {
        return Err(Error::Invalid("the quotient has no classes".into()));
    }
    let mut classes = HashSet::new();
    for &class in &quotient.classes {
        if !classes.insert(class) {
            return Err(Error::Invalid(format!("class {class} appears twice")));
        }
    }
    for (index, edge) in quotient.edges.iter().enumerate() {
        let UnorderedPair(a, b) = edge.ends;
        if !classes.contains(&a) || !classes.contains(&b) {
            return Err(Error::Invalid(format!("edge {index} joins unknown classes")));
        }
    }

    if lift.nodes.is_empty() {
        return Err(Error::Invalid("the lift has no nodes".into()));
    }
    let mut class_of = HashMap::new();
    for &(node, class) in &lift.nodes {
        if class_of.insert(node, class).is_some() {
            return Err(Error::Invalid(format!("lifted node {node} appears twice")));
        }
        if !classes.contains(&class) {
            return Err(Error::Invalid(format!("lifted node {node} belongs to unknown class {class}")));
        }
    }
    if !class_of.contains_key(&lift.root) {
        return Err(Error::Invalid(format!("root {} is not a lifted node", lift.root)));
    }

    for (&(node, edge), neighbors) in &lift.slots {
        let class = match class_of.get(&node) {
            None => return Err(Error::Invalid(format!("slot on unknown node {node}"))),
            Some(class) => *class,
        };
        if edge >= quotient.edges.len() {
            return Err(Error::Invalid(format!("slot on node {node} names unknown edge {edge}")));
        }
        let UnorderedPair(a, b) = quotient.edges[edge].ends;
        if a != class && b != class {
            return Err(Error::Invalid(format!("edge {edge} is not incident to the class of node {node}")));
        }
        let expected = quotient.across(edge, class);
        for &neighbor in neighbors {
            match class_of.get(&neighbor) {
                None => {
                    return Err(Error::Invalid(format!("slot on node {node} names unknown neighbor {neighbor}")));
                }
                Some(&found) if found != expected => {
                    return Err(Error::Invalid(format!(
                        "slot on node {node} lands in class {found}, edge {edge} demands {expected}"
                    )));
                }
                _ => {}
            }
        }
    }

    Ok(())
}

pub(crate) fn encode(
    formula: &mut Formula,
    quotient: &Quotient,
    lift: &Lift,
    depth: Option<(NodeId, Depth)>,
) {
    let root = lift.root;

    // every class routes through exactly one of its incident edges; the
    // root's class chooses too, its preimages other than the root still obey
    for &class in &quotient.classes {
        let incident = quotient.incident(class);
        if incident.is_empty() {
            let orphaned = lift.nodes.iter().any(|&(node, c)| c == class && node != root);
            if orphaned {
                formula.poison(format!("class {class} has no incident edges"));
            }
            continue;
        }
        let choices = incident.iter()
            .map(|&edge| formula.var(Key::Choose { class, edge }).positive())
            .collect_vec();
        formula.exactly_one(&choices);
    }

    // lift the chosen edge to parent selection at every non-root preimage
    for &(node, class) in &lift.nodes {
        if node == root {
            continue;
        }

        let mut all_parents = Vec::new();
        let mut any_wide = false;

        for edge in quotient.incident(class) {
            let choose = formula.var(Key::Choose { class, edge }).positive();
            let slots = lift.slots_at(node, edge);

            match slots.len() {
                // the choice must lift uniformly; a preimage with nowhere to
                // go vetoes the edge for the whole class
                0 => formula.add_clause([!choose]),
                1 => {
                    let par = formula
                        .var(Key::Parent { child: node, parent: slots[0] })
                        .positive();
                    formula.implies(choose, par);
                    formula.implies(par, choose);
                    all_parents.push(par);
                }
                _ => {
                    any_wide = true;
                    let pars = slots.iter()
                        .map(|&parent| formula.var(Key::Parent { child: node, parent }).positive())
                        .collect_vec();
                    formula.add_clause([!choose].into_iter().chain(pars.iter().copied()));
                    for &par in &pars {
                        formula.implies(par, choose);
                    }
                    formula.at_most_one(&pars);
                    all_parents.extend(pars);
                }
            }
        }

        // wide slots leave "some parent" implicit; the indicator makes it a unit
        if any_wide {
            let has_parent = formula.var(Key::HasParent { node }).positive();
            for &par in &all_parents {
                formula.implies(par, has_parent);
            }
            formula.add_clause([!has_parent].into_iter().chain(all_parents.iter().copied()));
            formula.add_clause([has_parent]);
        }
    }

    kept_edges(formula, quotient, lift);
    depth_ladder(formula, quotient, lift, depth);
}

// kept(e) <=> a parent step runs along e, for every lifted slot edge
fn kept_edges(formula: &mut Formula, quotient: &Quotient, lift: &Lift) {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for &(node, _) in &lift.nodes {
        for edge in 0..quotient.edges.len() {
            for &neighbor in lift.slots_at(node, edge) {
                let pair = UnorderedPair(node, neighbor);
                if seen.insert(pair) {
                    pairs.push(pair);
                }
            }
        }
    }

    for pair in pairs {
        let UnorderedPair(a, b) = pair;
        let kept = formula.var(Key::Kept(pair));
        let steps = [
            formula.lookup(Key::Parent { child: a, parent: b }),
            formula.lookup(Key::Parent { child: b, parent: a }),
        ]
        .into_iter()
        .flatten()
        .map(|var| var.positive())
        .collect_vec();

        for &step in &steps {
            formula.implies(step, kept.positive());
        }
        formula.add_clause([kept.negative()].into_iter().chain(steps));
    }
}

fn depth_ladder(formula: &mut Formula, quotient: &Quotient, lift: &Lift, depth: Option<(NodeId, Depth)>) {
    let node_ids = lift.nodes.iter().map(|&(node, _)| node).collect_vec();
    let cap = node_ids.len() as u32;
    let root = lift.root;

    if cap > 1 {
        depth_chains(formula, &node_ids, cap);

        for &node in &node_ids {
            let first = formula.var(Key::DistAtLeast { node, bound: 1 });
            // everything except the root hangs off a parent
            formula.add_clause([first.lit(node != root)]);
        }

        for &(node, _) in &lift.nodes {
            if node == root {
                continue;
            }
            for edge in 0..quotient.edges.len() {
                for &parent in lift.slots_at(node, edge) {
                    let par = match formula.lookup(Key::Parent { child: node, parent }) {
                        None => continue,
                        Some(var) => var.positive(),
                    };
                    for d in 1..cap {
                        let parent_at = formula.var(Key::DistAtLeast { node: parent, bound: d }).positive();
                        let child_above = formula.var(Key::DistAtLeast { node, bound: d + 1 }).positive();
                        formula.add_clause([!par, !parent_at, child_above]);
                        formula.add_clause([!par, !child_above, parent_at]);
                    }
                }
            }
        }
    }

    let (target, rule) = match depth {
        None => return,
        Some(found) => found,
    };

    match rule {
        Depth::AtLeast(0) => {}
        Depth::AtLeast(_) if target == root => {
            formula.poison(format!("node {target} is the root of the lift, depth 0"));
        }
        Depth::AtLeast(hops) if hops >= cap => {
            formula.poison(format!("depth {hops} does not fit {cap} lifted nodes"));
        }
        Depth::AtLeast(hops) => {
            let at_least = formula.var(Key::DistAtLeast { node: target, bound: hops });
            formula.add_clause([at_least.positive()]);
        }
        Depth::Exactly { hops: 0, .. } => {
            if target != root {
                formula.poison(format!("only the root sits at depth 0, not node {target}"));
            }
        }
        Depth::Exactly { .. } if target == root => {
            formula.poison(format!("node {target} is the root of the lift, depth 0"));
        }
        Depth::Exactly { hops, .. } if hops >= cap => {
            formula.poison(format!("depth {hops} does not fit {cap} lifted nodes"));
        }
        Depth::Exactly { hops, certified } => {
            let at_least = formula.var(Key::DistAtLeast { node: target, bound: hops });
            formula.add_clause([at_least.positive()]);
            if hops + 1 < cap {
                let above = formula.var(Key::DistAtLeast { node: target, bound: hops + 1 });
                formula.add_clause([above.negative()]);
            }

            if certified {
                // pin the breadth-first distance as well, not just the chain
                let graph = lift.graph(quotient.edges.len());
                let floor = AdjacencyFloor::new(&graph, root);
                reach::encode(formula, &graph, root, &[(target, hops)], &[(target, hops)], &floor);
            }
        }
    }
}
