//! Model read-back: from a satisfied engine to solution structs.
//!
//! Distances are never read off the SAT-side counters; they are recomputed
//! by breadth-first search over the kept edges, so the reported numbers are
//! facts about the decoded structure rather than echoes of the encoding.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use unordered_pair::UnorderedPair;

use crate::engine::Engine;
use crate::formula::{Formula, Key};
use crate::net::{GroupId, Membership, Net, NodeId};
use crate::quotient::{ClassId, Lift, Quotient};
use crate::session::Error;

/// A solved spanning forest over a [`Net`].
#[derive(Clone, Debug)]
pub struct Forest {
    /// The parent of every parented node.
    pub parent: HashMap<NodeId, NodeId>,
    /// The group claiming each claimed node, fixed nodes included.
    pub membership: HashMap<NodeId, GroupId>,
    /// Edges carrying a parent step.
    pub kept: HashSet<UnorderedPair<NodeId>>,
    /// Edges carrying none; walls, in maze terms.
    pub blocked: HashSet<UnorderedPair<NodeId>>,
    /// BFS distance over kept edges from the owning group's root, for every
    /// claimed node.
    pub distance: HashMap<NodeId, u32>,
}

impl Forest {
    /// Whether the edge between `a` and `b` survived.
    pub fn keeps(&self, a: NodeId, b: NodeId) -> bool {
        self.kept.contains(&UnorderedPair(a, b))
    }
}

/// A solved fixed-length closed walk.
#[derive(Clone, Debug)]
pub struct Walk {
    /// Nodes in walk order; the first and last entry are both the start.
    pub path: Vec<NodeId>,
    /// The edge crossed at each step, one per consecutive pair of `path`.
    pub edges: Vec<UnorderedPair<NodeId>>,
}

/// A solved arborescence over a [`Lift`].
#[derive(Clone, Debug)]
pub struct Arborescence {
    /// The quotient edge each class routes through, for classes with any
    /// incident edge.
    pub chosen: BTreeMap<ClassId, usize>,
    /// The parent of every lifted node except the root.
    pub parent: HashMap<NodeId, NodeId>,
    /// Lifted edges carrying a parent step.
    pub kept: HashSet<UnorderedPair<NodeId>>,
    /// Lifted edges carrying none.
    pub blocked: HashSet<UnorderedPair<NodeId>>,
    /// BFS distance over kept edges from the lifted root.
    pub depth: HashMap<NodeId, u32>,
}

pub(crate) fn forest(formula: &Formula, engine: &dyn Engine, net: &Net) -> Forest {
    let mut parent = HashMap::new();
    let mut membership = HashMap::new();

    for node in net.nodes() {
        match net.membership(node) {
            Membership::Excluded => continue,
            Membership::Fixed(group) => {
                membership.insert(node, group);
            }
            Membership::Free => {
                for &group in net.roots().keys() {
                    let claimed = formula.lookup(Key::Member { node, group })
                        .is_some_and(|var| engine.value(var));
                    if claimed {
                        membership.insert(node, group);
                        break;
                    }
                }
            }
        }

        for other in net.neighbors(node) {
            let adopted = formula.lookup(Key::Parent { child: node, parent: other })
                .is_some_and(|var| engine.value(var));
            if adopted {
                parent.insert(node, other);
            }
        }
    }

    let (kept, blocked) = partition_edges(formula, engine, net.edges());

    let adjacency = kept_adjacency(&kept);
    let mut distance = HashMap::new();
    for &root in net.roots().values() {
        bfs_into(&adjacency, root, &mut distance);
    }

    Forest { parent, membership, kept, blocked, distance }
}

pub(crate) fn walk(
    formula: &Formula,
    engine: &dyn Engine,
    net: &Net,
    start: NodeId,
    span: u32,
) -> Result<Walk, Error> {
    let mut path = Vec::with_capacity(span as usize + 1);

    for step in 0..=span {
        let here = net.nodes()
            .filter(|node| net.membership(*node) != Membership::Excluded)
            .find(|&node| {
                formula.lookup(Key::Visit { step, node }).is_some_and(|var| engine.value(var))
            });
        match here {
            None => return Err(Error::Incoherent(format!("no node stands at walk step {step}"))),
            Some(node) => path.push(node),
        }
    }

    let edges = path.windows(2).map(|pair| UnorderedPair(pair[0], pair[1])).collect();
    Ok(Walk { path, edges })
}

pub(crate) fn arborescence(
    formula: &Formula,
    engine: &dyn Engine,
    quotient: &Quotient,
    lift: &Lift,
) -> Result<Arborescence, Error> {
    let mut chosen = BTreeMap::new();
    for &class in quotient.classes() {
        let incident = quotient.incident(class);
        if incident.is_empty() {
            continue;
        }
        let picked = incident.into_iter().find(|&edge| {
            formula.lookup(Key::Choose { class, edge }).is_some_and(|var| engine.value(var))
        });
        match picked {
            None => return Err(Error::Incoherent(format!("class {class} chose no edge"))),
            Some(edge) => {
                chosen.insert(class, edge);
            }
        }
    }

    let root = lift.root();
    let graph = lift.graph(quotient.edges().len());

    let mut parent = HashMap::new();
    for &(node, _) in lift.nodes() {
        if node == root {
            continue;
        }
        let adopted = graph.neighbors(node).find(|&other| {
            formula.lookup(Key::Parent { child: node, parent: other })
                .is_some_and(|var| engine.value(var))
        });
        match adopted {
            None => return Err(Error::Incoherent(format!("lifted node {node} has no parent"))),
            Some(other) => {
                parent.insert(node, other);
            }
        }
    }

    let edges = graph.all_edges().map(|(a, b, _)| UnorderedPair(a, b));
    let (kept, blocked) = partition_edges(formula, engine, edges);

    let adjacency = kept_adjacency(&kept);
    let mut depth = HashMap::new();
    bfs_into(&adjacency, root, &mut depth);

    Ok(Arborescence { chosen, parent, kept, blocked, depth })
}

fn partition_edges(
    formula: &Formula,
    engine: &dyn Engine,
    edges: impl Iterator<Item = UnorderedPair<NodeId>>,
) -> (HashSet<UnorderedPair<NodeId>>, HashSet<UnorderedPair<NodeId>>) {
    let mut kept = HashSet::new();
    let mut blocked = HashSet::new();
    for pair in edges {
        let surviving = formula.lookup(Key::Kept(pair)).is_some_and(|var| engine.value(var));
        if surviving {
            kept.insert(pair);
        } else {
            blocked.insert(pair);
        }
    }
    (kept, blocked)
}

fn kept_adjacency(kept: &HashSet<UnorderedPair<NodeId>>) -> HashMap<NodeId, Vec<NodeId>> {
    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for &UnorderedPair(a, b) in kept {
        adjacency.entry(a).or_default().push(b);
        adjacency.entry(b).or_default().push(a);
    }
    adjacency
}

fn bfs_into(adjacency: &HashMap<NodeId, Vec<NodeId>>, root: NodeId, distance: &mut HashMap<NodeId, u32>) {
    distance.insert(root, 0);
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        let here = distance[&node];
        let Some(neighbors) = adjacency.get(&node) else {
            continue;
        };
        for &next in neighbors {
            if !distance.contains_key(&next) {
                distance.insert(next, here + 1);
                queue.push_back(next);
            }
        }
    }
}
