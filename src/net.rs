use std::collections::{BTreeMap, HashMap};

use petgraph::graphmap::UnGraphMap;
use unordered_pair::UnorderedPair;

use crate::session::Error;

/// Identifies a node of a [`Net`]. Lattice fixtures number row-major, but any
/// scheme works.
pub type NodeId = u32;

/// Identifies a group, i.e. one tree of the forest and the root that anchors it.
pub type GroupId = usize;

/// How a node relates to the groups before solving.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Membership {
    /// The node belongs to this group in every solution.
    Fixed(GroupId),
    /// The node may be claimed by any one group, or by none.
    #[default]
    Free,
    /// The node takes part in nothing; every edge at it is blocked.
    Excluded,
}

/// The undirected instance graph: nodes with [`Membership`], edges, and one
/// designated root node per group.
///
/// A `Net` carries no solving logic. Hand it to a
/// [`SpanningProblem`](crate::session::SpanningProblem) or
/// [`CircuitProblem`](crate::session::CircuitProblem) once built.
#[derive(Clone, Default)]
pub struct Net {
    graph: UnGraphMap<NodeId, ()>,
    membership: HashMap<NodeId, Membership>,
    roots: BTreeMap<GroupId, NodeId>,
}

impl Net {
    /// An empty net.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node` with `membership`, overwriting the membership if the node
    /// is already present.
    pub fn add_node(&mut self, node: NodeId, membership: Membership) -> &mut Self {
        self.graph.add_node(node);
        self.membership.insert(node, membership);
        self
    }

    /// Connect `a` and `b`. Endpoints not yet added join as [`Membership::Free`].
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> &mut Self {
        self.graph.add_edge(a, b, ());
        self
    }

    /// Designate `node` as the root of `group`, claiming it for the group.
    pub fn set_root(&mut self, group: GroupId, node: NodeId) -> &mut Self {
        self.add_node(node, Membership::Fixed(group));
        self.roots.insert(group, node);
        self
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.nodes()
    }

    /// Neighbors of `node`, in edge insertion order.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.neighbors(node)
    }

    /// All edges as unordered endpoint pairs.
    pub fn edges(&self) -> impl Iterator<Item = UnorderedPair<NodeId>> + '_ {
        self.graph.all_edges().map(|(a, b, _)| UnorderedPair(a, b))
    }

    /// Whether `node` is present.
    pub fn contains(&self, node: NodeId) -> bool {
        self.graph.contains_node(node)
    }

    /// The membership of `node`; nodes created implicitly by
    /// [`add_edge`](Self::add_edge) read as [`Membership::Free`].
    pub fn membership(&self, node: NodeId) -> Membership {
        self.membership.get(&node).copied().unwrap_or_default()
    }

    /// Designated roots by group, in ascending group order.
    pub fn roots(&self) -> &BTreeMap<GroupId, NodeId> {
        &self.roots
    }

    /// The root of `group`, if designated.
    pub fn root_of(&self, group: GroupId) -> Option<NodeId> {
        self.roots.get(&group).copied()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn graph(&self) -> &UnGraphMap<NodeId, ()> {
        &self.graph
    }

    pub(crate) fn is_root(&self, node: NodeId) -> bool {
        self.roots.values().any(|root| *root == node)
    }

    pub(crate) fn may_join(&self, node: NodeId, group: GroupId) -> bool {
        match self.membership(node) {
            Membership::Fixed(fixed) => fixed == group,
            Membership::Free => true,
            Membership::Excluded => false,
        }
    }

    // whether some group could claim both endpoints of an edge
    pub(crate) fn compatible(&self, a: NodeId, b: NodeId) -> bool {
        match (self.membership(a), self.membership(b)) {
            (Membership::Excluded, _) | (_, Membership::Excluded) => false,
            (Membership::Fixed(x), Membership::Fixed(y)) => x == y,
            _ => true,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.graph.node_count() == 0 {
            return Err(Error::Invalid("the net has no nodes".into()));
        }
        if self.roots.is_empty() {
            return Err(Error::Invalid("no group root is designated".into()));
        }

        for (&group, &root) in &self.roots {
            if !self.contains(root) {
                return Err(Error::Invalid(format!("root {root} of group {group} is not in the net")));
            }
            if self.membership(root) != Membership::Fixed(group) {
                return Err(Error::Invalid(format!("root {root} of group {group} is claimed elsewhere")));
            }
        }

        for node in self.graph.nodes() {
            if let Membership::Fixed(group) = self.membership(node) {
                if !self.roots.contains_key(&group) {
                    return Err(Error::Invalid(format!("node {node} is fixed to group {group}, which has no root")));
                }
            }
        }

        Ok(())
    }
}
