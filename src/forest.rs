//! CNF encoding of rooted spanning forests by per-node parent selection.
//!
//! Every non-excluded node gets one candidate parent variable per compatible
//! neighbor. Roots renounce all of theirs; fixed nodes commit to exactly one;
//! free nodes tie parenthood to a one-hot group membership. Parent edges pull
//! membership along them, so each claimed component is one tree hanging from
//! its group's root, and a cycle-elimination order over the parent relation
//! rules out orphaned rings.

use itertools::Itertools;
use unordered_pair::UnorderedPair;

use crate::formula::{Formula, Key, Lit};
use crate::net::{GroupId, Membership, Net, NodeId};

/// Which cycle-elimination order the forest encoder emits over parent edges.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Order {
    /// Binary level counters with a strictly-greater comparator rail per
    /// parent edge. Fewest variables; the default.
    #[default]
    Levels,
    /// Unary depth chains, one `dist >= d` ladder per node. More variables,
    /// but the chain value tracks the parent-chain depth exactly.
    Chains,
}

pub(crate) fn encode(formula: &mut Formula, net: &Net, order: Order, cover_all: bool) {
    let members = net.nodes()
        .filter(|node| net.membership(*node) != Membership::Excluded)
        .collect_vec();
    let groups = net.roots().keys().copied().collect_vec();

    for &node in &members {
        parent_choice(formula, net, node, &groups, cover_all);
    }
    anti_parallel(formula, net);
    kept_edges(formula, net);

    match order {
        Order::Levels => levels(formula, net, &members),
        Order::Chains => chains(formula, net, &members),
    }
}

// compatible neighbors, i.e. the nodes a parent variable is worth creating for
fn candidates(net: &Net, node: NodeId) -> Vec<NodeId> {
    net.neighbors(node).filter(|other| net.compatible(node, *other)).collect_vec()
}

fn parent_choice(formula: &mut Formula, net: &Net, node: NodeId, groups: &[GroupId], cover_all: bool) {
    let candidates = candidates(net, node);

    // free nodes claim membership through a one-hot; fixed nodes are known
    let member_lits = match net.membership(node) {
        Membership::Free => {
            let lits = groups.iter()
                .map(|&group| formula.var(Key::Member { node, group }).positive())
                .collect_vec();
            formula.at_most_one(&lits);
            if cover_all {
                formula.add_clause(lits.iter().copied());
            }
            lits
        }
        _ => Vec::new(),
    };

    let parent_lits = candidates.iter()
        .map(|&parent| formula.var(Key::Parent { child: node, parent }).positive())
        .collect_vec();

    if net.is_root(node) {
        // the root of a tree hangs from nothing
        for &lit in &parent_lits {
            formula.add_clause([!lit]);
        }
        return;
    }

    formula.at_most_one(&parent_lits);

    match net.membership(node) {
        Membership::Fixed(_) => {
            if parent_lits.is_empty() {
                formula.poison(format!("fixed node {node} has no usable neighbor"));
            } else {
                formula.add_clause(parent_lits.iter().copied());
            }
        }
        Membership::Free => {
            // membership demands a parent within the group
            let mut stranded = 0;
            for (&group, &member) in groups.iter().zip(&member_lits) {
                let support = candidates.iter()
                    .filter(|&&parent| net.may_join(parent, group))
                    .map(|&parent| formula.var(Key::Parent { child: node, parent }).positive())
                    .collect_vec();
                if support.is_empty() {
                    formula.add_clause([!member]);
                    stranded += 1;
                } else {
                    formula.add_clause([!member].into_iter().chain(support));
                }
            }
            if cover_all && stranded == groups.len() {
                formula.poison(format!("node {node} cannot join any group"));
            }
        }
        Membership::Excluded => unreachable!(),
    }

    // membership travels along parent edges
    for &parent in &candidates {
        let par = formula.var(Key::Parent { child: node, parent }).positive();
        match (net.membership(node), net.membership(parent)) {
            (Membership::Fixed(group), Membership::Free) => {
                let member = formula.var(Key::Member { node: parent, group });
                formula.implies(par, member.positive());
            }
            (Membership::Free, Membership::Fixed(group)) => {
                let member = formula.var(Key::Member { node, group });
                formula.implies(par, member.positive());
            }
            (Membership::Free, Membership::Free) => {
                // par => (member(child, g) <=> member(parent, g)) for every g
                for &group in groups {
                    let mine = formula.var(Key::Member { node, group }).positive();
                    let theirs = formula.var(Key::Member { node: parent, group }).positive();
                    formula.add_clause([!par, !mine, theirs]);
                    formula.add_clause([!par, mine, !theirs]);
                }
                // and a parent without any membership is no parent at all
                formula.add_clause([!par].into_iter().chain(member_lits.iter().copied()));
            }
            // both fixed to the same group, or the candidate is dead weight
            _ => {}
        }
    }
}

// u adopting w forbids w adopting u; cycles of length two never reach the order
fn anti_parallel(formula: &mut Formula, net: &Net) {
    for UnorderedPair(a, b) in net.edges().collect_vec() {
        if !net.compatible(a, b) {
            continue;
        }
        let forth = formula.var(Key::Parent { child: a, parent: b });
        let back = formula.var(Key::Parent { child: b, parent: a });
        formula.add_clause([forth.negative(), back.negative()]);
    }
}

// kept(e) <=> some parent edge runs along e; mismatched or excluded edges
// collapse to a unit refutation
fn kept_edges(formula: &mut Formula, net: &Net) {
    for pair in net.edges().collect_vec() {
        let UnorderedPair(a, b) = pair;
        let kept = formula.var(Key::Kept(pair));

        if !net.compatible(a, b) {
            formula.add_clause([kept.negative()]);
            continue;
        }

        let forth = formula.var(Key::Parent { child: a, parent: b }).positive();
        let back = formula.var(Key::Parent { child: b, parent: a }).positive();
        formula.implies(forth, kept.positive());
        formula.implies(back, kept.positive());
        formula.add_clause([kept.negative(), forth, back]);
    }
}

// directed parent edges worth constraining: child not a root, variable exists
fn live_parent_edges(formula: &Formula, net: &Net) -> Vec<(NodeId, NodeId, Lit)> {
    net.nodes()
        .filter(|node| net.membership(*node) != Membership::Excluded && !net.is_root(*node))
        .flat_map(|child| {
            candidates(net, child).into_iter().filter_map(move |parent| {
                Some((child, parent, parent_lookup(formula, child, parent)?))
            })
        })
        .collect_vec()
}

fn parent_lookup(formula: &Formula, child: NodeId, parent: NodeId) -> Option<Lit> {
    formula.lookup(Key::Parent { child, parent }).map(|var| var.positive())
}

/// Binary level counters: each member carries `bits` level bits, and every
/// live parent edge asserts child level strictly greater than parent level
/// through a most-significant-first comparator rail.
fn levels(formula: &mut Formula, net: &Net, members: &[NodeId]) {
    if members.len() <= 1 {
        return;
    }
    let bits = u32::BITS - ((members.len() - 1) as u32).leading_zeros();

    for &node in members {
        for bit in 0..bits {
            formula.var(Key::LevelBit { node, bit });
        }
    }

    for (child, parent, par) in live_parent_edges(formula, net) {
        // rail[j]: child and parent levels, restricted to bits j..0, compare strictly greater
        let rail = (0..bits).map(|_| formula.fresh()).collect_vec();
        formula.implies(par, rail[bits as usize - 1].positive());

        for j in (0..bits).rev() {
            let gt = rail[j as usize].negative();
            let mine = formula.var(Key::LevelBit { node: child, bit: j }).positive();
            let theirs = formula.var(Key::LevelBit { node: parent, bit: j }).positive();

            // gt => (mine * !theirs) + ((mine <=> theirs) * rail below)
            if j == 0 {
                formula.add_clause([gt, mine]);
                formula.add_clause([gt, !theirs]);
            } else {
                let below = rail[j as usize - 1].positive();
                formula.add_clause([gt, mine, below]);
                formula.add_clause([gt, !theirs, below]);
                formula.add_clause([gt, mine, !theirs]);
            }
        }
    }
}

/// Monotone `dist >= d` ladders for every node in `nodes`, up to and
/// including `cap`, with the top rung refuted. Callers pin the bottom rungs
/// and wire parent edges through the ladder themselves.
pub(crate) fn depth_chains(formula: &mut Formula, nodes: &[NodeId], cap: u32) {
    for &node in nodes {
        for bound in 1..=cap {
            formula.var(Key::DistAtLeast { node, bound });
        }
        for bound in 2..=cap {
            let higher = formula.var(Key::DistAtLeast { node, bound }).positive();
            let lower = formula.var(Key::DistAtLeast { node, bound: bound - 1 }).positive();
            formula.implies(higher, lower);
        }
        let top = formula.var(Key::DistAtLeast { node, bound: cap });
        formula.add_clause([top.negative()]);
    }
}

/// Unary chains: parent depth `d` forces child depth `d + 1` and conversely a
/// deep child forces a nearly-as-deep parent, so the chain value of every
/// node equals its parent-chain length; any cycle would climb past the cap.
fn chains(formula: &mut Formula, net: &Net, members: &[NodeId]) {
    if members.len() <= 1 {
        return;
    }
    let cap = members.len() as u32;
    depth_chains(formula, members, cap);

    for &node in members {
        match net.membership(node) {
            _ if net.is_root(node) => {
                let first = formula.var(Key::DistAtLeast { node, bound: 1 });
                formula.add_clause([first.negative()]);
            }
            Membership::Fixed(_) => {
                // always parented, so at least one step from the root
                let first = formula.var(Key::DistAtLeast { node, bound: 1 });
                formula.add_clause([first.positive()]);
            }
            _ => {}
        }
    }

    for (child, parent, par) in live_parent_edges(formula, net) {
        let first = formula.var(Key::DistAtLeast { node: child, bound: 1 });
        formula.add_clause([!par, first.positive()]);

        for d in 1..cap {
            let parent_at = formula.var(Key::DistAtLeast { node: parent, bound: d }).positive();
            let child_above = formula.var(Key::DistAtLeast { node: child, bound: d + 1 }).positive();
            formula.add_clause([!par, !parent_at, child_above]);
            formula.add_clause([!par, !child_above, parent_at]);
        }
    }
}
