//! CNF encoding of fixed-length simple closed walks.
//!
//! A walk touching `span` distinct nodes takes `span + 1` positions, with the
//! start pinned to both ends. Each interior position holds exactly one
//! non-start node, no non-start node appears at two interior positions, and
//! every occupied position is adjacency-consistent with the one before it.
//! Asking for more distinct nodes than exist leaves the one-hots nowhere to
//! go and the formula refutes itself; no special-casing.

use itertools::Itertools;

use crate::formula::{Formula, Key};
use crate::net::{Membership, Net, NodeId};

pub(crate) fn encode(formula: &mut Formula, net: &Net, start: NodeId, span: u32) {
    let usable = net.nodes()
        .filter(|node| net.membership(*node) != Membership::Excluded)
        .collect_vec();
    let others = usable.iter().copied().filter(|node| *node != start).collect_vec();

    if others.is_empty() {
        formula.poison("the walk has no nodes to visit besides the start");
        return;
    }

    // both ends of the walk stand on the start and nowhere else
    for &step in &[0, span] {
        for &node in &usable {
            let visit = formula.var(Key::Visit { step, node });
            formula.add_clause([visit.lit(node == start)]);
        }
    }

    for step in 1..span {
        let visit_start = formula.var(Key::Visit { step, node: start });
        formula.add_clause([visit_start.negative()]);

        let slots = others.iter()
            .map(|&node| formula.var(Key::Visit { step, node }).positive())
            .collect_vec();
        formula.exactly_one(&slots);
    }

    // each interior position follows an edge from the one before it;
    // at step 1 only neighbors of the start survive, since step 0 is pinned
    for step in 1..=span {
        let standing = if step < span { others.as_slice() } else { std::slice::from_ref(&start) };
        for &node in standing {
            let visit = formula.var(Key::Visit { step, node }).positive();
            let mut sources = vec![!visit];
            for via in net.neighbors(node).collect_vec() {
                if net.membership(via) == Membership::Excluded {
                    continue;
                }
                sources.push(formula.var(Key::Visit { step: step - 1, node: via }).positive());
            }
            formula.add_clause(sources);
        }
    }

    // simple: a non-start node is visited at most once
    for &node in &others {
        let occurrences = (1..span)
            .map(|step| formula.var(Key::Visit { step, node }).positive())
            .collect_vec();
        formula.at_most_one(&occurrences);
    }
}
