#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::num::NonZero;

    use unordered_pair::UnorderedPair;

    use crate::dpll::Search;
    use crate::extract::{Arborescence, Forest};
    use crate::forest::Order;
    use crate::lattice::{Lattice, Manhattan, Moves, Wrap};
    use crate::net::{Membership, Net, NodeId};
    use crate::quotient::{ClassId, Depth, Lift, Quotient};
    use crate::session::{CircuitProblem, Error, QuotientProblem, SpanningProblem};

    fn dims(w: u32, h: u32) -> (NonZero<u32>, NonZero<u32>) {
        (NonZero::new(w).unwrap(), NonZero::new(h).unwrap())
    }

    fn square(w: u32, h: u32) -> Lattice {
        Lattice::new(dims(w, h), Moves::Square, Wrap::Flat)
    }

    // every structural promise a forest makes, checked against its net
    fn assert_forest_valid(net: &Net, forest: &Forest) {
        for pair in net.edges() {
            let kept = forest.kept.contains(&pair);
            let blocked = forest.blocked.contains(&pair);
            assert!(kept != blocked, "edge {pair:?} must land in exactly one partition");
        }
        assert_eq!(forest.kept.len() + forest.blocked.len(), net.edge_count());

        for node in net.nodes() {
            if let Membership::Fixed(group) = net.membership(node) {
                assert_eq!(forest.membership.get(&node), Some(&group), "fixed node {node} unclaimed");
            }
        }

        for (&child, &parent) in &forest.parent {
            assert!(forest.keeps(child, parent), "parent step {child} -> {parent} not kept");
            assert_eq!(forest.membership.get(&child), forest.membership.get(&parent));
            assert_ne!(forest.parent.get(&parent), Some(&child), "mutual parents {child}, {parent}");
            assert_eq!(forest.distance[&child], forest.distance[&parent] + 1);
        }

        for &UnorderedPair(a, b) in &forest.kept {
            let step = forest.parent.get(&a) == Some(&b) || forest.parent.get(&b) == Some(&a);
            assert!(step, "kept edge {a}-{b} carries no parent step");
            assert_eq!(forest.membership.get(&a), forest.membership.get(&b));
        }

        // each claimed node hangs off its group's root by a finite chain, and
        // the reported distance is that chain's length
        for (&node, &group) in &forest.membership {
            let root = net.root_of(group).unwrap();
            let mut at = node;
            let mut hops = 0u32;
            while at != root {
                at = *forest
                    .parent
                    .get(&at)
                    .unwrap_or_else(|| panic!("chain from {node} dead-ends at {at}"));
                hops += 1;
                assert!(hops <= net.node_count() as u32, "chain from {node} never terminates");
            }
            assert_eq!(forest.distance.get(&node), Some(&hops));
        }

        for (&group, &root) in net.roots() {
            assert!(!forest.parent.contains_key(&root));
            assert_eq!(forest.distance.get(&root), Some(&0));
            assert_eq!(forest.membership.get(&root), Some(&group));
        }

        for node in net.nodes() {
            if !forest.membership.contains_key(&node) {
                assert!(!forest.parent.contains_key(&node), "unclaimed {node} holds a parent");
                assert!(!forest.distance.contains_key(&node));
            }
        }
    }

    fn assert_arborescence_valid(quotient: &Quotient, lift: &Lift, arbo: &Arborescence) {
        let root = lift.root();
        let class_of: HashMap<NodeId, ClassId> = lift.nodes().iter().copied().collect();

        for (&class, &edge) in &arbo.chosen {
            let ends = quotient.edges()[edge].ends;
            assert!(ends.0 == class || ends.1 == class, "class {class} chose a foreign edge");
        }

        for &(node, class) in lift.nodes() {
            if node == root {
                assert!(!arbo.parent.contains_key(&node));
                continue;
            }
            let parent = arbo.parent[&node];
            // the parent arrives through a slot of the class's chosen edge,
            // so the one choice really did lift to every preimage
            let edge = arbo.chosen[&class];
            assert!(
                lift.slots_at(node, edge).contains(&parent),
                "node {node} took parent {parent} outside chosen edge {edge}"
            );
            assert!(class_of.contains_key(&parent));
            assert!(arbo.kept.contains(&UnorderedPair(node, parent)));
            assert_eq!(arbo.depth[&node], arbo.depth[&parent] + 1);
        }

        assert_eq!(arbo.depth.get(&root), Some(&0));
        assert_eq!(arbo.depth.len(), lift.nodes().len(), "arborescence must span the lift");
        assert_eq!(arbo.parent.len(), lift.nodes().len() - 1);
    }

    // one class with one self-edge, lifting to a ring of `len` copies
    fn ring_lift(len: u32) -> (Quotient, Lift) {
        let mut quotient = Quotient::new();
        quotient.add_class(0);
        let edge = quotient.add_edge(0, 0, 1);

        let mut lift = Lift::new(0);
        for node in 0..len {
            lift.add_node(node, 0);
        }
        for node in 0..len {
            lift.add_slot(node, edge, (node + 1) % len);
            lift.add_slot(node, edge, (node + len - 1) % len);
        }
        (quotient, lift)
    }

    #[test]
    fn two_rooms_partition_the_grid() {
        let lattice = square(3, 3);
        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));
        net.set_root(1, lattice.node(2, 2));

        let forest = SpanningProblem::new(&net).cover_all().solve().unwrap();

        assert_forest_valid(&net, &forest);
        assert_eq!(forest.membership.len(), 9);
        let claimed_by = |group| forest.membership.values().filter(|&&g| g == group).count();
        assert!(claimed_by(0) >= 1);
        assert!(claimed_by(1) >= 1);
        assert_eq!(claimed_by(0) + claimed_by(1), 9);
    }

    #[test]
    fn lone_tree_spans_when_covering() {
        let lattice = square(3, 3);
        let mut net = lattice.net();
        net.set_root(0, lattice.node(1, 1));

        let forest = SpanningProblem::new(&net).cover_all().solve().unwrap();

        assert_forest_valid(&net, &forest);
        assert_eq!(forest.membership.len(), 9);
        // a spanning tree of nine nodes keeps eight of the twelve edges
        assert_eq!(forest.kept.len(), 8);
        assert_eq!(forest.blocked.len(), 4);
    }

    #[test]
    fn isolated_free_node_stays_unclaimed() {
        let mut net = Net::new();
        net.set_root(0, 0);
        net.add_edge(0, 1);
        net.add_node(2, Membership::Free);

        let forest = SpanningProblem::new(&net).solve().unwrap();

        assert_forest_valid(&net, &forest);
        assert!(!forest.membership.contains_key(&2));
        assert!(!forest.distance.contains_key(&2));
    }

    #[test]
    fn cover_all_rejects_the_unclaimable() {
        let mut net = Net::new();
        net.set_root(0, 0);
        net.add_edge(0, 1);
        net.add_node(2, Membership::Free);

        let err = SpanningProblem::new(&net).cover_all().solve().unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("cannot join any group")),
            other => panic!("expected Impossible, got {other:?}"),
        }
    }

    #[test]
    fn fixed_node_without_usable_neighbor_is_impossible() {
        let mut net = Net::new();
        net.set_root(0, 0);
        net.add_node(1, Membership::Fixed(0));
        net.add_node(2, Membership::Excluded);
        net.add_edge(1, 2);

        let err = SpanningProblem::new(&net).solve().unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("no usable neighbor")),
            other => panic!("expected Impossible, got {other:?}"),
        }
    }

    #[test]
    fn excluded_nodes_wall_off_their_edges() {
        // the middle of the top row is dead, so the tree must route around it
        let lattice = square(3, 2);
        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));
        net.add_node(lattice.node(1, 0), Membership::Excluded);
        net.add_node(lattice.node(2, 0), Membership::Fixed(0));

        let forest = SpanningProblem::new(&net).solve().unwrap();

        assert_forest_valid(&net, &forest);
        assert!(!forest.membership.contains_key(&lattice.node(1, 0)));
        // around the hole: down, across, across, up
        assert_eq!(forest.distance[&lattice.node(2, 0)], 4);
    }

    #[test]
    fn both_orders_build_valid_forests() {
        let lattice = square(3, 3);
        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));
        net.set_root(1, lattice.node(2, 0));

        for order in [Order::Levels, Order::Chains] {
            let forest = SpanningProblem::new(&net)
                .cover_all()
                .order(order)
                .solve_with(&mut Search::new())
                .unwrap();
            assert_forest_valid(&net, &forest);
            assert_eq!(forest.membership.len(), 9);
        }
    }

    #[test]
    fn minimum_distance_is_enforced_or_refuted() {
        // on a 2x2 block the far corner always sits two steps out
        let lattice = square(2, 2);
        let far = lattice.node(1, 1);

        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));
        net.add_node(far, Membership::Fixed(0));

        // one hop is below the true distance, so the demand costs nothing
        let forest = SpanningProblem::new(&net).minimum_distance(far, 1).solve().unwrap();
        assert_forest_valid(&net, &forest);

        let forest = SpanningProblem::new(&net).minimum_distance(far, 2).solve().unwrap();
        assert_forest_valid(&net, &forest);
        assert_eq!(forest.distance[&far], 2);

        let err = SpanningProblem::new(&net).minimum_distance(far, 3).solve().unwrap_err();
        assert!(matches!(err, Error::Unsatisfiable));
    }

    #[test]
    fn minimum_distance_winds_the_path() {
        // the straight run is six steps and lattice parity keeps every run
        // even, so asking for at least seven forces eight or more
        let lattice = square(4, 4);
        let far = lattice.node(3, 3);

        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));
        net.add_node(far, Membership::Fixed(0));

        let forest = SpanningProblem::new(&net).minimum_distance(far, 7).solve().unwrap();
        assert_forest_valid(&net, &forest);
        assert!(forest.distance[&far] >= 8);
    }

    #[test]
    fn distance_demands_on_separate_groups_coexist() {
        // two six-rings meeting only at node 20, which is fixed to the first
        // group; each demand winds its own ring the long way around, and the
        // rails measured from one root must not speak for the other
        let mut net = Net::new();
        for offset in [0, 10] {
            for node in 0..6 {
                net.add_edge(offset + node, offset + (node + 1) % 6);
            }
        }
        net.set_root(0, 0);
        net.set_root(1, 10);
        for node in 1..6 {
            net.add_node(node, Membership::Fixed(0));
            net.add_node(10 + node, Membership::Fixed(1));
        }
        net.add_node(20, Membership::Fixed(0));
        net.add_edge(20, 0);
        net.add_edge(20, 10);

        let forest = SpanningProblem::new(&net)
            .minimum_distance(1, 2)
            .minimum_distance(11, 2)
            .solve()
            .unwrap();

        assert_forest_valid(&net, &forest);
        assert_eq!(forest.distance[&1], 5);
        assert_eq!(forest.distance[&11], 5);
        // the meeting point hangs off its own root; the cross edge is a wall
        assert_eq!(forest.distance[&20], 1);
        assert!(forest.blocked.contains(&UnorderedPair(20, 10)));
    }

    #[test]
    fn manhattan_floor_prunes_without_changing_answers() {
        let lattice = square(4, 4);
        let far = lattice.node(3, 3);

        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));
        net.add_node(far, Membership::Fixed(0));

        let forest = SpanningProblem::new(&net)
            .minimum_distance(far, 7)
            .with_floor(&Manhattan(lattice))
            .solve()
            .unwrap();
        assert_forest_valid(&net, &forest);
        assert!(forest.distance[&far] >= 7);
    }

    #[test]
    fn distance_past_the_node_count_is_impossible() {
        let lattice = square(2, 2);
        let far = lattice.node(1, 1);

        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));
        net.add_node(far, Membership::Fixed(0));

        let err = SpanningProblem::new(&net).minimum_distance(far, 5).solve().unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("usable nodes")),
            other => panic!("expected Impossible, got {other:?}"),
        }
    }

    #[test]
    fn distance_on_a_root_is_impossible() {
        let lattice = square(2, 2);
        let root = lattice.node(0, 0);

        let mut net = lattice.net();
        net.set_root(0, root);

        let err = SpanningProblem::new(&net).minimum_distance(root, 1).solve().unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("root")),
            other => panic!("expected Impossible, got {other:?}"),
        }
    }

    #[test]
    fn distance_targets_must_be_fixed_nodes() {
        let lattice = square(2, 2);
        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));

        let err = SpanningProblem::new(&net)
            .minimum_distance(lattice.node(1, 1), 2)
            .solve()
            .unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));

        let err = SpanningProblem::new(&net).minimum_distance(99, 1).solve().unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn malformed_nets_never_reach_the_engine() {
        let err = SpanningProblem::new(&Net::new()).solve().unwrap_err();
        match err {
            Error::Invalid(reason) => assert!(reason.contains("no nodes")),
            other => panic!("expected Invalid, got {other:?}"),
        }

        let mut rootless = Net::new();
        rootless.add_edge(0, 1);
        let err = SpanningProblem::new(&rootless).solve().unwrap_err();
        match err {
            Error::Invalid(reason) => assert!(reason.contains("no group root")),
            other => panic!("expected Invalid, got {other:?}"),
        }

        let mut stolen = Net::new();
        stolen.set_root(0, 5);
        stolen.add_node(5, Membership::Fixed(1));
        stolen.set_root(1, 6);
        let err = SpanningProblem::new(&stolen).solve().unwrap_err();
        match err {
            Error::Invalid(reason) => assert!(reason.contains("claimed elsewhere")),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn engines_agree_on_satisfiability() {
        let lattice = square(2, 2);
        let far = lattice.node(1, 1);

        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));
        net.add_node(far, Membership::Fixed(0));

        let native = SpanningProblem::new(&net)
            .minimum_distance(far, 2)
            .solve_with(&mut Search::new())
            .unwrap();
        assert_forest_valid(&net, &native);
        assert_eq!(native.distance[&far], 2);

        let err = SpanningProblem::new(&net)
            .minimum_distance(far, 3)
            .solve_with(&mut Search::new())
            .unwrap_err();
        assert!(matches!(err, Error::Unsatisfiable));
    }

    #[test]
    fn a_dry_budget_reports_exhaustion() {
        let lattice = square(3, 3);
        let mut net = lattice.net();
        net.set_root(0, lattice.node(0, 0));
        net.set_root(1, lattice.node(2, 2));

        let err = SpanningProblem::new(&net)
            .cover_all()
            .solve_with(&mut Search::with_budget(0))
            .unwrap_err();
        assert!(matches!(err, Error::Exhausted));
    }

    #[test]
    fn circuit_rings_the_whole_torus() {
        // nine cells, fully wrapped; a row snake with wrapped descents closes
        // through all of them
        let lattice = Lattice::new(dims(3, 3), Moves::Square, Wrap::Torus);
        let net = lattice.net();
        let start = lattice.node(0, 0);

        let walk = CircuitProblem::new(&net, start, 9).solve().unwrap();

        assert_eq!(walk.path.len(), 10);
        assert_eq!(walk.path[0], start);
        assert_eq!(walk.path[9], start);

        let mut interior = walk.path[1..9].to_vec();
        interior.sort_unstable();
        interior.dedup();
        assert_eq!(interior.len(), 8, "interior nodes must be distinct");

        for pair in walk.path.windows(2) {
            assert!(
                net.neighbors(pair[0]).any(|n| n == pair[1]),
                "walk steps over a non-edge {}-{}",
                pair[0],
                pair[1]
            );
        }
        assert_eq!(walk.edges.len(), 9);
    }

    #[test]
    fn circuit_cannot_outgrow_the_net() {
        let lattice = Lattice::new(dims(3, 3), Moves::Square, Wrap::Torus);
        let net = lattice.net();

        let err = CircuitProblem::new(&net, lattice.node(0, 0), 10).solve().unwrap_err();
        assert!(matches!(err, Error::Unsatisfiable));
    }

    #[test]
    fn circuit_validates_its_request() {
        let lattice = square(2, 2);
        let net = lattice.net();

        let err = CircuitProblem::new(&net, lattice.node(0, 0), 1).solve().unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));

        let err = CircuitProblem::new(&net, 44, 4).solve().unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));

        let mut walled = lattice.net();
        walled.add_node(lattice.node(0, 0), Membership::Excluded);
        let err = CircuitProblem::new(&walled, lattice.node(0, 0), 4).solve().unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn circuit_with_a_stranded_start_is_impossible() {
        let mut net = Net::new();
        net.add_node(0, Membership::Free);
        net.add_node(1, Membership::Free);

        let err = CircuitProblem::new(&net, 0, 2).solve().unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("no usable neighbors")),
            other => panic!("expected Impossible, got {other:?}"),
        }
    }

    #[test]
    fn king_circuit_uses_diagonals() {
        // 2x2 with king moves is a complete graph, so a triangle fits
        let lattice = Lattice::new(dims(2, 2), Moves::King, Wrap::Flat);
        let net = lattice.net();

        let walk = CircuitProblem::new(&net, lattice.node(0, 0), 3).solve().unwrap();
        assert_eq!(walk.path.len(), 4);
    }

    #[test]
    fn quotient_ring_unrolls_to_an_arborescence() {
        let (quotient, lift) = ring_lift(6);

        let arbo = QuotientProblem::new(&quotient, &lift).solve().unwrap();

        assert_arborescence_valid(&quotient, &lift, &arbo);
        assert_eq!(arbo.chosen.len(), 1);
        assert_eq!(arbo.kept.len(), 5);
        // the one ring edge not kept is the break
        assert_eq!(arbo.blocked.len(), 1);
    }

    #[test]
    fn quotient_ring_solves_with_the_native_engine() {
        let (quotient, lift) = ring_lift(5);

        let arbo = QuotientProblem::new(&quotient, &lift)
            .solve_with(&mut Search::new())
            .unwrap();
        assert_arborescence_valid(&quotient, &lift, &arbo);
    }

    #[test]
    fn ring_depth_demands_shape_the_break() {
        let (quotient, lift) = ring_lift(6);

        // node 1 sits five steps out only if the ring breaks right at the
        // root, so the model is unique
        let arbo = QuotientProblem::new(&quotient, &lift)
            .depth(1, Depth::Exactly { hops: 5, certified: true })
            .solve()
            .unwrap();
        assert_arborescence_valid(&quotient, &lift, &arbo);
        assert_eq!(arbo.depth[&1], 5);
        assert!(!arbo.kept.contains(&UnorderedPair(0, 1)));

        // the node opposite the root is three steps out in every arborescence
        let arbo = QuotientProblem::new(&quotient, &lift)
            .depth(3, Depth::AtLeast(3))
            .solve()
            .unwrap();
        assert_eq!(arbo.depth[&3], 3);

        let err = QuotientProblem::new(&quotient, &lift)
            .depth(3, Depth::AtLeast(4))
            .solve()
            .unwrap_err();
        assert!(matches!(err, Error::Unsatisfiable));
    }

    #[test]
    fn uncertified_exact_depth_still_pins_the_distance() {
        let (quotient, lift) = ring_lift(6);

        // no reachability rail, yet the breadth-first read-back has to land
        // on the requested value
        let arbo = QuotientProblem::new(&quotient, &lift)
            .depth(2, Depth::Exactly { hops: 4, certified: false })
            .solve()
            .unwrap();
        assert_arborescence_valid(&quotient, &lift, &arbo);
        assert_eq!(arbo.depth[&2], 4);
        assert_eq!(arbo.blocked.len(), 1);
    }

    #[test]
    fn quotient_depth_requests_out_of_range_are_impossible() {
        let (quotient, lift) = ring_lift(4);

        let err = QuotientProblem::new(&quotient, &lift)
            .depth(1, Depth::AtLeast(4))
            .solve()
            .unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("does not fit")),
            other => panic!("expected Impossible, got {other:?}"),
        }

        let err = QuotientProblem::new(&quotient, &lift)
            .depth(1, Depth::Exactly { hops: 0, certified: false })
            .solve()
            .unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("root")),
            other => panic!("expected Impossible, got {other:?}"),
        }

        // a nonzero demand on the root itself is diagnosed, not ground
        // through the engine
        let err = QuotientProblem::new(&quotient, &lift)
            .depth(0, Depth::AtLeast(2))
            .solve()
            .unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("root of the lift")),
            other => panic!("expected Impossible, got {other:?}"),
        }

        let err = QuotientProblem::new(&quotient, &lift)
            .depth(0, Depth::Exactly { hops: 1, certified: true })
            .solve()
            .unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("root of the lift")),
            other => panic!("expected Impossible, got {other:?}"),
        }
    }

    #[test]
    fn three_class_strip_lifts_uniformly() {
        // three classes in a ring; edge 2 steps into the next copy, so the
        // nine-node lift is one large cycle
        let mut quotient = Quotient::new();
        for class in 0..3 {
            quotient.add_class(class);
        }
        let e0 = quotient.add_edge(0, 1, 0);
        let e1 = quotient.add_edge(1, 2, 0);
        let e2 = quotient.add_edge(2, 0, 1);

        let node = |copy: u32, class: u32| 3 * copy + class;
        let mut lift = Lift::new(node(0, 0));
        for copy in 0..3 {
            for class in 0..3 {
                lift.add_node(node(copy, class), class);
            }
        }
        for copy in 0..3 {
            lift.add_slot(node(copy, 0), e0, node(copy, 1));
            lift.add_slot(node(copy, 1), e0, node(copy, 0));
            lift.add_slot(node(copy, 1), e1, node(copy, 2));
            lift.add_slot(node(copy, 2), e1, node(copy, 1));
            lift.add_slot(node(copy, 2), e2, node((copy + 1) % 3, 0));
            lift.add_slot(node(copy, 0), e2, node((copy + 2) % 3, 2));
        }

        let arbo = QuotientProblem::new(&quotient, &lift).solve().unwrap();

        assert_arborescence_valid(&quotient, &lift, &arbo);
        assert_eq!(arbo.chosen.len(), 3);
        assert_eq!(arbo.depth.len(), 9);
        assert_eq!(arbo.kept.len(), 8);
    }

    #[test]
    fn quotient_inputs_are_validated() {
        let (quotient, lift) = ring_lift(4);
        let err = QuotientProblem::new(&quotient, &lift)
            .depth(9, Depth::AtLeast(1))
            .solve()
            .unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));

        // a slot landing in the wrong class is caught before encoding
        let mut quotient = Quotient::new();
        quotient.add_class(0);
        quotient.add_class(1);
        let edge = quotient.add_edge(0, 1, 0);
        let mut lift = Lift::new(0);
        lift.add_node(0, 0);
        lift.add_node(1, 0);
        lift.add_slot(0, edge, 1);
        let err = QuotientProblem::new(&quotient, &lift).solve().unwrap_err();
        match err {
            Error::Invalid(reason) => assert!(reason.contains("lands in class")),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn orphaned_class_with_preimages_is_impossible() {
        let mut quotient = Quotient::new();
        quotient.add_class(0);
        quotient.add_class(7);
        let edge = quotient.add_edge(0, 0, 1);

        let mut lift = Lift::new(0);
        lift.add_node(0, 0);
        lift.add_node(1, 0);
        lift.add_node(2, 7);
        lift.add_slot(0, edge, 1);
        lift.add_slot(1, edge, 0);

        let err = QuotientProblem::new(&quotient, &lift).solve().unwrap_err();
        match err {
            Error::Impossible(reason) => assert!(reason.contains("no incident edges")),
            other => panic!("expected Impossible, got {other:?}"),
        }
    }

    #[test]
    fn torus_neighbors_wrap_fully() {
        let lattice = Lattice::new(dims(3, 3), Moves::Square, Wrap::Torus);
        let net = lattice.net();
        for node in net.nodes() {
            assert_eq!(net.neighbors(node).count(), 4, "node {node} misses wrap edges");
        }

        let flat = square(3, 3).net();
        assert_eq!(flat.neighbors(0).count(), 2);
        assert_eq!(flat.neighbors(4).count(), 4);
    }

    #[test]
    fn king_moves_reach_diagonals() {
        let lattice = Lattice::new(dims(2, 2), Moves::King, Wrap::Flat);
        let net = lattice.net();
        for node in net.nodes() {
            assert_eq!(net.neighbors(node).count(), 3);
        }
    }

    #[test]
    fn render_opens_exactly_the_kept_walls() {
        let lattice = square(2, 2);
        let mut net = lattice.net();
        // group ten renders as the letter a
        net.set_root(10, lattice.node(0, 0));

        let forest = SpanningProblem::new(&net).cover_all().solve().unwrap();
        let drawn = lattice.render(&net, &forest);

        let lines: Vec<&str> = drawn.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|line| line.len() == 5));
        assert_eq!(lines[0], "#####");
        assert_eq!(drawn.matches('A').count(), 1);
        assert_eq!(drawn.matches('a').count(), 3);
        // a spanning tree of four cells knocks through three walls
        assert_eq!(drawn.matches(' ').count(), 3);
    }
}
