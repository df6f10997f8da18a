use std::num::NonZero;

use espalier::{Lattice, Manhattan, Membership, Moves, SpanningProblem, Wrap};

fn main() {
    tracing_subscriber::fmt::init();

    // a 6x6 maze with two rooms: group 0 grows from the top left corner,
    // group 1 from the bottom right, and the top right corner is forced to
    // wind at least 9 steps away from its root
    let lattice = Lattice::new(
        (NonZero::new(6).unwrap(), NonZero::new(6).unwrap()),
        Moves::Square,
        Wrap::Flat,
    );
    let far = lattice.node(5, 0);

    let mut net = lattice.net();
    net.set_root(0, lattice.node(0, 0));
    net.set_root(1, lattice.node(5, 5));
    net.add_node(far, Membership::Fixed(0));
    net.add_node(lattice.node(0, 5), Membership::Fixed(1));

    let forest = SpanningProblem::new(&net)
        .cover_all()
        .minimum_distance(far, 9)
        .with_floor(&Manhattan(lattice))
        .solve()
        .unwrap();

    println!("{}", lattice.render(&net, &forest));
    println!(
        "cell (5, 0) sits {} steps from its root, 5 as the crow flies",
        forest.distance[&far]
    );
}
