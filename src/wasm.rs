//! Browser surface: lattice problems in flat arrays, solutions out the same
//! way. Everything here is a thin shim over [`lattice`](crate::lattice) and
//! [`session`](crate::session); pairs are flattened two-by-two.

use js_sys::Uint32Array;
use wasm_bindgen::prelude::*;

use crate::lattice::{Dimension, Lattice, Moves, Wrap};
use crate::net::Membership;
use crate::session::{CircuitProblem, SpanningProblem};

fn dimension(value: u32) -> Result<Dimension, JsError> {
    Dimension::new(value).ok_or_else(|| JsError::new("lattice dimensions must be nonzero"))
}

fn shape(width: u32, height: u32, torus: bool, king: bool) -> Result<Lattice, JsError> {
    Ok(Lattice::new(
        (dimension(width)?, dimension(height)?),
        if king { Moves::King } else { Moves::Square },
        if torus { Wrap::Torus } else { Wrap::Flat },
    ))
}

/// Solve a spanning forest over a `width` by `height` lattice.
///
/// `roots` holds `(group, node)` pairs, `fixed` holds `(node, group)` pairs,
/// `excluded` holds bare nodes, and `rules` holds `(target, hops)` minimum
/// distance pairs. The response holds three words per cell, row-major:
/// claiming group plus one (zero when unclaimed), parent node, and root
/// distance, the latter two `u32::MAX` when absent.
#[wasm_bindgen]
pub fn solve_maze(
    width: u32,
    height: u32,
    torus: bool,
    king: bool,
    roots: &[u32],
    fixed: &[u32],
    excluded: &[u32],
    rules: &[u32],
    cover_all: bool,
) -> Result<Uint32Array, JsError> {
    let lattice = shape(width, height, torus, king)?;
    let mut net = lattice.net();
    for pair in roots.chunks_exact(2) {
        net.set_root(pair[0] as usize, pair[1]);
    }
    for pair in fixed.chunks_exact(2) {
        net.add_node(pair[0], Membership::Fixed(pair[1] as usize));
    }
    for &node in excluded {
        net.add_node(node, Membership::Excluded);
    }

    let mut problem = SpanningProblem::new(&net);
    if cover_all {
        problem = problem.cover_all();
    }
    for pair in rules.chunks_exact(2) {
        problem = problem.minimum_distance(pair[0], pair[1]);
    }
    let forest = problem.solve()?;

    let cells = width as usize * height as usize;
    let mut flat = vec![0u32; 3 * cells];
    for node in 0..cells as u32 {
        let at = 3 * node as usize;
        flat[at] = forest.membership.get(&node).map_or(0, |&group| group as u32 + 1);
        flat[at + 1] = forest.parent.get(&node).copied().unwrap_or(u32::MAX);
        flat[at + 2] = forest.distance.get(&node).copied().unwrap_or(u32::MAX);
    }
    Ok(Uint32Array::from(flat.as_slice()))
}

/// Solve a closed walk over a `width` by `height` lattice: start at `start`,
/// visit exactly `span` distinct cells, return to `start`. The response is
/// the walk in order, `span + 1` cells with `start` at both ends.
#[wasm_bindgen]
pub fn solve_circuit(
    width: u32,
    height: u32,
    torus: bool,
    king: bool,
    start: u32,
    span: u32,
) -> Result<Uint32Array, JsError> {
    let lattice = shape(width, height, torus, king)?;
    let net = lattice.net();
    let walk = CircuitProblem::new(&net, start, span).solve()?;
    Ok(Uint32Array::from(walk.path.as_slice()))
}
