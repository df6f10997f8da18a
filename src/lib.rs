#![warn(missing_docs)]

//! # `espalier`
//!
//! A solver for constrained spanning structure on graphs: rooted [spanning
//! forests](https://en.wikipedia.org/wiki/Spanning_tree) (wall
//! [mazes](https://en.wikipedia.org/wiki/Maze_generation_algorithm) with one
//! room per group), minimum-distance demands on chosen cells, fixed-length
//! simple closed walks, and spanning arborescences of periodic covering
//! graphs chosen through their quotient.
//! Begin by building a [`Net`] by hand or stamping one out of a [`Lattice`],
//! then hand it to a [`SpanningProblem`] or [`CircuitProblem`]; periodic
//! instances go through [`Quotient`], [`Lift`], and [`QuotientProblem`].
//! Solving returns a typed structure ([`Forest`], [`Walk`],
//! [`Arborescence`]) or a precise [`Error`].
//!
//! # Internals
//! This crate is driven by expressing each request as a Boolean
//! satisfiability problem, running a solver, and reading the model back into
//! graph structure.
//!
//! A high level overview is as follows:
//!
//! Given input, express the instance as an undirected graph G with a root
//! vertex per group. Every compatible ordered (child, parent) vertex pair
//! gets a parent-selection variable, and structural rules land as clauses:
//! claimed non-root vertices take exactly one parent, membership stays
//! coherent along parent steps, and no two vertices parent each other.
//! Cycles are ruled out by one of two orderings, binary level counters
//! compared edge-wise or unary depth chains. Distance demands use
//! step-indexed reachability variables, pruned to the ball a lower-bound
//! metric allows before any clause is emitted. Closed walks use step-indexed
//! visit variables instead, and periodic instances choose one edge per
//! quotient class, lifted uniformly to every copy in the cover.
//!
//! The model is then decoded into parent maps, kept/blocked edge sets, and
//! distances recomputed by breadth-first search, so reported numbers are
//! facts about the decoded structure. Solving defaults to
//! [`varisat`](https://docs.rs/varisat); a built-in watched-literal search
//! ([`Search`]) stands in where a decision budget is wanted.

pub use dpll::Search;
pub use engine::{Engine, Varisat, Verdict};
pub use extract::{Arborescence, Forest, Walk};
pub use forest::Order;
pub use lattice::{Chebyshev, Lattice, Manhattan, Moves, Wrap};
pub use net::{GroupId, Membership, Net, NodeId};
pub use quotient::{ClassId, Depth, Lift, Quotient, QuotientEdge};
pub use reach::LowerBound;
pub use session::{CircuitProblem, DistanceRule, Error, QuotientProblem, SpanningProblem};

pub(crate) mod formula;
mod tests;
pub(crate) mod engine;
pub(crate) mod dpll;
pub(crate) mod net;
pub(crate) mod forest;
pub(crate) mod reach;
pub(crate) mod circuit;
pub(crate) mod quotient;
pub(crate) mod extract;
pub(crate) mod session;
pub mod lattice;
#[cfg(feature = "wasm")]
pub mod wasm;
