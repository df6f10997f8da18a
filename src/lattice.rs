//! Rectangular lattice fixtures: nets, floors, and an ASCII renderer.
//!
//! The solver proper never does coordinate math; these shapes exist so the
//! demo binary, the browser surface, and the test suite can stamp out grids
//! without repeating it. Cells number row-major, `y * width + x`.

use std::num::NonZero;

use ndarray::Array2;
use strum::VariantArray;
use unordered_pair::UnorderedPair;

use crate::extract::Forest;
use crate::net::{Membership, Net, NodeId};
use crate::reach::LowerBound;

/// A lattice extent along one axis.
pub type Dimension = NonZero<u32>;

/// What happens to steps off the rim of the lattice.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Wrap {
    /// Steps off the rim go nowhere.
    #[default]
    Flat,
    /// Steps off the rim re-enter opposite, joining the lattice into a torus.
    Torus,
}

/// The neighbor rule of a lattice.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Moves {
    /// The four axis neighbors, as in a wall maze.
    #[default]
    Square,
    /// The eight surrounding cells, chess-king style.
    King,
}

/// One step to an axis neighbor.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
enum SquareStep {
    Up,
    Down,
    Left,
    Right,
}

impl SquareStep {
    fn offset(&self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// One step to an axis or diagonal neighbor.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
enum KingStep {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl KingStep {
    fn offset(&self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::UpRight => (1, -1),
            Self::Right => (1, 0),
            Self::DownRight => (1, 1),
            Self::Down => (0, 1),
            Self::DownLeft => (-1, 1),
            Self::Left => (-1, 0),
            Self::UpLeft => (-1, -1),
        }
    }
}

impl Moves {
    fn offsets(self) -> Vec<(i32, i32)> {
        match self {
            Self::Square => SquareStep::VARIANTS.iter().map(SquareStep::offset).collect(),
            Self::King => KingStep::VARIANTS.iter().map(KingStep::offset).collect(),
        }
    }
}

/// A rectangular lattice shape. Carries no cell state; it mints [`Net`]s,
/// translates between node ids and coordinates, and measures distance.
#[derive(Copy, Clone, Debug)]
pub struct Lattice {
    width: Dimension,
    height: Dimension,
    moves: Moves,
    wrap: Wrap,
}

impl Lattice {
    /// A lattice of `dims.0` columns by `dims.1` rows.
    pub fn new(dims: (Dimension, Dimension), moves: Moves, wrap: Wrap) -> Self {
        Self {
            width: dims.0,
            height: dims.1,
            moves,
            wrap,
        }
    }

    /// Columns.
    pub fn width(&self) -> u32 {
        self.width.get()
    }

    /// Rows.
    pub fn height(&self) -> u32 {
        self.height.get()
    }

    /// The node id of the cell at `(x, y)`.
    pub fn node(&self, x: u32, y: u32) -> NodeId {
        y * self.width() + x
    }

    /// The `(x, y)` coordinates of `node`.
    pub fn location(&self, node: NodeId) -> (u32, u32) {
        (node % self.width(), node / self.width())
    }

    // the cell one step away, or None off a flat rim
    fn step(&self, x: u32, y: u32, (dx, dy): (i32, i32)) -> Option<(u32, u32)> {
        let sx = i64::from(x) + i64::from(dx);
        let sy = i64::from(y) + i64::from(dy);
        let (w, h) = (i64::from(self.width()), i64::from(self.height()));
        match self.wrap {
            Wrap::Flat => {
                if (0..w).contains(&sx) && (0..h).contains(&sy) {
                    Some((sx as u32, sy as u32))
                } else {
                    None
                }
            }
            Wrap::Torus => Some((sx.rem_euclid(w) as u32, sy.rem_euclid(h) as u32)),
        }
    }

    /// Every cell as a free node, every step as an edge. Dimensions small
    /// enough to wrap a step back onto its own cell shed the resulting
    /// self-edges.
    pub fn net(&self) -> Net {
        let mut net = Net::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                net.add_node(self.node(x, y), Membership::Free);
            }
        }
        let offsets = self.moves.offsets();
        for y in 0..self.height() {
            for x in 0..self.width() {
                for &offset in &offsets {
                    if let Some((sx, sy)) = self.step(x, y, offset) {
                        if (sx, sy) != (x, y) {
                            net.add_edge(self.node(x, y), self.node(sx, sy));
                        }
                    }
                }
            }
        }
        net
    }

    // shortest |a - b| along one axis, around the back if wrapped
    fn axis_gap(&self, a: u32, b: u32, extent: u32) -> u32 {
        let gap = a.abs_diff(b);
        match self.wrap {
            Wrap::Flat => gap,
            Wrap::Torus => gap.min(extent - gap),
        }
    }

    fn gaps(&self, a: NodeId, b: NodeId) -> (u32, u32) {
        let (ax, ay) = self.location(a);
        let (bx, by) = self.location(b);
        (
            self.axis_gap(ax, bx, self.width()),
            self.axis_gap(ay, by, self.height()),
        )
    }

    /// Draw a solved [`Forest`] as a wall maze.
    ///
    /// Cells sit on a doubled grid with `#` walls between them; an edge the
    /// forest kept knocks its wall through. Claimed cells show their group as
    /// a base-36 digit, uppercased at the root; unclaimed and excluded cells
    /// stay walled. Diagonal and wrapped edges have no wall on the canvas and
    /// leave no mark.
    pub fn render(&self, net: &Net, forest: &Forest) -> String {
        let shape = ((2 * self.height() + 1) as usize, (2 * self.width() + 1) as usize);
        let mut canvas: Array2<char> = Array2::from_elem(shape, '#');

        for y in 0..self.height() {
            for x in 0..self.width() {
                let node = self.node(x, y);
                let slot = [(2 * y + 1) as usize, (2 * x + 1) as usize];
                canvas[slot] = match forest.membership.get(&node) {
                    None => '#',
                    Some(&group) => {
                        let digit = char::from_digit((group % 36) as u32, 36).unwrap_or('?');
                        if net.root_of(group) == Some(node) {
                            digit.to_ascii_uppercase()
                        } else {
                            digit
                        }
                    }
                };
            }
        }

        for &UnorderedPair(a, b) in &forest.kept {
            let (ax, ay) = self.location(a);
            let (bx, by) = self.location(b);
            if ax.abs_diff(bx) + ay.abs_diff(by) != 1 {
                // diagonal, or wrapped around the rim; no wall on the canvas
                continue;
            }
            let slot = [(ay + by + 1) as usize, (ax + bx + 1) as usize];
            canvas[slot] = ' ';
        }

        let mut out = String::with_capacity(canvas.nrows() * (canvas.ncols() + 1));
        for row in canvas.rows() {
            for col in row {
                out.push(*col);
            }
            out.push('\n');
        }
        out
    }
}

/// Wrap-aware Manhattan distance on a lattice.
///
/// The exact kept-edge floor for [`Moves::Square`] grids; too tight for
/// [`Moves::King`], use [`Chebyshev`] there.
pub struct Manhattan(pub Lattice);

impl LowerBound for Manhattan {
    fn floor(&self, from: NodeId, to: NodeId) -> u32 {
        let (dx, dy) = self.0.gaps(from, to);
        dx + dy
    }
}

/// Wrap-aware Chebyshev distance on a lattice.
///
/// The exact kept-edge floor for [`Moves::King`] grids, and a sound if loose
/// one for [`Moves::Square`].
pub struct Chebyshev(pub Lattice);

impl LowerBound for Chebyshev {
    fn floor(&self, from: NodeId, to: NodeId) -> u32 {
        let (dx, dy) = self.0.gaps(from, to);
        dx.max(dy)
    }
}
