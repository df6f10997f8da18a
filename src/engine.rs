use varisat::ExtendFormula;

use crate::formula::{Lit, Var};

/// What an [`Engine`] concluded about a formula.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Verdict {
    /// A model was found; read it back through [`Engine::value`].
    Sat,
    /// No model exists.
    Unsat,
    /// The engine gave up before deciding, e.g. a decision budget ran out.
    Unknown,
}

/// The narrow SAT capability the encoders need.
///
/// An engine accepts clauses over variables numbered by the caller, decides
/// satisfiability once, and serves model values afterward. [`varisat`] is
/// wrapped as [`Varisat`]; [`Search`](crate::dpll::Search) is the
/// from-scratch alternative. Implement this to plug in anything else.
pub trait Engine {
    /// Announce how many variables the formula uses, so `value` is defined
    /// even for variables appearing in no clause.
    fn reserve(&mut self, vars: usize);
    /// Add one clause. An empty clause makes the formula unsatisfiable.
    fn add_clause(&mut self, clause: &[Lit]);
    /// Decide satisfiability of everything added so far.
    fn solve(&mut self) -> Verdict;
    /// The value of `var` in the model of the last [`Verdict::Sat`] solve.
    ///
    /// Variables the model leaves unconstrained read as false.
    fn value(&self, var: Var) -> bool;
}

/// The [`varisat`] solver behind the [`Engine`] seam.
pub struct Varisat {
    solver: varisat::Solver<'static>,
    model: Vec<varisat::Lit>,
}

impl Varisat {
    /// A fresh solver holding no clauses.
    pub fn new() -> Self {
        Self {
            solver: varisat::Solver::new(),
            model: Vec::new(),
        }
    }
}

impl Default for Varisat {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Varisat {
    fn reserve(&mut self, _vars: usize) {
        // varisat allocates on first mention
    }

    fn add_clause(&mut self, clause: &[Lit]) {
        let translated = clause.iter()
            .map(|lit| varisat::Lit::from_dimacs(lit.to_dimacs() as isize))
            .collect::<Vec<_>>();
        self.solver.add_clause(&translated);
    }

    fn solve(&mut self) -> Verdict {
        match self.solver.solve() {
            Ok(true) => {
                self.model = self.solver.model().unwrap_or_default();
                Verdict::Sat
            }
            Ok(false) => Verdict::Unsat,
            Err(_) => Verdict::Unknown,
        }
    }

    fn value(&self, var: Var) -> bool {
        self.model.get(var.index()).map_or(false, |lit| lit.is_positive())
    }
}
