//! Solver collaborators and solving strategies

use totsu::prelude::SolverError;
use totsu_core::LinAlgEx;
use crate::{ProblemArtifacts, OptimizerParam, OptimizerError, Foothold};

//

mod totsu_qp;
mod direct_qp;

pub use totsu_qp::*;
pub use direct_qp::*;

//

/// Result of a [`QpSolver`].
#[derive(Debug, Clone, PartialEq)]
pub struct QpSolution
{
    /// Optimization vector.
    pub x: Vec<f64>,
    /// Achieved cost, `f64::INFINITY` if infeasible or unbounded.
    pub cost: f64,
}

impl QpSolution
{
    /// Infeasible sentinel of dimension `n`.
    pub fn infeasible(n: usize) -> Self
    {
        QpSolution {
            x: vec![0.; n],
            cost: f64::INFINITY,
        }
    }
}

/// Quadratic program solver collaborator.
pub trait QpSolver<L: LinAlgEx<F = f64>>
{
    /// Minimizes \\(x^T M x + v^T x\\) subject to the equality and inequality constraints.
    ///
    /// Returns the solution, whose cost is infinite if the problem is infeasible or unbounded.
    fn solve_qp(&self, prob: &ProblemArtifacts<L>) -> Result<QpSolution, OptimizerError>;
}

/// Result of a [`NlpSolver`].
#[derive(Debug, Clone, PartialEq)]
pub struct NlpSolution
{
    /// Optimization vector.
    pub coefficients: Vec<f64>,
    /// Optimized footholds.
    pub footholds: Vec<Foothold>,
}

/// Nonlinear program solver collaborator which moves the footholds together with the coefficients.
pub trait NlpSolver<L: LinAlgEx<F = f64>>
{
    /// Prepares the solver.
    fn initialize(&mut self) -> Result<(), SolverError>;

    /// Optimizes starting from the problem's constraints and `initial_guess`.
    fn optimize(&mut self, prob: &ProblemArtifacts<L>, initial_guess: &[f64]) -> Result<NlpSolution, SolverError>;
}

//

/// Solution of a walking plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution
{
    /// Optimization vector.
    pub coefficients: Vec<f64>,
    pub cost: f64,
    /// Footholds, moved only by nonlinear strategies.
    pub footholds: Vec<Foothold>,
}

/// Way of solving [`ProblemArtifacts`].
pub trait SolveStrategy<L: LinAlgEx<F = f64>>
{
    /// Solves the problem.
    ///
    /// * `par` gives the trivial-solution threshold.
    fn solve(&mut self, prob: &ProblemArtifacts<L>, par: &OptimizerParam) -> Result<Solution, OptimizerError>;
}

/// Strategy by a [`QpSolver`]; footholds stay as planned.
pub struct QpStrategy<Q>(pub Q);

impl<L, Q> SolveStrategy<L> for QpStrategy<Q>
where L: LinAlgEx<F = f64>, Q: QpSolver<L>
{
    fn solve(&mut self, prob: &ProblemArtifacts<L>, par: &OptimizerParam) -> Result<Solution, OptimizerError>
    {
        let sol = self.0.solve_qp(prob)?;

        if !sol.cost.is_finite() || sol.cost < par.eps_cost {
            return Err(OptimizerError::InfeasibleSolution(sol.cost));
        }

        Ok(Solution {
            coefficients: sol.x,
            cost: sol.cost,
            footholds: prob.steps.clone(),
        })
    }
}

/// Strategy by a [`NlpSolver`].
pub struct NlpStrategy<N>
{
    pub solver: N,
    /// Starting point of the optimization vector.
    pub initial_guess: Vec<f64>,
}

impl<L, N> SolveStrategy<L> for NlpStrategy<N>
where L: LinAlgEx<F = f64>, N: NlpSolver<L>
{
    fn solve(&mut self, prob: &ProblemArtifacts<L>, _par: &OptimizerParam) -> Result<Solution, OptimizerError>
    {
        if self.initial_guess.len() != prob.dim() {
            log::error!("Initial guess dim {} mismatch: {}", self.initial_guess.len(), prob.dim());
            return Err(OptimizerError::Configuration);
        }

        self.solver.initialize().map_err(OptimizerError::SolverInit)?;

        let sol = self.solver.optimize(prob, &self.initial_guess).map_err(OptimizerError::Solver)?;
        if sol.coefficients.len() != prob.dim() {
            log::error!("Solution dim {} mismatch: {}", sol.coefficients.len(), prob.dim());
            return Err(OptimizerError::Solver(SolverError::InvalidOp));
        }

        let cost = prob.cost.eval(&sol.coefficients);

        Ok(Solution {
            coefficients: sol.coefficients,
            cost,
            footholds: sol.footholds,
        })
    }
}
