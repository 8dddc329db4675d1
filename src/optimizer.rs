use std::time::Instant;
use totsu_core::LinAlgEx;
use crate::{SplineContainer, OptimizerParam, OptimizerError, Reporter, NullReporter};
use crate::{CostFunction, EqualityConstraints, InequalityConstraints, Boundary, ProblemArtifacts};
use crate::{Foothold, LegDataMap, MarginValues, SupportGeometry, stance_center, lines_for_constraint};
use crate::{SolveStrategy, Solution, QpSolver, QpStrategy, NlpSolver, NlpStrategy, DIM2D};

//

/// Input of [`ZmpOptimizer::setup`].
#[derive(Debug, Clone, PartialEq)]
pub struct SetupInput
{
    /// Start position of the center of gravity.
    pub start_cog_p: [f64; DIM2D],
    /// Start velocity of the center of gravity.
    pub start_cog_v: [f64; DIM2D],
    /// Footholds of all legs before the first step.
    pub start_stance: LegDataMap<Foothold>,
    /// Planned footholds in stepping order.
    pub steps: Vec<Foothold>,
    /// Cost weights of x and y.
    pub weight: [f64; DIM2D],
    pub margins: MarginValues,
    /// Approximate height of the center of gravity.
    pub height_robot: f64,
}

/// Center-of-gravity trajectory optimizer keeping the zero-moment point inside the support triangles.
///
/// [`ZmpOptimizer::setup`] turns a walking plan into [`ProblemArtifacts`],
/// then [`ZmpOptimizer::solve`] hands them to a [`SolveStrategy`].
pub struct ZmpOptimizer<R: Reporter = NullReporter>
{
    splines: SplineContainer,
    /// Optimizer parameters.
    pub par: OptimizerParam,
    reporter: R,
}

impl ZmpOptimizer
{
    /// Creates an instance.
    ///
    /// Returns [`ZmpOptimizer`] instance with default parameters and no reporting.
    /// * `splines` is the spline sequence of the walking plan.
    pub fn new(splines: SplineContainer) -> Self
    {
        ZmpOptimizer {
            splines,
            par: OptimizerParam::default(),
            reporter: NullReporter,
        }
    }
}

impl<R: Reporter> ZmpOptimizer<R>
{
    /// Replaces the reporter.
    pub fn with_reporter<R2: Reporter>(self, reporter: R2) -> ZmpOptimizer<R2>
    {
        ZmpOptimizer {
            splines: self.splines,
            par: self.par,
            reporter,
        }
    }

    /// Changes optimizer parameters.
    ///
    /// Returns [`ZmpOptimizer`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut OptimizerParam)
    {
        f(&mut self.par);
        self
    }

    /// Returns the spline sequence of the walking plan.
    pub fn splines(&self) -> &SplineContainer
    {
        &self.splines
    }

    /// Returns the reporter.
    pub fn reporter(&self) -> &R
    {
        &self.reporter
    }

    /// Builds the quadratic program of a walking plan.
    ///
    /// The end position of the center of gravity is the center of the stance after the last step,
    /// reached at rest.
    /// Returns [`ProblemArtifacts`], or [`OptimizerError::Configuration`]
    /// if the spline sequence is empty, `dt` is not positive or a spline refers to a missing step.
    /// * `geometry` gives the support lines of each step.
    /// * `input` is the walking plan and the start state.
    pub fn setup<L, G>(&mut self, geometry: &G, input: &SetupInput) -> Result<ProblemArtifacts<L>, OptimizerError>
    where L: LinAlgEx<F = f64>, G: SupportGeometry
    {
        if self.splines.is_empty() {
            log::error!("Spline sequence empty");
            return Err(OptimizerError::Configuration);
        }
        if !(self.par.dt > 0.) {
            log::error!("Sampling interval not positive: {}", self.par.dt);
            return Err(OptimizerError::Configuration);
        }

        let (triangles, final_stance) = geometry.support_lines(&input.start_stance, &input.steps, &input.margins);
        let lines = lines_for_constraint(&self.splines, &triangles, self.par.dt)?;

        let end_cog = stance_center(&final_stance);
        let boundary = Boundary::new(input.start_cog_p, input.start_cog_v, end_cog);
        let cont = self.splines.continuation(boundary.start_p, boundary.start_v);

        let cost = CostFunction::min_acc(&self.splines, input.weight, &mut self.reporter);
        let eq = EqualityConstraints::build(&self.splines, &cont, &boundary, &mut self.reporter);
        let ineq = InequalityConstraints::build(&self.splines, &cont, &lines, input.height_robot, &self.par, &mut self.reporter);

        Ok(ProblemArtifacts {
            splines: self.splines.clone(),
            cost,
            eq,
            ineq,
            boundary,
            start_stance: input.start_stance,
            steps: input.steps.clone(),
            margins: input.margins,
            height: input.height_robot,
        })
    }

    /// Solves the built problem.
    ///
    /// Returns the [`Solution`], or the error of the strategy.
    /// * `strategy` is the way of solving.
    /// * `prob` shall be built by [`ZmpOptimizer::setup`].
    pub fn solve<L, S>(&mut self, strategy: &mut S, prob: &ProblemArtifacts<L>) -> Result<Solution, OptimizerError>
    where L: LinAlgEx<F = f64>, S: SolveStrategy<L>
    {
        let start = Instant::now();

        let sol = strategy.solve(prob, &self.par)?;

        self.reporter.solved(sol.cost, start.elapsed());

        Ok(sol)
    }

    /// Solves the built problem by a [`QpSolver`].
    ///
    /// Returns the [`Solution`], or [`OptimizerError::InfeasibleSolution`]
    /// if the cost is infinite or below [`OptimizerParam::eps_cost`].
    pub fn solve_qp<L, Q>(&mut self, solver: Q, prob: &ProblemArtifacts<L>) -> Result<Solution, OptimizerError>
    where L: LinAlgEx<F = f64>, Q: QpSolver<L>
    {
        self.solve(&mut QpStrategy(solver), prob)
    }

    /// Solves the built problem by a [`NlpSolver`], which also moves the footholds.
    ///
    /// Returns the [`Solution`], or [`OptimizerError::SolverInit`] if the solver fails to initialize,
    /// or [`OptimizerError::Configuration`] if `initial_guess` does not match the problem dimension.
    /// * `initial_guess` is the starting point of the optimization vector,
    ///   typically a solution of [`ZmpOptimizer::solve_qp`].
    pub fn solve_nonlinear<L, N>(&mut self, solver: N, prob: &ProblemArtifacts<L>, initial_guess: &[f64]) -> Result<Solution, OptimizerError>
    where L: LinAlgEx<F = f64>, N: NlpSolver<L>
    {
        let mut strategy = NlpStrategy {
            solver,
            initial_guess: initial_guess.to_vec(),
        };

        self.solve(&mut strategy, prob)
    }
}
