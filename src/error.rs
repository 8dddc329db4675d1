use totsu::prelude::SolverError;

//

/// Optimizer errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptimizerError
{
    /// Missing or invalid walking plan.
    Configuration,
    /// Solver returned an infinite cost or a cost below the trivial-solution threshold.
    InfeasibleSolution(f64),
    /// Nonlinear solver failed to initialize.
    SolverInit(SolverError),
    /// Solver failed otherwise.
    Solver(SolverError),
    /// Equality-only solution violates the inequality row.
    ActiveInequality(usize),
}

impl core::fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self {
            OptimizerError::Configuration         => write!(f, "Configuration: spline sequence empty or plan invalid"),
            OptimizerError::InfeasibleSolution(c) => write!(f, "InfeasibleSolution: no solution found, cost {:.3e}", c),
            OptimizerError::SolverInit(e)         => write!(f, "SolverInit: {}", e),
            OptimizerError::Solver(e)             => write!(f, "Solver: {}", e),
            OptimizerError::ActiveInequality(r)   => write!(f, "ActiveInequality: inequality row {} violated", r),
        }
    }
}

impl std::error::Error for OptimizerError {}
