use totsu_core::LinAlgEx;
use crate::{CostFunction, EqualityConstraints, InequalityConstraints, Boundary};
use crate::{SplineContainer, Trajectory, SupportLine, Foothold, LegDataMap, MarginValues};

//

/// Quadratic program of one walking plan, produced by [`crate::ZmpOptimizer::setup`].
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// \\[
/// \begin{array}{ll}
/// {\rm minimize} & x^T M x + v^T x \\\\
/// {\rm subject \ to} & A_{\rm eq} x = b_{\rm eq} \\\\
/// & A_{\rm ineq} x \ge b_{\rm ineq}
/// \end{array}
/// \\]
///
/// Every solver strategy consumes the same artifacts; nothing is changed after setup.
#[derive(Clone)]
pub struct ProblemArtifacts<L: LinAlgEx<F = f64>>
{
    pub splines: SplineContainer,
    pub cost: CostFunction<L>,
    pub eq: EqualityConstraints<L>,
    pub ineq: InequalityConstraints<L>,
    pub boundary: Boundary,
    /// Stance before the first step.
    pub start_stance: LegDataMap<Foothold>,
    /// Planned footholds.
    pub steps: Vec<Foothold>,
    pub margins: MarginValues,
    /// Height of the center of gravity.
    pub height: f64,
}

impl<L: LinAlgEx<F = f64>> ProblemArtifacts<L>
{
    /// Number of optimization variables.
    pub fn dim(&self) -> usize
    {
        self.cost.dim()
    }

    /// Trajectory of an optimized vector `x`.
    pub fn trajectory(&self, x: &[f64]) -> Trajectory
    {
        self.splines.trajectory(self.boundary.start_p, self.boundary.start_v, x)
    }

    /// Returns the lowest inequality slack of `x` with its row, or `None` without rows.
    pub fn min_slack(&self, x: &[f64]) -> Option<(usize, f64)>
    {
        self.ineq.slack(x).into_iter().enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Same problem with other support lines, e.g. for moved footholds.
    ///
    /// * `lines` shall have one line per inequality row.
    pub fn rescale_inequality(&self, lines: &[SupportLine]) -> Self
    {
        ProblemArtifacts {
            ineq: self.ineq.with_lines(lines),
            ..self.clone()
        }
    }
}
