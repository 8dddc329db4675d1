/*!
Quadratic-program formulation of a center-of-gravity trajectory for dynamic legged walking,
keeping the zero-moment point (ZMP) inside the support triangles.

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

The horizontal trajectory is a chain of quintic splines
\\(p(t) = A t^5 + B t^4 + C t^3 + D t^2 + E t + F\\), one per walking phase.
Only \\(A, B, C, D\\) of each spline and axis are optimization variables;
\\(E, F\\) are carried over from the end of the previous spline,
so position and velocity are continuous without constraints.
The problem is
\\[
\begin{array}{ll}
{\rm minimize} & \sum_{\rm splines} \int_0^T w_x \ddot x^2 + w_y \ddot y^2 \, dt \\\\
{\rm subject \ to} & \hbox{start acceleration and jerk, end position, velocity and acceleration} \\\\
& \hbox{continuity of acceleration and jerk at every junction} \\\\
& p \, x_{\rm zmp}(t) + q \, y_{\rm zmp}(t) + r \ge s_{\rm margin} \quad \hbox{for sampled } t
\end{array}
\\]
with \\(x_{\rm zmp} = x - {h \over g} \ddot x\\) and the support triangle edges \\((p, q, r)\\).

# General usage

1. Make a [`SplineContainer`] of the walking plan, e.g. by [`SplineContainer::construct`].
1. Create a [`ZmpOptimizer`] and optionally set its parameters and [`Reporter`].
1. Invoke [`ZmpOptimizer::setup`] with a [`SupportGeometry`] and a [`SetupInput`]
   to get [`ProblemArtifacts`].
1. Invoke [`ZmpOptimizer::solve_qp`] with a [`QpSolver`]:
   * [`TotsuQp`] - general QP by `totsu`, first-order accuracy.
   * [`DirectQp`] - exact solution when no stability margin is active.
1. Evaluate the result by [`ProblemArtifacts::trajectory`].

# Examples

A four-leg phase followed by a swing of the right front leg,
moving the center of gravity from \\((0, 0)\\) to the center \\((0.2, 0)\\) of the final stance.

```
use float_eq::assert_float_eq;
use zmp_spline::prelude::*;
use zmp_spline::*;

//env_logger::init(); // Use any logger crate with `LogReporter`.

type La = FloatGeneric<f64>;

let splines = SplineContainer::new()
              .spline(1.0, 0, true)
              .spline(1.0, 0, false);

let input = SetupInput {
    start_cog_p: [0., 0.],
    start_cog_v: [0., 0.],
    start_stance: stance([
        Foothold::new(2., 0., LegId::LF),
        Foothold::new(0.8, 0., LegId::RF),
        Foothold::new(-1., 1., LegId::LH),
        Foothold::new(-1., -1., LegId::RH),
    ]),
    steps: vec![Foothold::new(0.8, 0., LegId::RF)],
    weight: [1., 1.],
    margins: MarginValues::uniform(0.1),
    height_robot: 0.58,
};

let mut opt = ZmpOptimizer::new(splines).with_reporter(LogReporter);
let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();
let sol = opt.solve_qp(DirectQp::new(), &prob).unwrap();

let traj = prob.trajectory(&sol.coefficients);
assert_float_eq!(traj.state(traj.duration()).p, [0.2, 0.], abs_all <= 1e-6);
```
*/

mod spline;
mod support;

pub use spline::*;
pub use support::*;

//

mod error;
mod param;
mod report;

pub use error::*;
pub use param::*;
pub use report::*;

//

mod cost;
mod equality;
mod inequality;
mod problem;

pub use cost::*;
pub use equality::*;
pub use inequality::*;
pub use problem::*;

//

mod backend;
mod optimizer;

pub use backend::*;
pub use optimizer::*;

//

/// Prelude
pub mod prelude
{
    pub use totsu::prelude::{FloatGeneric, SolverError, SolverParam};
    pub use crate::{ZmpOptimizer, SetupInput, OptimizerParam, OptimizerError};
}
