use core::marker::PhantomData;
use totsu::ProbQP;
use totsu::prelude::{Solver, SolverError, SolverParam};
use totsu_core::LinAlgEx;
use crate::{ProblemArtifacts, OptimizerError};
use super::{QpSolver, QpSolution};

//

/// [`QpSolver`] by the first-order conic solver of `totsu`.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// The problem is passed to [`ProbQP`] as
/// \\(P = 2M\\), \\(q = v\\), \\(G = -A_{\rm ineq}\\), \\(h = -b_{\rm ineq}\\).
/// The accuracy is that of [`SolverParam::eps_acc`].
pub struct TotsuQp<L: LinAlgEx<F = f64>>
{
    ph_l: PhantomData<L>,
    /// Parameters of the underlying solver.
    pub par: SolverParam<f64>,
}

impl<L: LinAlgEx<F = f64>> TotsuQp<L>
{
    /// Creates an instance with default parameters and no iteration limit.
    pub fn new() -> Self
    {
        TotsuQp {
            ph_l: PhantomData,
            par: SolverParam::default(),
        }
    }

    /// Changes solver parameters.
    ///
    /// Returns [`TotsuQp`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut SolverParam<f64>)
    {
        f(&mut self.par);
        self
    }
}

impl<L: LinAlgEx<F = f64>> Default for TotsuQp<L>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<L: LinAlgEx<F = f64>> QpSolver<L> for TotsuQp<L>
{
    fn solve_qp(&self, prob: &ProblemArtifacts<L>) -> Result<QpSolution, OptimizerError>
    {
        let n = prob.dim();

        let sym_p = prob.cost.sym_m.clone().scale(2.);
        let vec_q = prob.cost.vec_v.clone();
        let mat_g = prob.ineq.mat.clone().scale(-1.);
        let vec_h = prob.ineq.vec.clone().scale(-1.);
        let mat_a = prob.eq.mat.clone();
        let vec_b = prob.eq.vec.clone();

        let mut s = Solver::<L>::new();
        s.par = self.par.clone();
        let mut qp = ProbQP::new(sym_p, vec_q, mat_g, vec_h, mat_a, vec_b, s.par.eps_zero);

        match s.solve(qp.problem()) {
            Ok((x, _)) => {
                let x = x[0.. n].to_vec();
                let cost = prob.cost.eval(&x);

                Ok(QpSolution {
                    x, cost,
                })
            },
            Err(SolverError::Infeasible) | Err(SolverError::Unbounded) => {
                log::warn!("QP has no finite solution");

                Ok(QpSolution::infeasible(n))
            },
            Err(e) => Err(OptimizerError::Solver(e)),
        }
    }
}
