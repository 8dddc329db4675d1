use core::marker::PhantomData;
use totsu::MatBuild;
use totsu::prelude::MatType;
use totsu_core::solver::{Operator, SliceLike};
use totsu_core::LinAlgEx;
use crate::{ProblemArtifacts, OptimizerError};
use super::{QpSolver, QpSolution};

//

/// [`QpSolver`] solving the equality-constrained problem exactly.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// The optimality conditions \\(2Mx + v + A^T \lambda = 0\\), \\(Ax = b\\) give
/// \\[
/// x = M^{-1} A^T (A M^{-1} A^T)^{-1} (b + A u) - u, \quad u = {1 \over 2} M^{-1} v,
/// \\]
/// where the inverses are taken as pseudo-inverses by eigenvalue decomposition.
/// The inequality rows are only checked afterwards:
/// a violated row is reported as [`OptimizerError::ActiveInequality`].
/// This suits plans whose stability margins are not active at the optimum.
pub struct DirectQp<L: LinAlgEx<F = f64>>
{
    ph_l: PhantomData<L>,
    /// Relative threshold of eigenvalues treated as zero.
    pub eps_zero: f64,
    /// Tolerance of the equality residual and the inequality slack.
    pub eps_feas: f64,
}

impl<L: LinAlgEx<F = f64>> DirectQp<L>
{
    pub fn new() -> Self
    {
        DirectQp {
            ph_l: PhantomData,
            eps_zero: 1e-12,
            eps_feas: 1e-9,
        }
    }

    fn pinv(&self, mut sym: MatBuild<L>) -> MatBuild<L>
    {
        assert!(sym.is_sympack());

        let n = sym.size().0;
        let norm = sym.as_ref().iter().fold(0., |m: f64, v| m.max(v.abs()));
        let thr = self.eps_zero * norm;

        let mut work_vec = vec![0.; L::map_eig_worklen(n)];
        let mut work = L::Sl::new_mut(&mut work_vec);

        L::map_eig(&mut L::Sl::new_mut(sym.as_mut()), None, self.eps_zero, &mut work, |e| {
            if e.abs() > thr {
                Some(e.recip())
            }
            else {
                Some(0.)
            }
        });

        sym
    }

    fn mul(mat: &MatBuild<L>, x: &[f64]) -> Vec<f64>
    {
        let mut y = vec![0.; mat.size().0];
        mat.as_op().op(1., &L::Sl::new_ref(x), 0., &mut L::Sl::new_mut(&mut y));
        y
    }
}

impl<L: LinAlgEx<F = f64>> Default for DirectQp<L>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<L: LinAlgEx<F = f64>> QpSolver<L> for DirectQp<L>
{
    fn solve_qp(&self, prob: &ProblemArtifacts<L>) -> Result<QpSolution, OptimizerError>
    {
        let n = prob.dim();
        let mat_a = &prob.eq.mat;
        let vec_b = prob.eq.vec.as_ref();
        let p = vec_b.len();

        let m_pinv = self.pinv(prob.cost.sym_m.clone());

        // W = M^+ A^T, by columns
        let w: Vec<Vec<f64>> = (0.. p).map(|r| {
            let a_r: Vec<f64> = (0.. n).map(|c| mat_a[(r, c)]).collect();
            Self::mul(&m_pinv, &a_r)
        }).collect();

        // S = A W
        let mut sym_s = MatBuild::<L>::new(MatType::SymPack(p));
        for c in 0.. p {
            let aw = Self::mul(mat_a, &w[c]);
            for r in 0..= c {
                sym_s[(r, c)] = aw[r];
            }
        }
        let s_pinv = self.pinv(sym_s);

        let mut u = Self::mul(&m_pinv, prob.cost.vec_v.as_ref());
        u.iter_mut().for_each(|u| *u *= 0.5);

        let au = Self::mul(mat_a, &u);
        let y: Vec<f64> = vec_b.iter().zip(&au).map(|(b, au)| b + au).collect();

        let lambda = Self::mul(&s_pinv, &y);
        let mut x: Vec<f64> = u.iter().map(|u| -u).collect();
        for (wc, l) in w.iter().zip(&lambda) {
            for (x, w) in x.iter_mut().zip(wc) {
                *x += w * l;
            }
        }

        // iterative refinement
        for _ in 0.. 2 {
            let ax = Self::mul(mat_a, &x);
            let res: Vec<f64> = vec_b.iter().zip(&ax).map(|(b, ax)| b - ax).collect();
            let d_lambda = Self::mul(&s_pinv, &res);
            for (wc, l) in w.iter().zip(&d_lambda) {
                for (x, w) in x.iter_mut().zip(wc) {
                    *x += w * l;
                }
            }
        }

        let residual = prob.eq.residual(&x);
        let b_norm = vec_b.iter().fold(0., |m: f64, b| m.max(b.abs()));
        if !(residual <= self.eps_feas * (1. + b_norm)) {
            log::warn!("Equality constraints inconsistent, residual {:.3e}", residual);

            return Ok(QpSolution::infeasible(n));
        }

        if let Some((row, slack)) = prob.min_slack(&x) {
            if slack < -self.eps_feas {
                log::warn!("Inequality row {} violated by {:.3e}", row, -slack);

                return Err(OptimizerError::ActiveInequality(row));
            }
        }

        let cost = prob.cost.eval(&x);
        log::debug!("Equality residual {:.3e}, cost {:.3e}", residual, cost);

        Ok(QpSolution {
            x, cost,
        })
    }
}
