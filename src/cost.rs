use std::time::Instant;
use totsu::MatBuild;
use totsu::prelude::MatType;
use totsu_core::LinAlgEx;
use crate::{SplineContainer, Reporter, Axis, Coeff, DIM2D, powers};

//

/// Quadratic cost \\(x^T M x + v^T x\\) on the optimization vector.
#[derive(Clone)]
pub struct CostFunction<L: LinAlgEx<F = f64>>
{
    /// \\(M\\), symmetric packed.
    pub sym_m: MatBuild<L>,
    /// \\(v\\), always zero.
    pub vec_v: MatBuild<L>,
}

impl<L: LinAlgEx<F = f64>> CostFunction<L>
{
    /// Builds the cost of squared acceleration integrated over every spline.
    ///
    /// For \\(\ddot p(t) = 20 A t^3 + 12 B t^2 + 6 C t + 2 D\\) the entries are
    /// \\(\int_0^T \ddot p^2 dt\\) expanded by pairs of coefficients,
    /// see M. Kalakrishnan et al., "Learning, Planning and Control for Quadruped Robots
    /// over Challenging Terrain", IJRR 2010, p. 248.
    /// `E` and `F` do not appear in the acceleration and thus cost nothing.
    /// * `splines` is the spline sequence.
    /// * `weight` scales the x and y terms.
    /// * `rep` is notified of the result.
    pub fn min_acc<R: Reporter>(splines: &SplineContainer, weight: [f64; DIM2D], rep: &mut R) -> Self
    {
        let start = Instant::now();

        let n = splines.opt_coeff_count();
        // upper triangle only, the packed form mirrors it
        let mut sym_m = MatBuild::new(MatType::SymPack(n));

        for s in splines.splines() {
            let t = powers::<8>(s.duration);

            for axis in Axis::ALL {
                let w = weight[axis.idx()];
                let a = splines.index(s.id, axis, Coeff::A);
                let b = splines.index(s.id, axis, Coeff::B);
                let c = splines.index(s.id, axis, Coeff::C);
                let d = splines.index(s.id, axis, Coeff::D);

                sym_m[(a, a)] = 400. / 7. * t[7] * w;
                sym_m[(a, b)] = 40.        * t[6] * w;
                sym_m[(a, c)] = 24.        * t[5] * w;
                sym_m[(a, d)] = 10.        * t[4] * w;
                sym_m[(b, b)] = 144. / 5. * t[5] * w;
                sym_m[(b, c)] = 18.        * t[4] * w;
                sym_m[(b, d)] = 8.         * t[3] * w;
                sym_m[(c, c)] = 12.        * t[3] * w;
                sym_m[(c, d)] = 6.         * t[2] * w;
                sym_m[(d, d)] = 4.         * t[1] * w;
            }
        }

        let vec_v = MatBuild::new(MatType::General(n, 1));

        rep.matrix_built("cost function", &sym_m, sym_m.size(), start.elapsed());

        CostFunction {
            sym_m,
            vec_v,
        }
    }

    /// Number of variables.
    pub fn dim(&self) -> usize
    {
        self.sym_m.size().0
    }

    /// Evaluates \\(x^T M x + v^T x\\).
    pub fn eval(&self, x: &[f64]) -> f64
    {
        let n = self.dim();
        assert_eq!(x.len(), n);

        let mut cost = 0.;
        for c in 0.. n {
            if x[c] == 0. {
                continue;
            }
            for r in 0.. n {
                cost += x[r] * self.sym_m[(r, c)] * x[c];
            }
            cost += self.vec_v[(c, 0)] * x[c];
        }
        cost
    }
}

//

#[test]
fn test_cost_symmetric_block_diagonal()
{
    use totsu_core::FloatGeneric;
    use crate::{NullReporter, var_of_index};

    type L = FloatGeneric<f64>;

    let sc = SplineContainer::new()
             .spline(0.8, 0, true)
             .spline(1.3, 0, false)
             .spline(0.4, 1, false);
    let cf = CostFunction::<L>::min_acc(&sc, [1.0, 2.5], &mut NullReporter);
    let n = sc.opt_coeff_count();

    for r in 0.. n {
        for c in 0.. n {
            assert_eq!(cf.sym_m[(r, c)], cf.sym_m[(c, r)]);

            let (sr, ar, _) = var_of_index(r);
            let (sc_, ac, _) = var_of_index(c);
            if sr != sc_ || ar != ac {
                assert_eq!(cf.sym_m[(r, c)], 0.);
            }
        }
        assert_eq!(cf.vec_v[(r, 0)], 0.);
    }
}

#[test]
fn test_cost_integrates_squared_acceleration()
{
    use float_eq::assert_float_eq;
    use totsu_core::FloatGeneric;
    use crate::{NullReporter, Derivative, var_index};

    type L = FloatGeneric<f64>;

    let dur = 1.3;
    let sc = SplineContainer::new().spline(dur, 0, false);
    let weight = [0.5, 3.];
    let cf = CostFunction::<L>::min_acc(&sc, weight, &mut NullReporter);

    let mut x = vec![0.; sc.opt_coeff_count()];
    let abcd = [[0.3, -1.1, 0.7, 2.0], [-0.4, 0.2, 1.5, -0.6]];
    for axis in Axis::ALL {
        for c in Coeff::FREE {
            x[var_index(0, axis, c)] = abcd[axis.idx()][c.idx()];
        }
    }

    // composite Simpson's rule
    let steps = 2000;
    let h = dur / steps as f64;
    let mut integral = 0.;
    for axis in Axis::ALL {
        let q = abcd[axis.idx()];
        let coeff = [q[0], q[1], q[2], q[3], 0., 0.];
        let mut sum = 0.;
        for i in 0..= steps {
            let a = Derivative::Acc.eval(&coeff, i as f64 * h);
            let wgt = if i == 0 || i == steps {1.} else if i % 2 == 1 {4.} else {2.};
            sum += wgt * a * a;
        }
        integral += weight[axis.idx()] * sum * h / 3.;
    }

    assert_float_eq!(cf.eval(&x), integral, rmax <= 1e-9);
}
