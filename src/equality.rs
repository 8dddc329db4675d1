use std::time::Instant;
use totsu::MatBuild;
use totsu::prelude::MatType;
use totsu_core::LinAlgEx;
use crate::{SplineContainer, Continuation, Reporter, Axis, Coeff, Derivative, DIM2D};

//

/// Boundary state of the center of gravity.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary
{
    pub start_p: [f64; DIM2D],
    pub start_v: [f64; DIM2D],
    pub start_acc: [f64; DIM2D],
    pub start_jerk: [f64; DIM2D],
    pub end_p: [f64; DIM2D],
    pub end_v: [f64; DIM2D],
    pub end_acc: [f64; DIM2D],
}

impl Boundary
{
    /// Creates an instance which starts and ends with zero acceleration and jerk and ends at rest.
    pub fn new(start_p: [f64; DIM2D], start_v: [f64; DIM2D], end_p: [f64; DIM2D]) -> Self
    {
        Boundary {
            start_p,
            start_v,
            start_acc: [0.; DIM2D],
            start_jerk: [0.; DIM2D],
            end_p,
            end_v: [0.; DIM2D],
            end_acc: [0.; DIM2D],
        }
    }
}

//

/// Equality constraints \\(A x = b\\).
///
/// Rows are ordered as
/// 1. for each axis: start acceleration, start jerk, end position, end velocity, end acceleration,
/// 1. for each junction and each axis: acceleration continuity, jerk continuity.
///
/// Continuity of position and velocity holds by the `E`, `F` continuation and needs no row.
#[derive(Clone)]
pub struct EqualityConstraints<L: LinAlgEx<F = f64>>
{
    pub mat: MatBuild<L>,
    pub vec: MatBuild<L>,
}

impl<L: LinAlgEx<F = f64>> EqualityConstraints<L>
{
    /// Number of rows for `splines` splines.
    pub fn row_count(splines: usize) -> usize
    {
        assert!(splines > 0);

        DIM2D * 2                        // start {acc, jerk}
        + DIM2D * 3                      // end {pos, vel, acc}
        + (splines - 1) * DIM2D * 2     // junctions {acc, jerk}
    }

    /// Builds the constraints.
    ///
    /// * `splines` shall not be empty.
    /// * `cont` shall be the continuation of `splines` from the start state of `boundary`.
    pub fn build<R: Reporter>(splines: &SplineContainer, cont: &Continuation, boundary: &Boundary, rep: &mut R) -> Self
    {
        let start = Instant::now();

        let n = splines.opt_coeff_count();
        let m = Self::row_count(splines.len());
        let mut mat = MatBuild::new(MatType::General(m, n));
        let mut vec = MatBuild::new(MatType::General(m, 1));

        let last = &splines.splines()[splines.len() - 1];
        let mut i = 0;

        for axis in Axis::ALL {
            let a = axis.idx();

            // acceleration and jerk of the first spline at t = 0 only see D and C
            mat[(i, splines.index(0, axis, Coeff::D))] = 2.;
            vec[(i, 0)] = boundary.start_acc[a];
            i += 1;
            mat[(i, splines.index(0, axis, Coeff::C))] = 6.;
            vec[(i, 0)] = boundary.start_jerk[a];
            i += 1;

            let t = last.duration;
            let e = cont.e(last.id, axis);
            let f = cont.f(last.id, axis);

            // position: free part + E t + F
            let pos = Derivative::Pos.basis(t);
            for c in Coeff::FREE {
                mat[(i, splines.index(last.id, axis, c))] += pos[c.idx()];
            }
            for j in 0.. n {
                mat[(i, j)] += e.coeff[j] * t + f.coeff[j];
            }
            vec[(i, 0)] = boundary.end_p[a] - (e.constant * t + f.constant);
            i += 1;

            // velocity: free part + E
            let vel = Derivative::Vel.basis(t);
            for c in Coeff::FREE {
                mat[(i, splines.index(last.id, axis, c))] += vel[c.idx()];
            }
            for j in 0.. n {
                mat[(i, j)] += e.coeff[j];
            }
            vec[(i, 0)] = boundary.end_v[a] - e.constant;
            i += 1;

            let acc = Derivative::Acc.basis(t);
            for c in Coeff::FREE {
                mat[(i, splines.index(last.id, axis, c))] = acc[c.idx()];
            }
            vec[(i, 0)] = boundary.end_acc[a];
            i += 1;
        }

        for s in &splines.splines()[..splines.len() - 1] {
            let acc = Derivative::Acc.basis(s.duration);
            let jerk = Derivative::Jerk.basis(s.duration);

            for axis in Axis::ALL {
                for c in Coeff::FREE {
                    mat[(i, splines.index(s.id, axis, c))] = acc[c.idx()];
                }
                mat[(i, splines.index(s.id + 1, axis, Coeff::D))] = -2.;
                i += 1;

                for c in Coeff::FREE {
                    mat[(i, splines.index(s.id, axis, c))] = jerk[c.idx()];
                }
                mat[(i, splines.index(s.id + 1, axis, Coeff::C))] = -6.;
                i += 1;
            }
        }

        assert_eq!(i, m);

        rep.matrix_built("equality constraints", &mat, mat.size(), start.elapsed());

        EqualityConstraints {
            mat,
            vec,
        }
    }

    /// Returns the largest absolute value of \\(A x - b\\).
    pub fn residual(&self, x: &[f64]) -> f64
    {
        let (m, n) = self.mat.size();
        assert_eq!(x.len(), n);

        let mut res = 0_f64;
        for r in 0.. m {
            let mut ax = 0.;
            for c in 0.. n {
                ax += self.mat[(r, c)] * x[c];
            }
            res = res.max((ax - self.vec[(r, 0)]).abs());
        }
        res
    }
}

//

#[test]
fn test_equality_rows()
{
    use float_eq::assert_float_eq;
    use totsu_core::FloatGeneric;
    use crate::NullReporter;

    type L = FloatGeneric<f64>;

    let sc = SplineContainer::new()
             .spline(0.5, 0, true)
             .spline(0.8, 0, false)
             .spline(1.2, 1, false);
    let bd = Boundary {
        start_acc: [0.1, -0.2],
        start_jerk: [0.3, 0.4],
        end_v: [0.05, 0.],
        ..Boundary::new([0.1, 0.2], [0.3, -0.1], [1.0, -0.5])
    };
    let cont = sc.continuation(bd.start_p, bd.start_v);
    let eq = EqualityConstraints::<L>::build(&sc, &cont, &bd, &mut NullReporter);

    assert_eq!(EqualityConstraints::<L>::row_count(3), 2 * 2 + 3 * 2 + 2 * 2 * 2);
    assert_eq!(eq.mat.size(), (18, sc.opt_coeff_count()));
    assert_eq!(eq.vec.size(), (18, 1));

    // start rows of y come after the five rows of x
    assert_eq!(eq.mat[(0, sc.index(0, Axis::X, Coeff::D))], 2.);
    assert_eq!(eq.vec[(0, 0)], 0.1);
    assert_eq!(eq.mat[(1, sc.index(0, Axis::X, Coeff::C))], 6.);
    assert_eq!(eq.mat[(5, sc.index(0, Axis::Y, Coeff::D))], 2.);
    assert_eq!(eq.vec[(6, 0)], 0.4);
    assert_float_eq!(eq.vec[(3, 0)], 0.05 - 0.3, abs <= 1e-12);
    assert_eq!(eq.vec[(9, 0)], 0.);

    // junction 0 of y: acceleration then jerk
    let t = crate::powers::<4>(0.5);
    let r = 10 + 2;
    assert_float_eq!(eq.mat[(r, sc.index(0, Axis::Y, Coeff::A))], 20. * t[3], abs <= 1e-12);
    assert_float_eq!(eq.mat[(r, sc.index(0, Axis::Y, Coeff::D))], 2., abs <= 1e-12);
    assert_eq!(eq.mat[(r, sc.index(1, Axis::Y, Coeff::D))], -2.);
    assert_float_eq!(eq.mat[(r + 1, sc.index(0, Axis::Y, Coeff::B))], 24. * t[1], abs <= 1e-12);
    assert_eq!(eq.mat[(r + 1, sc.index(1, Axis::Y, Coeff::C))], -6.);
}

#[test]
fn test_equality_end_state()
{
    use float_eq::assert_float_eq;
    use totsu_core::FloatGeneric;
    use crate::NullReporter;

    type L = FloatGeneric<f64>;

    let sc = SplineContainer::new()
             .spline(1.0, 0, true)
             .spline(0.7, 0, false);
    let bd = Boundary::new([0.1, 0.2], [0.3, -0.1], [1.0, -0.5]);
    let cont = sc.continuation(bd.start_p, bd.start_v);
    let eq = EqualityConstraints::<L>::build(&sc, &cont, &bd, &mut NullReporter);

    // rows evaluate the trajectory at the end of the last spline
    let n = sc.opt_coeff_count();
    let x: Vec<f64> = (0.. n).map(|i| ((i * 7) % 5) as f64 * 0.1 - 0.2).collect();
    let traj = sc.trajectory(bd.start_p, bd.start_v, &x);
    let end = traj.state(traj.duration());

    let row = |r: usize| (0.. n).map(|c| eq.mat[(r, c)] * x[c]).sum::<f64>() - eq.vec[(r, 0)];
    for axis in Axis::ALL {
        let o = axis.idx() * 5;
        let a = axis.idx();
        assert_float_eq!(row(o + 2), end.p[a] - bd.end_p[a], abs <= 1e-12);
        assert_float_eq!(row(o + 3), end.v[a] - bd.end_v[a], abs <= 1e-12);
        assert_float_eq!(row(o + 4), end.a[a] - bd.end_acc[a], abs <= 1e-12);
    }
}
