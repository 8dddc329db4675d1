use std::time::Instant;
use totsu::MatBuild;
use totsu::prelude::MatType;
use totsu_core::LinAlgEx;
use crate::{SplineContainer, Continuation, Reporter, OptimizerParam, OptimizerError, SupportLine};
use crate::{Axis, Coeff, Derivative, DIM2D, var_of_index};

//

/// Number of stability samples \\(t = 0, dt, 2dt, \ldots\\) in a spline of `duration`.
///
/// A last interval shorter than `dt` is dropped.
/// The quotient is floored as computed in floating point,
/// so e.g. `0.7 / 0.1` gives 6 samples, not 7.
pub fn sample_count(duration: f64, dt: f64) -> usize
{
    (duration / dt).floor() as usize
}

/// Repeats the support lines of every spline once per sample.
///
/// Returns the line of each inequality row in row order.
/// Four-leg splines get no lines.
/// * `triangles` are the three lines of each step.
pub fn lines_for_constraint(splines: &SplineContainer, triangles: &[[SupportLine; 3]], dt: f64)
-> Result<Vec<SupportLine>, OptimizerError>
{
    let mut lines = Vec::new();

    for s in splines.splines() {
        if s.full_support {
            continue;
        }
        let tr = triangles.get(s.step).ok_or(OptimizerError::Configuration)?;

        for _ in 0.. sample_count(s.duration, dt) {
            lines.extend_from_slice(tr);
        }
    }

    Ok(lines)
}

//

/// Inequality constraints \\(A x \ge b\\) keeping the zero-moment point inside the support triangles.
///
/// Rows are ordered by spline, then sample, then triangle edge.
/// Each row is \\(p x_{\rm zmp} + q y_{\rm zmp} + r - s_{\rm margin} \ge 0\\)
/// at a sampled time, where \\(x_{\rm zmp} = x - {h \over g} \ddot x\\).
///
/// The unscaled rows \\(x_{\rm zmp}\\) and \\(y_{\rm zmp}\\) are kept
/// so that the constraints can be rebuilt for other lines.
#[derive(Clone)]
pub struct InequalityConstraints<L: LinAlgEx<F = f64>>
{
    pub mat: MatBuild<L>,
    pub vec: MatBuild<L>,
    raw: MatBuild<L>,
    offset: Vec<[f64; DIM2D]>,
    lines: Vec<SupportLine>,
}

impl<L: LinAlgEx<F = f64>> InequalityConstraints<L>
{
    /// Number of rows for `splines` sampled every `dt`.
    pub fn row_count(splines: &SplineContainer, dt: f64) -> usize
    {
        splines.splines().iter()
               .filter(|s| !s.full_support)
               .map(|s| 3 * sample_count(s.duration, dt))
               .sum()
    }

    /// Builds the constraints.
    ///
    /// * `splines` is the spline sequence.
    /// * `cont` shall be the continuation of `splines` from the start state.
    /// * `lines` are the support lines of each row, see [`lines_for_constraint`].
    /// * `height` is the height of the center of gravity.
    /// * `par` gives the sampling interval and gravity.
    /// * `rep` is notified of the result.
    pub fn build<R: Reporter>(splines: &SplineContainer, cont: &Continuation, lines: &[SupportLine],
                              height: f64, par: &OptimizerParam, rep: &mut R) -> Self
    {
        let start = Instant::now();

        let n = splines.opt_coeff_count();
        let m = Self::row_count(splines, par.dt);
        assert_eq!(lines.len(), m);

        // vertical acceleration of the body is not modeled
        let z_acc = 0.;
        let k = height / (par.gravity + z_acc);

        let mut raw = MatBuild::new(MatType::General(m, n));
        let mut offset = Vec::with_capacity(m);
        let mut row_raw = vec![0.; n];

        for s in splines.splines() {
            if s.full_support {
                continue;
            }

            for i in 0.. sample_count(s.duration, par.dt) {
                let t = i as f64 * par.dt;
                let pos = Derivative::Pos.basis(t);
                let acc = Derivative::Acc.basis(t);

                row_raw.fill(0.);
                let mut off = [0.; DIM2D];

                for axis in Axis::ALL {
                    let e = cont.e(s.id, axis);
                    let f = cont.f(s.id, axis);

                    for c in Coeff::FREE {
                        row_raw[splines.index(s.id, axis, c)] = pos[c.idx()] - k * acc[c.idx()];
                    }
                    // E and F never refer to the spline itself
                    for j in 0.. n {
                        row_raw[j] += e.coeff[j] * t + f.coeff[j];
                    }
                    off[axis.idx()] = e.constant * t + f.constant;
                }

                // one row per edge
                for _ in 0.. 3 {
                    let r = offset.len();
                    for j in 0.. n {
                        raw[(r, j)] = row_raw[j];
                    }
                    offset.push(off);
                }
            }
        }

        assert_eq!(offset.len(), m);

        let (mat, vec) = Self::scale(&raw, &offset, lines);

        rep.matrix_built("inequality constraints", &mat, mat.size(), start.elapsed());

        InequalityConstraints {
            mat,
            vec,
            raw,
            offset,
            lines: lines.to_vec(),
        }
    }

    fn scale(raw: &MatBuild<L>, offset: &[[f64; DIM2D]], lines: &[SupportLine]) -> (MatBuild<L>, MatBuild<L>)
    {
        let (m, n) = raw.size();
        assert_eq!(lines.len(), m);

        let mut mat = MatBuild::new(MatType::General(m, n));
        let mut vec = MatBuild::new(MatType::General(m, 1));

        for (r, l) in lines.iter().enumerate() {
            for j in 0.. n {
                let lc = match var_of_index(j).1 {
                    Axis::X => l.p,
                    Axis::Y => l.q,
                };
                mat[(r, j)] = raw[(r, j)] * lc;
            }

            let [ox, oy] = offset[r];
            vec[(r, 0)] = -(l.p * ox + l.q * oy + l.r - l.s_margin);
        }

        (mat, vec)
    }

    /// Rebuilds the constraints for other support lines, keeping the spline part.
    ///
    /// * `lines` shall have one line per row.
    pub fn with_lines(&self, lines: &[SupportLine]) -> Self
    {
        let (mat, vec) = Self::scale(&self.raw, &self.offset, lines);

        InequalityConstraints {
            mat,
            vec,
            raw: self.raw.clone(),
            offset: self.offset.clone(),
            lines: lines.to_vec(),
        }
    }

    /// Support line of each row.
    pub fn lines(&self) -> &[SupportLine]
    {
        &self.lines
    }

    /// Number of rows.
    pub fn len(&self) -> usize
    {
        self.lines.len()
    }

    /// Checks if no row exists.
    pub fn is_empty(&self) -> bool
    {
        self.lines.is_empty()
    }

    /// Zero-moment point of row `r`, the unscaled row evaluated at `x`.
    pub fn zmp(&self, r: usize, x: &[f64]) -> [f64; DIM2D]
    {
        let (_, n) = self.raw.size();
        assert_eq!(x.len(), n);

        let mut zmp = self.offset[r];
        for j in 0.. n {
            zmp[var_of_index(j).1.idx()] += self.raw[(r, j)] * x[j];
        }
        zmp
    }

    /// Returns \\(A x - b\\) of every row; negative entries are violated.
    pub fn slack(&self, x: &[f64]) -> Vec<f64>
    {
        let (m, n) = self.mat.size();
        assert_eq!(x.len(), n);

        (0.. m).map(|r| {
            let ax: f64 = (0.. n).map(|c| self.mat[(r, c)] * x[c]).sum();
            ax - self.vec[(r, 0)]
        }).collect()
    }
}

//

#[cfg(test)]
fn test_lines() -> [[SupportLine; 3]; 2]
{
    let l = |p: f64, q: f64, r: f64| {
        let nrm = p.hypot(q);
        SupportLine {
            p: p / nrm, q: q / nrm, r: r / nrm, s_margin: 0.05,
        }
    };

    [
        [l(1., 0., 0.5), l(-1., 1., 0.8), l(-1., -1., 0.8)],
        [l(0., 1., 0.4), l(1., -1., 0.6), l(-1., -0.5, 0.7)],
    ]
}

#[test]
fn test_inequality_rows()
{
    use float_eq::assert_float_eq;
    use totsu_core::FloatGeneric;
    use crate::NullReporter;

    type L = FloatGeneric<f64>;

    let sc = SplineContainer::new()
             .spline(0.9, 0, true)
             .spline(0.45, 0, false)
             .spline(0.25, 1, false)
             .spline(0.6, 1, true);
    let par = OptimizerParam {
        dt: 0.1,
        ..Default::default()
    };
    let (p0, v0) = ([0.05, -0.02], [0.1, 0.]);
    let height = 0.58;

    let tri = test_lines();
    let lines = lines_for_constraint(&sc, &tri, par.dt).unwrap();
    // 4 samples in 0.45 s, 2 samples in 0.25 s
    assert_eq!(lines.len(), 3 * (4 + 2));
    assert_eq!(InequalityConstraints::<L>::row_count(&sc, par.dt), lines.len());
    assert_eq!(&lines[0.. 3], &tri[0]);
    assert_eq!(&lines[12.. 15], &tri[1]);

    let cont = sc.continuation(p0, v0);
    let ineq = InequalityConstraints::<L>::build(&sc, &cont, &lines, height, &par, &mut NullReporter);
    assert_eq!(ineq.mat.size(), (18, sc.opt_coeff_count()));
    assert_eq!(ineq.len(), 18);

    // each row is the margin-reduced line value of the zero-moment point
    let n = sc.opt_coeff_count();
    let x: Vec<f64> = (0.. n).map(|i| ((i * 5) % 7) as f64 * 0.03 - 0.1).collect();
    let traj = sc.trajectory(p0, v0, &x);
    let slack = ineq.slack(&x);

    let mut r = 0;
    for (k, samples) in [(1, 4), (2, 2)] {
        for i in 0.. samples {
            let t = i as f64 * par.dt;
            let zmp = [Axis::X, Axis::Y].map(|axis| {
                traj.eval(k, axis, Derivative::Pos, t) - height / par.gravity * traj.eval(k, axis, Derivative::Acc, t)
            });
            for j in 0.. 3 {
                let l = tri[sc.splines()[k].step][j];
                assert_float_eq!(slack[r], l.value(zmp[0], zmp[1]), abs <= 1e-10);
                assert_float_eq!(ineq.zmp(r, &x), zmp, abs_all <= 1e-10);
                r += 1;
            }
        }
    }
    assert_eq!(r, 18);

    // full-support splines touch no column
    for r in 0.. 18 {
        for axis in Axis::ALL {
            for c in Coeff::FREE {
                assert_eq!(ineq.mat[(r, sc.index(3, axis, c))], 0.);
            }
        }
    }
}

#[test]
fn test_inequality_full_support_and_long_dt()
{
    use totsu_core::FloatGeneric;
    use crate::NullReporter;

    type L = FloatGeneric<f64>;

    let tri = test_lines();
    let par = OptimizerParam::default();

    let sc = SplineContainer::new()
             .spline(5.0, 0, true)
             .spline(3.0, 1, true);
    assert_eq!(InequalityConstraints::<L>::row_count(&sc, par.dt), 0);

    // floored in floating point
    assert_eq!(sample_count(0.7, 0.1), 6);
    assert_eq!(sample_count(0.3, 0.1), 2);
    assert_eq!(sample_count(0.5, 0.1), 5);

    // dt longer than the spline
    let sc = SplineContainer::new()
             .spline(1.0, 0, true)
             .spline(0.05, 0, false);
    let lines = lines_for_constraint(&sc, &tri, par.dt).unwrap();
    assert!(lines.is_empty());
    let cont = sc.continuation([0., 0.], [0., 0.]);
    let ineq = InequalityConstraints::<L>::build(&sc, &cont, &lines, 0.5, &par, &mut NullReporter);
    assert!(ineq.is_empty());
    assert_eq!(ineq.mat.size(), (0, sc.opt_coeff_count()));

    // missing step
    let sc = SplineContainer::new().spline(1.0, 2, false);
    assert_eq!(lines_for_constraint(&sc, &tri, par.dt), Err(OptimizerError::Configuration));
}

#[test]
fn test_inequality_with_lines()
{
    use float_eq::assert_float_eq;
    use totsu_core::FloatGeneric;
    use crate::NullReporter;

    type L = FloatGeneric<f64>;

    let tri = test_lines();
    let par = OptimizerParam::default();
    let sc = SplineContainer::new()
             .spline(0.5, 0, false)
             .spline(0.5, 1, false);
    let cont = sc.continuation([0.1, 0.1], [0., 0.2]);

    let lines = lines_for_constraint(&sc, &tri, par.dt).unwrap();
    let ineq = InequalityConstraints::<L>::build(&sc, &cont, &lines, 0.6, &par, &mut NullReporter);

    // same lines give the same constraints
    let same = ineq.with_lines(&lines);
    assert_eq!(same.mat.as_ref(), ineq.mat.as_ref());
    assert_eq!(same.vec.as_ref(), ineq.vec.as_ref());

    // swapped triangles
    let swapped = [tri[1], tri[0]];
    let other = lines_for_constraint(&sc, &swapped, par.dt).unwrap();
    let moved = ineq.with_lines(&other);
    let direct = InequalityConstraints::<L>::build(&sc, &cont, &other, 0.6, &par, &mut NullReporter);
    assert_float_eq!(moved.mat.as_ref(), direct.mat.as_ref(), abs_all <= 1e-15);
    assert_float_eq!(moved.vec.as_ref(), direct.vec.as_ref(), abs_all <= 1e-15);
    assert_eq!(moved.lines(), &other[..]);
}
