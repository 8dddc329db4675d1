use crate::{LegId, insert_4ls_phase};

//

/// Number of horizontal dimensions, x and y.
pub const DIM2D: usize = 2;

/// Number of free (optimized) coefficients per spline and dimension, `A`, `B`, `C` and `D`.
pub const OPT_COEFF: usize = 4;

/// Horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis
{
    X = 0,
    Y = 1,
}

impl Axis
{
    /// Both axes in index order.
    pub const ALL: [Axis; DIM2D] = [Axis::X, Axis::Y];

    /// Position of the axis in `[x, y]` arrays.
    pub fn idx(self) -> usize
    {
        self as usize
    }
}

/// Coefficient letter of a quintic \\(A t^5 + B t^4 + C t^3 + D t^2 + E t + F\\).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coeff
{
    A = 0,
    B,
    C,
    D,
    E,
    F,
}

impl Coeff
{
    /// Letters which are optimization variables.
    pub const FREE: [Coeff; OPT_COEFF] = [Coeff::A, Coeff::B, Coeff::C, Coeff::D];

    /// Position of the letter in `[A, B, C, D, E, F]` arrays.
    pub fn idx(self) -> usize
    {
        self as usize
    }
}

/// Index of a free coefficient in the optimization vector.
///
/// Layout is spline-major, then axis, then letter:
/// `ax0, bx0, cx0, dx0, ay0, by0, cy0, dy0, ax1, ...`.
/// * `spline` is the spline id.
/// * `axis` is the dimension.
/// * `coeff` shall be one of [`Coeff::FREE`].
pub fn var_index(spline: usize, axis: Axis, coeff: Coeff) -> usize
{
    assert!(coeff.idx() < OPT_COEFF, "{:?} is not an optimized coefficient", coeff);

    spline * DIM2D * OPT_COEFF + axis.idx() * OPT_COEFF + coeff.idx()
}

/// Inverse of [`var_index`].
///
/// Returns a tuple of spline id, axis and letter.
pub fn var_of_index(index: usize) -> (usize, Axis, Coeff)
{
    let spline = index / (DIM2D * OPT_COEFF);
    let axis = Axis::ALL[(index / OPT_COEFF) % DIM2D];
    let coeff = Coeff::FREE[index % OPT_COEFF];

    (spline, axis, coeff)
}

/// Powers \\(t^0, t^1, \ldots, t^{N-1}\\).
pub fn powers<const N: usize>(t: f64) -> [f64; N]
{
    let mut p = [1.; N];
    for i in 1.. N {
        p[i] = p[i - 1] * t;
    }
    p
}

//

/// Derivative order of a quintic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivative
{
    Pos,
    Vel,
    Acc,
    Jerk,
}

impl Derivative
{
    /// Factors multiplying `[A, B, C, D, E, F]` in this derivative at time `t`.
    pub fn basis(self, t: f64) -> [f64; 6]
    {
        let t = powers::<6>(t);

        match self {
            Derivative::Pos  => [t[5], t[4], t[3], t[2], t[1], t[0]],
            Derivative::Vel  => [5. * t[4], 4. * t[3], 3. * t[2], 2. * t[1], 1., 0.],
            Derivative::Acc  => [20. * t[3], 12. * t[2], 6. * t[1], 2., 0., 0.],
            Derivative::Jerk => [60. * t[2], 24. * t[1], 6., 0., 0., 0.],
        }
    }

    /// Value of this derivative of the quintic `coeff` at time `t`.
    pub fn eval(self, coeff: &[f64; 6], t: f64) -> f64
    {
        self.basis(t).iter().zip(coeff).map(|(b, c)| b * c).sum()
    }
}

//

/// One quintic segment of the center-of-gravity trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline
{
    /// Position in the sequence.
    pub id: usize,
    /// Duration in seconds.
    pub duration: f64,
    /// Index of the step (support triangle) this spline belongs to.
    pub step: usize,
    /// All legs on the ground; no stability constraint is needed.
    pub full_support: bool,
}

/// Durations used by [`SplineContainer::construct`].
#[derive(Debug, Clone, PartialEq)]
pub struct SplineTimes
{
    /// Swing phase of one leg.
    pub swing: f64,
    /// Four-leg phase inserted between disjoint support triangles.
    pub stance: f64,
    /// Four-leg phase before the first step.
    pub stance_initial: f64,
    /// Four-leg phase after the last step.
    pub stance_final: f64,
}

impl Default for SplineTimes
{
    fn default() -> Self
    {
        SplineTimes {
            swing: 0.7,
            stance: 0.4,
            stance_initial: 1.0,
            stance_final: 1.0,
        }
    }
}

//

/// Affine function \\(c^T x + d\\) of the optimization vector.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearForm
{
    /// Factor of each free coefficient.
    pub coeff: Vec<f64>,
    /// Part not depending on any free coefficient.
    pub constant: f64,
}

impl LinearForm
{
    /// Creates a form with all factors zero.
    pub fn constant(n: usize, constant: f64) -> Self
    {
        LinearForm {
            coeff: vec![0.; n],
            constant,
        }
    }

    /// Adds `alpha` times `other`.
    pub fn add_scaled(&mut self, alpha: f64, other: &LinearForm)
    {
        assert_eq!(self.coeff.len(), other.coeff.len());

        for (c, o) in self.coeff.iter_mut().zip(&other.coeff) {
            *c += alpha * o;
        }
        self.constant += alpha * other.constant;
    }

    /// Evaluates the form at `x`.
    pub fn eval(&self, x: &[f64]) -> f64
    {
        assert_eq!(self.coeff.len(), x.len());

        self.coeff.iter().zip(x).map(|(c, x)| c * x).sum::<f64>() + self.constant
    }
}

/// `E` and `F` of every spline and axis as [`LinearForm`]s of the preceding free coefficients.
///
/// Built once per setup by [`SplineContainer::continuation`]
/// and shared by the equality and inequality builders.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation
{
    e: [Vec<LinearForm>; DIM2D],
    f: [Vec<LinearForm>; DIM2D],
}

impl Continuation
{
    /// Velocity offset `E` of spline `k`.
    pub fn e(&self, k: usize, axis: Axis) -> &LinearForm
    {
        &self.e[axis.idx()][k]
    }

    /// Position offset `F` of spline `k`.
    pub fn f(&self, k: usize, axis: Axis) -> &LinearForm
    {
        &self.f[axis.idx()][k]
    }
}

//

/// Ordered sequence of [`Spline`]s making up a walking plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplineContainer
{
    splines: Vec<Spline>,
}

impl SplineContainer
{
    /// Creates an empty sequence.
    pub fn new() -> Self
    {
        SplineContainer {
            splines: Vec::new(),
        }
    }

    /// Appends a spline; its id is its position.
    ///
    /// * `duration` shall be positive.
    /// * `step` is the index of the support triangle.
    /// * `full_support` is `true` for four-leg phases.
    pub fn push(&mut self, duration: f64, step: usize, full_support: bool)
    {
        assert!(duration > 0., "spline duration must be positive: {}", duration);

        let id = self.splines.len();
        self.splines.push(Spline {
            id, duration, step, full_support,
        });
    }
    /// Builder pattern of [`SplineContainer::push`].
    pub fn spline(mut self, duration: f64, step: usize, full_support: bool) -> Self
    {
        self.push(duration, step, full_support);
        self
    }

    /// Builds the spline sequence of a step sequence.
    ///
    /// A four-leg phase opens and closes the sequence,
    /// and another one is inserted between two steps whose support triangles only share a diagonal.
    /// * `step_legs` are the swinging legs in stepping order.
    /// * `times` are the phase durations.
    pub fn construct(step_legs: &[LegId], times: &SplineTimes) -> Self
    {
        let mut sc = SplineContainer::new();

        if step_legs.is_empty() {
            return sc;
        }

        sc.push(times.stance_initial, 0, true);

        for (step, leg) in step_legs.iter().enumerate() {
            if step > 0 && insert_4ls_phase(step_legs[step - 1], *leg) {
                sc.push(times.stance, step, true);
            }
            sc.push(times.swing, step, false);
        }

        sc.push(times.stance_final, step_legs.len() - 1, true);

        sc
    }

    /// Splines in order.
    pub fn splines(&self) -> &[Spline]
    {
        &self.splines
    }

    /// Number of splines.
    pub fn len(&self) -> usize
    {
        self.splines.len()
    }

    /// Checks if no spline exists.
    pub fn is_empty(&self) -> bool
    {
        self.splines.is_empty()
    }

    /// Sum of all durations.
    pub fn total_duration(&self) -> f64
    {
        self.splines.iter().map(|s| s.duration).sum()
    }

    /// Number of optimization variables.
    pub fn opt_coeff_count(&self) -> usize
    {
        self.splines.len() * DIM2D * OPT_COEFF
    }

    /// Bounds-checked [`var_index`].
    pub fn index(&self, spline: usize, axis: Axis, coeff: Coeff) -> usize
    {
        assert!(spline < self.splines.len(), "spline {} out of {}", spline, self.splines.len());

        var_index(spline, axis, coeff)
    }

    /// Describes `E` of spline `k` by the free coefficients of all splines before it.
    ///
    /// Returns a [`LinearForm`] whose constant part is `start_v`.
    /// Not cached; the chain up to `k` is recomputed on every call,
    /// use [`SplineContainer::continuation`] for all splines at once.
    pub fn describe_e_by_prev(&self, k: usize, axis: Axis, start_v: f64) -> LinearForm
    {
        let (mut e, _) = self.chain(axis, 0., start_v, k + 1);
        e.swap_remove(k)
    }

    /// Describes `F` of spline `k` by the free coefficients of all splines before it.
    ///
    /// Not cached, like [`SplineContainer::describe_e_by_prev`].
    pub fn describe_f_by_prev(&self, k: usize, axis: Axis, start_v: f64, start_p: f64) -> LinearForm
    {
        let (_, mut f) = self.chain(axis, start_p, start_v, k + 1);
        f.swap_remove(k)
    }

    /// Computes `E` and `F` of every spline in one pass.
    ///
    /// * `start_p` is the start position of the center of gravity.
    /// * `start_v` is the start velocity of the center of gravity.
    pub fn continuation(&self, start_p: [f64; DIM2D], start_v: [f64; DIM2D]) -> Continuation
    {
        let k = self.splines.len();
        let (ex, fx) = self.chain(Axis::X, start_p[0], start_v[0], k);
        let (ey, fy) = self.chain(Axis::Y, start_p[1], start_v[1], k);

        Continuation {
            e: [ex, ey],
            f: [fx, fy],
        }
    }

    // E and F of splines 0..count: each junction carries the end velocity and
    // position of the previous spline into the next one.
    fn chain(&self, axis: Axis, start_p: f64, start_v: f64, count: usize) -> (Vec<LinearForm>, Vec<LinearForm>)
    {
        assert!(count <= self.splines.len(), "spline {} out of {}", count, self.splines.len());

        let n = self.opt_coeff_count();
        let mut e = LinearForm::constant(n, start_v);
        let mut f = LinearForm::constant(n, start_p);
        let mut es = Vec::with_capacity(count);
        let mut fs = Vec::with_capacity(count);

        for s in &self.splines[..count] {
            es.push(e.clone());
            fs.push(f.clone());

            let pos = Derivative::Pos.basis(s.duration);
            let vel = Derivative::Vel.basis(s.duration);

            // F must use E of the same spline, update it first
            f.add_scaled(s.duration, &e);
            for c in Coeff::FREE {
                let i = var_index(s.id, axis, c);
                f.coeff[i] += pos[c.idx()];
                e.coeff[i] += vel[c.idx()];
            }
        }

        (es, fs)
    }

    /// Fills all six coefficients of every spline from an optimized vector.
    ///
    /// Returns the resulting [`Trajectory`].
    /// * `start_p`, `start_v` shall be the same as given to [`SplineContainer::continuation`].
    /// * `x` is the optimization vector.
    pub fn trajectory(&self, start_p: [f64; DIM2D], start_v: [f64; DIM2D], x: &[f64]) -> Trajectory
    {
        assert_eq!(x.len(), self.opt_coeff_count());

        let cont = self.continuation(start_p, start_v);

        let coeff = self.splines.iter().map(|s| {
            let mut c = [[0.; 6]; DIM2D];
            for axis in Axis::ALL {
                let ca = &mut c[axis.idx()];
                for l in Coeff::FREE {
                    ca[l.idx()] = x[var_index(s.id, axis, l)];
                }
                ca[Coeff::E.idx()] = cont.e(s.id, axis).eval(x);
                ca[Coeff::F.idx()] = cont.f(s.id, axis).eval(x);
            }
            c
        }).collect();

        Trajectory {
            splines: self.splines.clone(),
            coeff,
        }
    }
}

//

/// Position, velocity and acceleration of the center of gravity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CogState
{
    pub p: [f64; DIM2D],
    pub v: [f64; DIM2D],
    pub a: [f64; DIM2D],
}

/// Spline sequence with all coefficients known.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory
{
    splines: Vec<Spline>,
    coeff: Vec<[[f64; 6]; DIM2D]>,
}

impl Trajectory
{
    /// `[A, B, C, D, E, F]` of a spline on an axis.
    pub fn coefficients(&self, spline: usize, axis: Axis) -> &[f64; 6]
    {
        &self.coeff[spline][axis.idx()]
    }

    /// Evaluates a derivative of a spline at its local time `t`.
    pub fn eval(&self, spline: usize, axis: Axis, deriv: Derivative, t: f64) -> f64
    {
        deriv.eval(self.coefficients(spline, axis), t)
    }

    /// Sum of all durations.
    pub fn duration(&self) -> f64
    {
        self.splines.iter().map(|s| s.duration).sum()
    }

    /// State at the global time `t`, clamped to the end of the last spline.
    pub fn state(&self, t: f64) -> CogState
    {
        let (k, t_local) = self.locate(t);

        let mut st = CogState::default();
        for axis in Axis::ALL {
            let c = self.coefficients(k, axis);
            st.p[axis.idx()] = Derivative::Pos.eval(c, t_local);
            st.v[axis.idx()] = Derivative::Vel.eval(c, t_local);
            st.a[axis.idx()] = Derivative::Acc.eval(c, t_local);
        }
        st
    }

    /// Approximated zero-moment point at the global time `t`, vertical acceleration neglected.
    pub fn zmp(&self, t: f64, height: f64, gravity: f64) -> [f64; DIM2D]
    {
        let st = self.state(t);
        let k = height / gravity;

        [st.p[0] - k * st.a[0], st.p[1] - k * st.a[1]]
    }

    fn locate(&self, t: f64) -> (usize, f64)
    {
        assert!(!self.splines.is_empty());

        let mut t_start = 0.;
        for s in &self.splines {
            if t < t_start + s.duration {
                return (s.id, (t - t_start).max(0.));
            }
            t_start += s.duration;
        }

        let last = self.splines.len() - 1;
        (last, self.splines[last].duration)
    }
}

//

#[test]
fn test_var_index_bijective()
{
    let sc = SplineContainer::new()
             .spline(0.5, 0, true)
             .spline(0.7, 0, false)
             .spline(0.3, 1, false);
    let n = sc.opt_coeff_count();
    assert_eq!(n, 3 * 2 * 4);

    let mut hit = vec![false; n];
    for s in sc.splines() {
        for axis in Axis::ALL {
            for c in Coeff::FREE {
                let i = sc.index(s.id, axis, c);
                assert!(i < n);
                assert!(!hit[i]);
                hit[i] = true;
                assert_eq!(var_of_index(i), (s.id, axis, c));
            }
        }
    }
    assert!(hit.iter().all(|h| *h));
}

#[test]
#[should_panic]
fn test_var_index_rejects_derived()
{
    var_index(0, Axis::X, Coeff::E);
}

#[test]
fn test_derivative_basis()
{
    use float_eq::assert_float_eq;

    let c = [1., -2., 3., -4., 5., -6.];
    let t = 0.7_f64;
    let pos = c[0] * t.powi(5) + c[1] * t.powi(4) + c[2] * t.powi(3) + c[3] * t * t + c[4] * t + c[5];
    let vel = 5. * c[0] * t.powi(4) + 4. * c[1] * t.powi(3) + 3. * c[2] * t * t + 2. * c[3] * t + c[4];
    let acc = 20. * c[0] * t.powi(3) + 12. * c[1] * t * t + 6. * c[2] * t + 2. * c[3];
    let jerk = 60. * c[0] * t * t + 24. * c[1] * t + 6. * c[2];

    assert_float_eq!(Derivative::Pos.eval(&c, t), pos, abs <= 1e-12);
    assert_float_eq!(Derivative::Vel.eval(&c, t), vel, abs <= 1e-12);
    assert_float_eq!(Derivative::Acc.eval(&c, t), acc, abs <= 1e-12);
    assert_float_eq!(Derivative::Jerk.eval(&c, t), jerk, abs <= 1e-12);
}

#[test]
fn test_continuation()
{
    use float_eq::assert_float_eq;

    let sc = SplineContainer::new()
             .spline(1.0, 0, true)
             .spline(0.5, 0, false)
             .spline(2.0, 1, false);
    let n = sc.opt_coeff_count();
    let x: Vec<f64> = (0.. n).map(|i| 0.1 * (i as f64) - 0.7).collect();
    let (p0, v0) = ([0.3, -0.2], [0.05, 0.1]);

    let cont = sc.continuation(p0, v0);
    let traj = sc.trajectory(p0, v0, &x);

    for axis in Axis::ALL {
        // first spline starts at the given state
        assert_float_eq!(cont.e(0, axis).eval(&x), v0[axis.idx()], abs <= 1e-12);
        assert_float_eq!(cont.f(0, axis).eval(&x), p0[axis.idx()], abs <= 1e-12);
        assert_eq!(cont.e(2, axis), &sc.describe_e_by_prev(2, axis, v0[axis.idx()]));
        assert_eq!(cont.f(2, axis), &sc.describe_f_by_prev(2, axis, v0[axis.idx()], p0[axis.idx()]));

        // position and velocity are continuous at every junction
        for k in 0.. sc.len() - 1 {
            let t = sc.splines()[k].duration;
            for d in [Derivative::Pos, Derivative::Vel] {
                assert_float_eq!(traj.eval(k, axis, d, t), traj.eval(k + 1, axis, d, 0.), abs <= 1e-9);
            }
        }

        // E depends on nothing after the previous spline
        let e1 = cont.e(1, axis);
        for i in 0.. n {
            if var_of_index(i).0 >= 1 {
                assert_eq!(e1.coeff[i], 0.);
            }
        }
    }
}

#[test]
fn test_construct()
{
    let times = SplineTimes {
        swing: 0.6, stance: 0.2, stance_initial: 1.0, stance_final: 0.8,
    };
    let sc = SplineContainer::construct(&[LegId::LH, LegId::LF, LegId::RH, LegId::RF], &times);

    // 4ls, LH, LF, 4ls (LF -> RH), RH, RF, 4ls
    let flags: Vec<(bool, usize)> = sc.splines().iter().map(|s| (s.full_support, s.step)).collect();
    assert_eq!(flags, vec![
        (true, 0), (false, 0), (false, 1), (true, 2), (false, 2), (false, 3), (true, 3),
    ]);
    assert_eq!(sc.splines()[3].duration, 0.2);
    assert_eq!(sc.splines()[6].duration, 0.8);
    assert!(sc.splines().iter().enumerate().all(|(i, s)| s.id == i));

    assert!(SplineContainer::construct(&[], &times).is_empty());
}
