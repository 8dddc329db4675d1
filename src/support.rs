use core::ops::{Index, IndexMut};

//

/// Leg of a quadruped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegId
{
    /// Left front.
    LF = 0,
    /// Right front.
    RF,
    /// Left hind.
    LH,
    /// Right hind.
    RH,
}

impl LegId
{
    /// All legs in index order.
    pub const ALL: [LegId; 4] = [LegId::LF, LegId::RF, LegId::LH, LegId::RH];

    pub fn is_left(self) -> bool
    {
        matches!(self, LegId::LF | LegId::LH)
    }

    pub fn is_front(self) -> bool
    {
        matches!(self, LegId::LF | LegId::RF)
    }

    /// Leg on the opposite corner.
    pub fn diagonal(self) -> LegId
    {
        match self {
            LegId::LF => LegId::RH,
            LegId::RF => LegId::LH,
            LegId::LH => LegId::RF,
            LegId::RH => LegId::LF,
        }
    }
}

/// Checks if stepping `prev` then `next` switches between support triangles sharing only a diagonal.
///
/// Such triangles do not overlap once stability margins are applied,
/// so the zero-moment point needs a four-leg phase to cross over.
pub fn insert_4ls_phase(prev: LegId, next: LegId) -> bool
{
    next == prev.diagonal()
}

/// One value per leg, indexed by [`LegId`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegDataMap<T>(pub [T; 4]);

impl<T> Index<LegId> for LegDataMap<T>
{
    type Output = T;
    fn index(&self, leg: LegId) -> &Self::Output
    {
        &self.0[leg as usize]
    }
}

impl<T> IndexMut<LegId> for LegDataMap<T>
{
    fn index_mut(&mut self, leg: LegId) -> &mut Self::Output
    {
        &mut self.0[leg as usize]
    }
}

//

/// Ground contact of a leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Foothold
{
    pub x: f64,
    pub y: f64,
    pub leg: LegId,
}

impl Foothold
{
    pub fn new(x: f64, y: f64, leg: LegId) -> Self
    {
        Foothold {
            x, y, leg,
        }
    }
}

/// Creates a stance from four footholds in [`LegId::ALL`] order.
///
/// Panics if a foothold's leg does not match its position.
pub fn stance(footholds: [Foothold; 4]) -> LegDataMap<Foothold>
{
    for (f, leg) in footholds.iter().zip(LegId::ALL) {
        assert_eq!(f.leg, leg);
    }
    LegDataMap(footholds)
}

/// Mean position of a stance.
pub fn stance_center(stance: &LegDataMap<Foothold>) -> [f64; 2]
{
    let n = stance.0.len() as f64;
    let (sx, sy) = stance.0.iter().fold((0., 0.), |(sx, sy), f| (sx + f.x, sy + f.y));

    [sx / n, sy / n]
}

//

/// Stability margins by the kind of support triangle edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginValues
{
    /// Edge between both front legs.
    pub front: f64,
    /// Edge between both hind legs.
    pub hind: f64,
    /// Edge between front and hind leg of the same side.
    pub side: f64,
    /// Edge between diagonally opposite legs.
    pub diag: f64,
}

impl MarginValues
{
    /// Same margin on every edge.
    pub fn uniform(m: f64) -> Self
    {
        MarginValues {
            front: m, hind: m, side: m, diag: m,
        }
    }

    /// Margin of an edge between two legs.
    pub fn between(&self, a: LegId, b: LegId) -> f64
    {
        if a.is_front() && b.is_front() {
            self.front
        }
        else if !a.is_front() && !b.is_front() {
            self.hind
        }
        else if a.is_left() == b.is_left() {
            self.side
        }
        else {
            self.diag
        }
    }
}

impl Default for MarginValues
{
    fn default() -> Self
    {
        MarginValues {
            front: 0.1,
            hind: 0.1,
            side: 0.1,
            diag: 0.08,
        }
    }
}

/// Half-plane of a support polygon edge.
///
/// A point \\((x, y)\\) is stable when \\(p x + q y + r - s_{\rm margin} \ge 0\\).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportLine
{
    pub p: f64,
    pub q: f64,
    pub r: f64,
    pub s_margin: f64,
}

impl SupportLine
{
    /// Signed distance-like value \\(p x + q y + r - s_{\rm margin}\\).
    pub fn value(&self, x: f64, y: f64) -> f64
    {
        self.p * x + self.q * y + self.r - self.s_margin
    }

    pub fn is_stable(&self, x: f64, y: f64) -> bool
    {
        self.value(x, y) >= 0.
    }
}

//

/// Triangle of the three legs on the ground while the fourth one swings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuppTriangle
{
    pub footholds: [Foothold; 3],
    pub margins: MarginValues,
}

impl SuppTriangle
{
    /// Support triangles of a step sequence.
    ///
    /// Returns one triangle per step and the stance after the last step.
    /// * `start_stance` is where all legs stand before the first step.
    /// * `steps` are the planned footholds; each one's leg swings to it.
    /// * `margins` are applied to every triangle.
    pub fn from_footholds(start_stance: &LegDataMap<Foothold>, steps: &[Foothold], margins: &MarginValues)
    -> (Vec<SuppTriangle>, LegDataMap<Foothold>)
    {
        let mut stance = *start_stance;
        let mut triangles = Vec::with_capacity(steps.len());

        for step in steps {
            let mut footholds = [stance[LegId::LF]; 3];
            let on_ground = LegId::ALL.iter().filter(|l| **l != step.leg);
            for (f, leg) in footholds.iter_mut().zip(on_ground) {
                *f = stance[*leg];
            }

            triangles.push(SuppTriangle {
                footholds,
                margins: *margins,
            });
            stance[step.leg] = *step;
        }

        (triangles, stance)
    }

    /// Edge half-planes, normalized and oriented towards the inside.
    pub fn lines(&self) -> [SupportLine; 3]
    {
        let f = &self.footholds;

        [
            self.line(&f[0], &f[1], &f[2]),
            self.line(&f[1], &f[2], &f[0]),
            self.line(&f[2], &f[0], &f[1]),
        ]
    }

    fn line(&self, a: &Foothold, b: &Foothold, opposite: &Foothold) -> SupportLine
    {
        let mut p = a.y - b.y;
        let mut q = b.x - a.x;
        let norm = p.hypot(q);
        if norm > 0. {
            p /= norm;
            q /= norm;
        }
        let mut r = -(p * a.x + q * a.y);

        if p * opposite.x + q * opposite.y + r < 0. {
            p = -p;
            q = -q;
            r = -r;
        }

        SupportLine {
            p, q, r,
            s_margin: self.margins.between(a.leg, b.leg),
        }
    }
}

/// Source of support polygon edges for a walking plan.
pub trait SupportGeometry
{
    /// Returns the three edge lines of every step and the stance after the last step.
    fn support_lines(&self, start_stance: &LegDataMap<Foothold>, steps: &[Foothold], margins: &MarginValues)
    -> (Vec<[SupportLine; 3]>, LegDataMap<Foothold>);
}

/// [`SupportGeometry`] by [`SuppTriangle`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriangleGeometry;

impl SupportGeometry for TriangleGeometry
{
    fn support_lines(&self, start_stance: &LegDataMap<Foothold>, steps: &[Foothold], margins: &MarginValues)
    -> (Vec<[SupportLine; 3]>, LegDataMap<Foothold>)
    {
        let (tr, final_stance) = SuppTriangle::from_footholds(start_stance, steps, margins);

        (tr.iter().map(|t| t.lines()).collect(), final_stance)
    }
}

//

#[test]
fn test_supp_triangle()
{
    use float_eq::assert_float_eq;

    let start = stance([
        Foothold::new(0.35, 0.3, LegId::LF),
        Foothold::new(0.35, -0.3, LegId::RF),
        Foothold::new(-0.35, 0.3, LegId::LH),
        Foothold::new(-0.35, -0.3, LegId::RH),
    ]);
    let steps = [
        Foothold::new(-0.25, 0.3, LegId::LH),
        Foothold::new(0.45, 0.3, LegId::LF),
    ];
    let margins = MarginValues {
        front: 0.1, hind: 0.2, side: 0.3, diag: 0.4,
    };

    let (tr, last) = SuppTriangle::from_footholds(&start, &steps, &margins);
    assert_eq!(tr.len(), 2);
    assert_eq!(tr[0].footholds.map(|f| f.leg), [LegId::LF, LegId::RF, LegId::RH]);
    // second triangle already stands on the new LH foothold
    assert_eq!(tr[1].footholds.map(|f| f.leg), [LegId::RF, LegId::LH, LegId::RH]);
    assert_float_eq!(tr[1].footholds[1].x, -0.25, abs <= 1e-12);
    assert_eq!(last[LegId::LH], steps[0]);
    assert_eq!(last[LegId::LF], steps[1]);
    assert_eq!(last[LegId::RF], start[LegId::RF]);

    let lines = tr[0].lines();
    // LF-RF, RF-RH, RH-LF
    assert_eq!(lines.map(|l| l.s_margin), [0.1, 0.3, 0.4]);
    for l in lines {
        assert_float_eq!(l.p.hypot(l.q), 1., abs <= 1e-12);
        // centroid lies inside by more than the margins allow here
        let (cx, cy) = (0.35 / 3., -0.3 / 3.);
        assert!(l.value(cx, cy) + l.s_margin > 0.);
        // corners lie on or inside every edge
        for f in &tr[0].footholds {
            assert!(l.value(f.x, f.y) + l.s_margin > -1e-12);
        }
    }
    // front edge is the line x = 0.35 facing backward
    assert_float_eq!([lines[0].p, lines[0].q, lines[0].r], [-1., 0., 0.35], abs_all <= 1e-12);

    assert_float_eq!(stance_center(&start), [0., 0.], abs_all <= 1e-12);
}

#[test]
fn test_insert_4ls_phase()
{
    assert!(insert_4ls_phase(LegId::LF, LegId::RH));
    assert!(insert_4ls_phase(LegId::RH, LegId::LF));
    assert!(insert_4ls_phase(LegId::RF, LegId::LH));
    assert!(!insert_4ls_phase(LegId::LH, LegId::LF));
    assert!(!insert_4ls_phase(LegId::RH, LegId::RF));
}
