use float_eq::assert_float_eq;
use zmp_spline::prelude::*;
use zmp_spline::*;

type La = FloatGeneric<f64>;

//

// four-leg phase, then RF swings inside the triangle LF (2, 0), LH (-1, 1), RH (-1, -1);
// the final stance is centered at (0.2, 0)
fn scenario() -> (SplineContainer, SetupInput)
{
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

    (splines, input)
}

fn square_stance() -> LegDataMap<Foothold>
{
    stance([
        Foothold::new(0.35, 0.3, LegId::LF),
        Foothold::new(0.35, -0.3, LegId::RF),
        Foothold::new(-0.35, 0.3, LegId::LH),
        Foothold::new(-0.35, -0.3, LegId::RH),
    ])
}

//

#[test]
fn test_scenario()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (splines, input) = scenario();
    let mut opt = ZmpOptimizer::new(splines.clone()).with_reporter(LogReporter);
    assert_eq!(opt.splines(), &splines);

    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();
    assert_eq!(prob.eq.mat.size(), (2 * 2 + 3 * 2 + 2 * 2, 16));
    // no rows for the four-leg phase, 10 samples of 3 edges for the swing
    assert_eq!(prob.ineq.mat.size(), (30, 16));
    assert_eq!(prob.boundary.end_p, [0.2, 0.]);

    for r in 0.. 16 {
        for c in 0.. 16 {
            assert_eq!(prob.cost.sym_m[(r, c)], prob.cost.sym_m[(c, r)]);
        }
    }

    let sol = opt.solve_qp(DirectQp::new(), &prob).unwrap();
    let x = &sol.coefficients;

    assert!(prob.eq.residual(x) <= 1e-9);
    assert_float_eq!(sol.cost, 69. / 560., rmax <= 1e-9);
    assert_eq!(sol.footholds, input.steps);

    let ref_x = [
        -27. / 320., 5. / 32., 0., 0.,
        0., 0., 0., 0.,
        21. / 320., -1. / 64., -7. / 32., 3. / 32.,
        0., 0., 0., 0.,
    ];
    assert_float_eq!(&x[..], ref_x.as_ref(), abs_all <= 1e-9);

    let traj = prob.trajectory(x);
    let end = traj.state(traj.duration());
    assert_float_eq!(end.p, [0.2, 0.], abs_all <= 1e-6);
    assert_float_eq!(end.v, [0., 0.], abs_all <= 1e-6);
    assert_float_eq!(end.a, [0., 0.], abs_all <= 1e-6);

    for axis in Axis::ALL {
        for d in [Derivative::Pos, Derivative::Vel, Derivative::Acc, Derivative::Jerk] {
            assert_float_eq!(traj.eval(0, axis, d, 1.0), traj.eval(1, axis, d, 0.), abs <= 1e-6);
        }
    }

    // margins are not active
    let (_, slack) = prob.min_slack(x).unwrap();
    assert!(slack > 0.4);
    for r in 0.. prob.ineq.len() {
        let zmp = prob.ineq.zmp(r, x);
        assert!(prob.ineq.lines()[r].is_stable(zmp[0], zmp[1]));
    }
    // fourth sample of the swing
    assert_float_eq!(traj.zmp(1.3, 0.58, opt.par.gravity), prob.ineq.zmp(9, x), abs_all <= 1e-9);
}

#[test]
fn test_equality_only_single_spline()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let sc = SplineContainer::new().spline(1.5, 0, true);
    let input = SetupInput {
        start_cog_p: [0., 0.],
        start_cog_v: [0., 0.],
        start_stance: square_stance(),
        steps: vec![Foothold::new(0.35, 0.3, LegId::LF)],
        weight: [1., 1.],
        margins: MarginValues::default(),
        height_robot: 0.58,
    };

    let mut opt = ZmpOptimizer::new(sc);
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();
    assert!(prob.ineq.is_empty());
    assert_eq!(prob.boundary.end_p, [0., 0.]);

    // at rest at the target already: the only quintic is constant
    let sol = DirectQp::new().solve_qp(&prob).unwrap();
    assert!(prob.eq.residual(&sol.x) <= 1e-9);
    assert_float_eq!(&sol.x[..], [0.; 8].as_ref(), abs_all <= 1e-12);
    assert_float_eq!(sol.cost, 0., abs <= 1e-12);

    // which is rejected as trivial
    match opt.solve_qp(DirectQp::new(), &prob) {
        Err(OptimizerError::InfeasibleSolution(c)) => assert!(c < opt.par.eps_cost),
        _ => panic!("trivial solution accepted"),
    }

    // one spline cannot move and stop with zero start acceleration and jerk
    let moved = SetupInput {
        start_cog_p: [-0.1, 0.05],
        ..input
    };
    let prob = opt.setup::<La, _>(&TriangleGeometry, &moved).unwrap();
    let sol = DirectQp::new().solve_qp(&prob).unwrap();
    assert_eq!(sol.cost, f64::INFINITY);
    match opt.solve_qp(DirectQp::new(), &prob) {
        Err(OptimizerError::InfeasibleSolution(c)) => assert!(c.is_infinite()),
        _ => panic!("inconsistent constraints accepted"),
    }
}

#[test]
fn test_configuration_errors()
{
    let (splines, input) = scenario();

    let mut opt = ZmpOptimizer::new(SplineContainer::new());
    assert!(matches!(opt.setup::<La, _>(&TriangleGeometry, &input), Err(OptimizerError::Configuration)));

    let mut opt = ZmpOptimizer::new(splines).par(|p| p.dt = 0.);
    assert!(matches!(opt.setup::<La, _>(&TriangleGeometry, &input), Err(OptimizerError::Configuration)));

    // swing spline of a step that is not planned
    let sc = SplineContainer::new()
             .spline(1.0, 0, true)
             .spline(1.0, 1, false);
    let mut opt = ZmpOptimizer::new(sc);
    assert!(matches!(opt.setup::<La, _>(&TriangleGeometry, &input), Err(OptimizerError::Configuration)));
}

#[test]
fn test_long_dt()
{
    let (splines, input) = scenario();
    let mut opt = ZmpOptimizer::new(splines).par(|p| p.dt = 1.5);

    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();
    assert!(prob.ineq.is_empty());
    assert_eq!(prob.ineq.mat.size(), (0, 16));

    // same solution without stability rows
    let sol = opt.solve_qp(DirectQp::new(), &prob).unwrap();
    assert_float_eq!(sol.cost, 69. / 560., rmax <= 1e-9);
}

#[test]
fn test_idempotent()
{
    let (splines, input) = scenario();
    let mut opt = ZmpOptimizer::new(splines);

    let prob1 = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();
    let sol1 = opt.solve_qp(DirectQp::new(), &prob1).unwrap();
    let prob2 = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();
    let sol2 = opt.solve_qp(DirectQp::new(), &prob2).unwrap();

    assert_eq!(prob1.cost.sym_m.as_ref(), prob2.cost.sym_m.as_ref());
    assert_eq!(prob1.eq.mat.as_ref(), prob2.eq.mat.as_ref());
    assert_eq!(prob1.eq.vec.as_ref(), prob2.eq.vec.as_ref());
    assert_eq!(prob1.ineq.mat.as_ref(), prob2.ineq.mat.as_ref());
    assert_eq!(prob1.ineq.vec.as_ref(), prob2.ineq.vec.as_ref());
    assert_eq!(sol1, sol2);
}

#[test]
fn test_cost_threshold()
{
    let (splines, input) = scenario();
    let mut opt = ZmpOptimizer::new(splines).par(|p| p.eps_cost = 1.0);

    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();
    match opt.solve_qp(DirectQp::new(), &prob) {
        Err(OptimizerError::InfeasibleSolution(c)) => assert_float_eq!(c, 69. / 560., rmax <= 1e-9),
        _ => panic!("cost below threshold accepted"),
    }
}

#[test]
fn test_active_inequality()
{
    let (splines, mut input) = scenario();
    // margins wider than the triangle allows
    input.margins = MarginValues::uniform(0.8);

    let mut opt = ZmpOptimizer::new(splines);
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();

    match opt.solve_qp(DirectQp::new(), &prob) {
        Err(OptimizerError::ActiveInequality(r)) => assert!(r < prob.ineq.len()),
        _ => panic!("violated margin accepted"),
    }
}

#[test]
fn test_constructed_plan()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let start = square_stance();
    let steps = vec![
        Foothold::new(-0.25, 0.3, LegId::LH),
        Foothold::new(0.45, 0.3, LegId::LF),
        Foothold::new(-0.25, -0.3, LegId::RH),
        Foothold::new(0.45, -0.3, LegId::RF),
    ];
    let legs: Vec<LegId> = steps.iter().map(|f| f.leg).collect();
    let times = SplineTimes::default();
    let sc = SplineContainer::construct(&legs, &times);
    // LF -> RH needs a four-leg phase
    assert_eq!(sc.len(), 1 + 4 + 1 + 1);

    let input = SetupInput {
        start_cog_p: [0., 0.],
        start_cog_v: [0., 0.],
        start_stance: start,
        steps,
        weight: [1., 1.],
        margins: MarginValues::default(),
        height_robot: 0.58,
    };

    let mut opt = ZmpOptimizer::new(sc.clone());
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();

    let k = sc.len();
    assert_eq!(prob.eq.mat.size(), (10 + 4 * (k - 1), 8 * k));
    let swing_rows = 3 * sample_count(times.swing, opt.par.dt);
    assert_eq!(prob.ineq.len(), 4 * swing_rows);
    assert_float_eq!(prob.boundary.end_p, [0.1, 0.], abs_all <= 1e-12);

    // rows of the third swing use the triangle without RH
    let (tr, _) = SuppTriangle::from_footholds(&start, &input.steps, &input.margins);
    let r = 2 * swing_rows;
    assert_eq!(&prob.ineq.lines()[r.. r + 3], &tr[2].lines());
    assert!(tr[2].footholds.iter().all(|f| f.leg != LegId::RH));
}

//

struct RecordingReporter
{
    built: Vec<(String, (usize, usize))>,
    costs: Vec<f64>,
}

impl Reporter for RecordingReporter
{
    fn matrix_built(&mut self, name: &str, _mat: &dyn core::fmt::Display, size: (usize, usize), _elapsed: std::time::Duration)
    {
        self.built.push((name.to_string(), size));
    }

    fn solved(&mut self, cost: f64, _elapsed: std::time::Duration)
    {
        self.costs.push(cost);
    }
}

#[test]
fn test_reporter()
{
    let (splines, input) = scenario();
    let mut rec = RecordingReporter {
        built: Vec::new(),
        costs: Vec::new(),
    };

    {
        let mut opt = ZmpOptimizer::new(splines).with_reporter(&mut rec);
        let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();
        opt.solve_qp(DirectQp::new(), &prob).unwrap();
        assert_eq!(opt.reporter().built.len(), 3);
    }

    assert_eq!(rec.built, vec![
        ("cost function".to_string(), (16, 16)),
        ("equality constraints".to_string(), (14, 16)),
        ("inequality constraints".to_string(), (30, 16)),
    ]);
    assert_eq!(rec.costs.len(), 1);
    assert_float_eq!(rec.costs[0], 69. / 560., rmax <= 1e-9);
}
