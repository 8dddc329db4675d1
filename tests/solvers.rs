use float_eq::assert_float_eq;
use zmp_spline::prelude::*;
use zmp_spline::*;

type La = FloatGeneric<f64>;

//

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

//

struct FixedCost(f64);

impl QpSolver<La> for FixedCost
{
    fn solve_qp(&self, prob: &ProblemArtifacts<La>) -> Result<QpSolution, OptimizerError>
    {
        Ok(QpSolution {
            x: vec![0.; prob.dim()],
            cost: self.0,
        })
    }
}

#[test]
fn test_qp_strategy_threshold()
{
    let (splines, input) = scenario();
    let mut opt = ZmpOptimizer::new(splines);
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();

    for cost in [f64::INFINITY, f64::NAN, 0., 0.001] {
        let r = opt.solve_qp(FixedCost(cost), &prob);
        assert!(matches!(r, Err(OptimizerError::InfeasibleSolution(_))), "cost {}", cost);
    }

    let sol = opt.solve_qp(FixedCost(0.5), &prob).unwrap();
    assert_eq!(sol.cost, 0.5);
    assert_eq!(sol.coefficients.len(), 16);

    // threshold is a parameter
    let mut opt = opt.par(|p| p.eps_cost = 0.);
    assert!(opt.solve_qp(FixedCost(0.001), &prob).is_ok());
}

//

struct FailingInit;

impl NlpSolver<La> for FailingInit
{
    fn initialize(&mut self) -> Result<(), SolverError>
    {
        Err(SolverError::InvalidOp)
    }

    fn optimize(&mut self, _prob: &ProblemArtifacts<La>, _initial_guess: &[f64]) -> Result<NlpSolution, SolverError>
    {
        unreachable!()
    }
}

// moves every planned foothold forward, keeping the coefficients if still stable
struct ShiftFootholds
{
    shift: f64,
    dt: f64,
    initialized: bool,
}

impl NlpSolver<La> for ShiftFootholds
{
    fn initialize(&mut self) -> Result<(), SolverError>
    {
        self.initialized = true;
        Ok(())
    }

    fn optimize(&mut self, prob: &ProblemArtifacts<La>, initial_guess: &[f64]) -> Result<NlpSolution, SolverError>
    {
        assert!(self.initialized);

        let footholds: Vec<Foothold> = prob.steps.iter()
                                           .map(|f| Foothold::new(f.x + self.shift, f.y, f.leg))
                                           .collect();
        let (tri, _) = TriangleGeometry.support_lines(&prob.start_stance, &footholds, &prob.margins);
        let lines = lines_for_constraint(&prob.splines, &tri, self.dt).map_err(|_| SolverError::InvalidOp)?;
        let moved = prob.rescale_inequality(&lines);

        match moved.min_slack(initial_guess) {
            Some((_, s)) if s < 0. => Err(SolverError::Infeasible),
            _ => Ok(NlpSolution {
                coefficients: initial_guess.to_vec(),
                footholds,
            }),
        }
    }
}

#[test]
fn test_nonlinear()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (splines, input) = scenario();
    let mut opt = ZmpOptimizer::new(splines).with_reporter(LogReporter);
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();

    let guess = opt.solve_qp(DirectQp::new(), &prob).unwrap().coefficients;

    match opt.solve_nonlinear(FailingInit, &prob, &guess) {
        Err(OptimizerError::SolverInit(SolverError::InvalidOp)) => {},
        _ => panic!("initialization failure not reported"),
    }

    let nlp = ShiftFootholds {
        shift: 0.05,
        dt: opt.par.dt,
        initialized: false,
    };
    let sol = opt.solve_nonlinear(nlp, &prob, &guess).unwrap();
    assert_eq!(sol.coefficients, guess);
    assert_float_eq!(sol.cost, 69. / 560., rmax <= 1e-9);
    assert_eq!(sol.footholds, vec![Foothold::new(0.8 + 0.05, 0., LegId::RF)]);
}

#[test]
fn test_nonlinear_failure()
{
    // LH swings after RF; moving RF far back leaves the second triangle behind the trajectory
    let splines = SplineContainer::new()
                  .spline(1.0, 0, true)
                  .spline(1.0, 0, false)
                  .spline(1.0, 1, false)
                  .spline(1.0, 1, true);
    let (_, mut input) = scenario();
    input.steps.push(Foothold::new(-1., 1., LegId::LH));

    let mut opt = ZmpOptimizer::new(splines);
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();
    let guess = vec![0.; prob.dim()];

    let nlp = ShiftFootholds {
        shift: -5.,
        dt: opt.par.dt,
        initialized: false,
    };
    match opt.solve_nonlinear(nlp, &prob, &guess) {
        Err(OptimizerError::Solver(SolverError::Infeasible)) => {},
        _ => panic!("optimization failure not reported"),
    }
}

//

#[test]
fn test_totsu_qp()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (splines, input) = scenario();
    let mut opt = ZmpOptimizer::new(splines).with_reporter(LogReporter);
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();

    let qp = TotsuQp::new().par(|p| {
        p.eps_acc = 1e-4;
        p.max_iter = Some(1_000_000);
    });
    let sol = opt.solve_qp(qp, &prob).unwrap();

    assert!(prob.eq.residual(&sol.coefficients) <= 1e-2);
    assert_float_eq!(sol.cost, 69. / 560., abs <= 1e-2);

    let traj = prob.trajectory(&sol.coefficients);
    assert_float_eq!(traj.state(traj.duration()).p, [0.2, 0.], abs_all <= 1e-2);
}

// RF swings for 2 s between four-leg phases
fn long_swing(margin: f64) -> (SplineContainer, SetupInput)
{
    let splines = SplineContainer::new()
                  .spline(1.0, 0, true)
                  .spline(2.0, 0, false)
                  .spline(1.0, 0, true);
    let (_, mut input) = scenario();
    input.margins = MarginValues::uniform(margin);

    (splines, input)
}

#[test]
fn test_totsu_qp_active_margin()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (splines, input) = long_swing(0.6);
    let mut opt = ZmpOptimizer::new(splines);
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();

    // equalities alone leave the zero-moment point outside the margin
    match opt.solve_qp(DirectQp::new(), &prob) {
        Err(OptimizerError::ActiveInequality(r)) => assert!(r < prob.ineq.len()),
        _ => panic!("margin not active"),
    }

    let qp = TotsuQp::new().par(|p| {
        p.max_iter = Some(1_000_000);
    });
    let sol = opt.solve_qp(qp, &prob).unwrap();

    assert!(prob.eq.residual(&sol.coefficients) <= 1e-5);
    // kept inside, touching the margin
    let (_, slack) = prob.min_slack(&sol.coefficients).unwrap();
    assert!(slack >= -1e-5, "slack {}", slack);
    assert!(slack <= 1e-4, "slack {}", slack);
}

#[test]
fn test_totsu_qp_infeasible()
{
    let _ = env_logger::builder().is_test(true).try_init();

    // wider than the triangle's inradius
    let (splines, input) = long_swing(0.8);
    let mut opt = ZmpOptimizer::new(splines);
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();

    let qp = TotsuQp::new().par(|p| {
        p.max_iter = Some(1_000_000);
    });
    match opt.solve_qp(qp, &prob) {
        Err(OptimizerError::InfeasibleSolution(c)) => assert!(c.is_infinite()),
        r => panic!("infeasible margins accepted: {:?}", r.map(|s| s.cost)),
    }
}

//

struct ShortResult;

impl NlpSolver<La> for ShortResult
{
    fn initialize(&mut self) -> Result<(), SolverError>
    {
        Ok(())
    }

    fn optimize(&mut self, prob: &ProblemArtifacts<La>, _initial_guess: &[f64]) -> Result<NlpSolution, SolverError>
    {
        Ok(NlpSolution {
            coefficients: vec![0.; 3],
            footholds: prob.steps.clone(),
        })
    }
}

#[test]
fn test_nonlinear_dimension_mismatch()
{
    let (splines, input) = scenario();
    let mut opt = ZmpOptimizer::new(splines);
    let prob = opt.setup::<La, _>(&TriangleGeometry, &input).unwrap();

    let nlp = ShiftFootholds {
        shift: 0.,
        dt: opt.par.dt,
        initialized: false,
    };
    match opt.solve_nonlinear(nlp, &prob, &[0.; 3]) {
        Err(OptimizerError::Configuration) => {},
        _ => panic!("wrong guess dimension accepted"),
    }

    let guess = vec![0.; prob.dim()];
    match opt.solve_nonlinear(ShortResult, &prob, &guess) {
        Err(OptimizerError::Solver(SolverError::InvalidOp)) => {},
        _ => panic!("wrong solution dimension accepted"),
    }
}
