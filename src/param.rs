use num_traits::Num;
use core::fmt::Display;

//

/// Optimizer parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerParam
{
    /// Sampling interval of the stability constraints in seconds.
    pub dt: f64,
    /// Gravity acceleration.
    pub gravity: f64,
    /// Smallest cost accepted as a non-trivial solution.
    pub eps_cost: f64,
}

impl Default for OptimizerParam
{
    fn default() -> Self
    {
        OptimizerParam {
            dt: 0.1,
            gravity: 9.81,
            eps_cost: 0.002,
        }
    }
}

fn num_by_env<N: Num + Display>(e: &str) -> Option<N>
{
    let v = std::env::var(e).ok()
            .and_then(|s| N::from_str_radix(s.trim(), 10).ok())?;

    log::info!("{}: {}", e, v);
    Some(v)
}

/// Overrides parameters by environment variables `ZMP_DT`, `ZMP_GRAVITY` and `ZMP_EPS_COST`.
pub fn set_par_by_env(p: &mut OptimizerParam)
{
    p.dt = num_by_env("ZMP_DT").unwrap_or(p.dt);
    p.gravity = num_by_env("ZMP_GRAVITY").unwrap_or(p.gravity);
    p.eps_cost = num_by_env("ZMP_EPS_COST").unwrap_or(p.eps_cost);
}

//

#[test]
fn test_set_par_by_env()
{
    std::env::set_var("ZMP_DT", "0.05");
    std::env::set_var("ZMP_EPS_COST", "not a number");

    let mut p = OptimizerParam::default();
    set_par_by_env(&mut p);

    assert_eq!(p.dt, 0.05);
    assert_eq!(p.gravity, 9.81);
    assert_eq!(p.eps_cost, 0.002);

    std::env::remove_var("ZMP_DT");
    std::env::remove_var("ZMP_EPS_COST");
}
