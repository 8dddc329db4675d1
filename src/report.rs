//! Reporters of formulation and solving progress

use core::fmt::Display;
use std::time::Duration;

//

/// Observer of the optimizer, passed explicitly to every builder.
///
/// All methods do nothing by default.
pub trait Reporter
{
    /// A matrix artifact has been assembled.
    ///
    /// * `name` names the artifact.
    /// * `mat` is the assembled matrix.
    /// * `size` is a number of rows and columns.
    /// * `elapsed` is the assembling time.
    fn matrix_built(&mut self, _name: &str, _mat: &dyn Display, _size: (usize, usize), _elapsed: Duration)
    {
    }

    /// A solver returned a solution.
    fn solved(&mut self, _cost: f64, _elapsed: Duration)
    {
    }
}

/// Reporter which discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Reporter forwarding to the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter
{
    fn matrix_built(&mut self, name: &str, mat: &dyn Display, size: (usize, usize), elapsed: Duration)
    {
        log::info!("Calc. time {}:\t{:.3}\tms", name, elapsed.as_secs_f64() * 1000.);
        log::debug!("{} dim: {} x {}", name, size.0, size.1);
        log::trace!("{}: {}", name, mat);
    }

    fn solved(&mut self, cost: f64, elapsed: Duration)
    {
        log::info!("Time solver:\t{:.3}\tms", elapsed.as_secs_f64() * 1000.);
        log::info!("Cost:\t{:.3e}", cost);
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R
{
    fn matrix_built(&mut self, name: &str, mat: &dyn Display, size: (usize, usize), elapsed: Duration)
    {
        (**self).matrix_built(name, mat, size, elapsed);
    }

    fn solved(&mut self, cost: f64, elapsed: Duration)
    {
        (**self).solved(cost, elapsed);
    }
}
