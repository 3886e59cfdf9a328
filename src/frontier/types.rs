//! # Frontier Types
//!
//! $$
//! \mathbf{w}^\* = \arg\max_{\mathbf{w}} \frac{\mu^\top\mathbf{w} - r_f}{\sigma_p}
//! $$
//!
//! Shared result containers and the objective selector.

use anyhow::Result;
use anyhow::bail;
use ndarray::Array1;

/// Objective used to pick the published portfolio from the frontier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Objective {
  /// Maximum Sharpe ratio over the solved frontier points.
  #[default]
  Sharpe,
}

impl Objective {
  /// Accepted spellings for [`Objective::parse`].
  pub const ACCEPTED: [&'static str; 1] = ["sharpe"];

  /// Parse a string into an [`Objective`], rejecting anything else.
  pub fn parse(s: &str) -> Result<Self> {
    match s.to_lowercase().as_str() {
      "sharpe" => Ok(Self::Sharpe),
      _ => bail!(
        "unsupported objective '{s}', expected one of {:?}",
        Self::ACCEPTED
      ),
    }
  }
}

/// One solved point on the efficient frontier. Immutable once produced.
#[derive(Clone, Debug)]
pub struct FrontierPoint {
  /// Target annual return this point was solved for.
  pub target_return: f64,
  /// Achieved minimum portfolio volatility.
  pub volatility: f64,
  /// `(target_return - risk_free) / volatility`.
  pub sharpe: f64,
  /// Solved allocation, one entry per asset, each in `[0, 1]`, summing to 1.
  pub weights: Array1<f64>,
  /// Whether the solver satisfied its convergence criterion for this point.
  pub converged: bool,
  /// Solver iterations spent on this point.
  pub iterations: u64,
}

/// The frontier point with the maximum Sharpe ratio, plus its solver
/// diagnostics. This is the allocation the fitted model publishes.
#[derive(Clone, Debug)]
pub struct OptimizationResult {
  /// Target annual return of the selected point.
  pub target_return: f64,
  /// Volatility of the selected point.
  pub volatility: f64,
  /// Sharpe ratio of the selected point.
  pub sharpe: f64,
  /// Optimal allocation.
  pub weights: Array1<f64>,
  /// Convergence flag of the selected point's solve.
  pub converged: bool,
  /// Iterations of the selected point's solve.
  pub iterations: u64,
}

impl OptimizationResult {
  pub(crate) fn from_point(point: &FrontierPoint) -> Self {
    Self {
      target_return: point.target_return,
      volatility: point.volatility,
      sharpe: point.sharpe,
      weights: point.weights.clone(),
      converged: point.converged,
      iterations: point.iterations,
    }
  }
}
