//! # Constrained Volatility Solver
//!
//! $$
//! \min_{\mathbf{x}}\ \sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}
//! + \lambda\,(\mu^\top\mathbf{w} - r^\*)^2, \qquad \mathbf{w} = \mathrm{softmax}(\mathbf{x})
//! $$
//!
//! Minimum-volatility solve at a fixed target return. The softmax
//! reparameterization keeps every weight in `[0, 1]` and their sum at 1, so
//! the full-investment and box constraints hold at every iterate; the
//! target-return equality enters the cost as a quadratic penalty.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use ndarray::Array2;

const RETURN_PENALTY: f64 = 1e4;
const SD_TOLERANCE: f64 = 1e-9;
const MAX_ITERS: u64 = 10_000;

/// Raw output of one grid-point solve.
#[derive(Clone, Debug)]
pub struct SolvedPoint {
  /// Final iterate mapped back onto the weight simplex.
  pub weights: Array1<f64>,
  /// Annualized volatility of `weights` under the covariance matrix.
  pub volatility: f64,
  /// Whether the simplex standard-deviation criterion was met.
  pub converged: bool,
  /// Iterations spent.
  pub iterations: u64,
}

struct MinVolatilityCost {
  mu: Array1<f64>,
  cov: Array2<f64>,
  target_return: f64,
}

impl CostFunction for MinVolatilityCost {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
    let w = softmax(x);
    let vol = portfolio_volatility(&w, &self.cov);
    let ret = self.mu.dot(&w);

    Ok(vol + RETURN_PENALTY * (ret - self.target_return).powi(2))
  }
}

fn softmax(x: &[f64]) -> Array1<f64> {
  let max_x = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
  let exps: Array1<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum = exps.sum();

  if sum < 1e-15 {
    Array1::from_elem(x.len(), 1.0 / x.len() as f64)
  } else {
    exps / sum
  }
}

/// `sqrt(wᵀ Σ w)` with the tiny negative round-off floored at zero.
pub fn portfolio_volatility(weights: &Array1<f64>, cov: &Array2<f64>) -> f64 {
  weights.dot(&cov.dot(weights)).max(0.0).sqrt()
}

/// Solve one frontier grid point.
///
/// Always re-seeded from the equal allocation (the zero parameter vector maps
/// onto it), never warm-started from a neighboring point. Non-convergence is
/// reported through [`SolvedPoint::converged`]; the best iterate found is
/// still returned. An executor-level failure falls back to the equal
/// allocation, flagged as non-converged.
pub fn solve_min_volatility(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  target_return: f64,
) -> SolvedPoint {
  let n = mu.len();

  let cost = MinVolatilityCost {
    mu: mu.clone(),
    cov: cov.clone(),
    target_return,
  };

  let x0 = vec![0.0; n];
  let mut simplex = Vec::with_capacity(n + 1);
  simplex.push(x0.clone());
  for i in 0..n {
    let mut point = x0.clone();
    point[i] = 1.0;
    simplex.push(point);
  }

  let fallback = |cov: &Array2<f64>| {
    let equal = Array1::from_elem(n, 1.0 / n as f64);
    let volatility = portfolio_volatility(&equal, cov);
    SolvedPoint {
      weights: equal,
      volatility,
      converged: false,
      iterations: 0,
    }
  };

  let solver = match NelderMead::new(simplex).with_sd_tolerance(SD_TOLERANCE) {
    Ok(solver) => solver,
    Err(_) => return fallback(cov),
  };

  match Executor::new(cost, solver)
    .configure(|state| state.max_iters(MAX_ITERS))
    .run()
  {
    Ok(res) => {
      let best_x = res.state.best_param.clone().unwrap_or(x0);
      let weights = softmax(&best_x);
      let volatility = portfolio_volatility(&weights, cov);
      let converged = matches!(
        res.state.termination_status,
        TerminationStatus::Terminated(TerminationReason::SolverConverged)
      );

      SolvedPoint {
        weights,
        volatility,
        converged,
        iterations: res.state.iter,
      }
    }
    Err(_) => fallback(cov),
  }
}
