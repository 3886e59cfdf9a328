//! # Model
//!
//! $$
//! \text{prices} \to \text{returns} \to (\mu, \Sigma) \to \{r^\*_k\}
//! \to \{\sigma_p(r^\*_k)\} \to \mathbf{w}^\*
//! $$
//!
//! Fit orchestration: runs the forward pipeline over a price table and
//! aggregates everything into an owned [`FittedModel`].

use anyhow::Result;
use anyhow::anyhow;
use ndarray::Array1;
use ndarray::Array2;
use rayon::prelude::*;

use crate::frontier::grid::target_grid;
use crate::frontier::solver::SolvedPoint;
use crate::frontier::solver::solve_min_volatility;
use crate::frontier::types::FrontierPoint;
use crate::frontier::types::Objective;
use crate::frontier::types::OptimizationResult;
use crate::returns::PriceTable;
use crate::returns::ReturnKind;
use crate::returns::period_returns;
use crate::stats::AssetStatistics;
use crate::stats::annualized_covariance;
use crate::stats::asset_statistics;

/// Fit parameters with the documented compatibility defaults.
#[derive(Clone, Debug)]
pub struct FitConfig {
  /// Per-period return definition.
  pub return_kind: ReturnKind,
  /// Objective used for the published portfolio.
  pub objective: Objective,
  /// Caller's minimum target annual return for the frontier sweep.
  pub min_target_return: f64,
  /// Annual risk-free rate used in every Sharpe computation.
  pub risk_free_rate: f64,
  /// Trading periods per year used for annualization.
  pub periods_per_year: f64,
  /// Number of frontier grid points.
  pub grid_points: usize,
  /// Raise a too-low minimum target to the lowest per-asset mean (legacy
  /// behavior) instead of sweeping below the attainable region.
  pub clamp_min_target: bool,
  /// Let non-converged grid points compete in optimum selection (legacy
  /// behavior). When false, such points stay on the frontier but are skipped
  /// by the selector.
  pub include_nonconverged: bool,
  /// Solve the grid points across rayon workers; the frontier sequence is
  /// reassembled in grid order either way.
  pub parallel: bool,
  /// Emit per-grid-point progress at info level instead of debug.
  pub verbose: bool,
}

impl Default for FitConfig {
  fn default() -> Self {
    Self {
      return_kind: ReturnKind::Log,
      objective: Objective::Sharpe,
      min_target_return: 0.03,
      risk_free_rate: 0.01,
      periods_per_year: 252.0,
      grid_points: 30,
      clamp_min_target: true,
      include_nonconverged: true,
      parallel: false,
      verbose: false,
    }
  }
}

/// Entry point for frontier fits. Holds only configuration; every call to
/// [`FrontierEngine::fit`] returns a fresh, fully owned model.
#[derive(Clone, Debug, Default)]
pub struct FrontierEngine {
  config: FitConfig,
}

impl FrontierEngine {
  /// Construct an engine with explicit configuration.
  pub fn new(config: FitConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &FitConfig {
    &self.config
  }

  /// Run the full pipeline over a price table.
  ///
  /// Input validation happens up front: the covariance and grid checks fail
  /// before any grid point is solved. Individual solver non-convergence is a
  /// diagnostic, not an error.
  pub fn fit(&self, prices: &PriceTable) -> Result<FittedModel> {
    let cfg = &self.config;

    let returns = period_returns(prices.prices(), cfg.return_kind);
    let statistics = asset_statistics(&returns, cfg.periods_per_year, cfg.risk_free_rate)?;
    let covariance = annualized_covariance(&returns, cfg.periods_per_year)?;
    let targets = target_grid(
      &statistics.annual_return,
      cfg.min_target_return,
      cfg.grid_points,
      cfg.clamp_min_target,
    )?;

    let frontier = self.solve_frontier(&targets, &statistics.annual_return, &covariance);
    let optimum = select_optimum(&frontier, cfg.include_nonconverged)?;

    Ok(FittedModel {
      config: cfg.clone(),
      names: prices.names().to_vec(),
      prices: prices.prices().clone(),
      returns,
      statistics,
      covariance,
      frontier,
      optimum,
    })
  }

  fn solve_frontier(
    &self,
    targets: &Array1<f64>,
    mu: &Array1<f64>,
    cov: &Array2<f64>,
  ) -> Vec<FrontierPoint> {
    let total = targets.len();
    let risk_free = self.config.risk_free_rate;
    let verbose = self.config.verbose;

    let solve_one = |(i, target): (usize, f64)| {
      let solved = solve_min_volatility(mu, cov, target);
      frontier_point(i, total, target, solved, risk_free, verbose)
    };

    if self.config.parallel {
      targets
        .to_vec()
        .into_par_iter()
        .enumerate()
        .map(solve_one)
        .collect()
    } else {
      targets.iter().copied().enumerate().map(solve_one).collect()
    }
  }
}

/// Turn one grid-point solve into a frontier point, emitting the per-point
/// progress and the non-convergence warning.
fn frontier_point(
  index: usize,
  total: usize,
  target: f64,
  solved: SolvedPoint,
  risk_free: f64,
  verbose: bool,
) -> FrontierPoint {
  if verbose {
    tracing::info!(
      "frontier point {}/{}: target {:.4}, converged {}",
      index + 1,
      total,
      target,
      solved.converged
    );
  } else {
    tracing::debug!(
      "frontier point {}/{}: target {:.4}, converged {}",
      index + 1,
      total,
      target,
      solved.converged
    );
  }
  if !solved.converged {
    tracing::warn!(
      "frontier point {}/{} did not converge after {} iterations",
      index + 1,
      total,
      solved.iterations
    );
  }

  FrontierPoint {
    target_return: target,
    volatility: solved.volatility,
    sharpe: (target - risk_free) / solved.volatility,
    weights: solved.weights,
    converged: solved.converged,
    iterations: solved.iterations,
  }
}

/// Scan the ordered frontier for the best Sharpe ratio.
///
/// Strict `>` against a negative-infinity sentinel, so the first valid point
/// always replaces it and ties keep the earliest point.
fn select_optimum(
  frontier: &[FrontierPoint],
  include_nonconverged: bool,
) -> Result<OptimizationResult> {
  let mut best: Option<&FrontierPoint> = None;
  let mut best_sharpe = f64::NEG_INFINITY;

  for point in frontier {
    if !include_nonconverged && !point.converged {
      continue;
    }
    if point.sharpe > best_sharpe {
      best_sharpe = point.sharpe;
      best = Some(point);
    }
  }

  let best = best.ok_or_else(|| {
    anyhow!(
      "no frontier point eligible for optimum selection across {} solved points",
      frontier.len()
    )
  })?;

  Ok(OptimizationResult::from_point(best))
}

/// Per-asset row for presentation consumers.
#[derive(Clone, Debug)]
pub struct AssetBreakdown {
  /// Asset name (the price column label).
  pub name: String,
  /// Annualized mean return.
  pub annual_return: f64,
  /// Annualized volatility.
  pub annual_volatility: f64,
  /// Asset Sharpe ratio; non-finite for a constant price series.
  pub sharpe: f64,
  /// Weight of this asset in the optimal allocation.
  pub weight: f64,
}

/// Everything one fit produces. Owned by the caller; a later fit replaces the
/// whole value, nothing is updated incrementally.
#[derive(Clone, Debug)]
pub struct FittedModel {
  config: FitConfig,
  names: Vec<String>,
  prices: Array2<f64>,
  returns: Array2<f64>,
  statistics: AssetStatistics,
  covariance: Array2<f64>,
  frontier: Vec<FrontierPoint>,
  optimum: OptimizationResult,
}

impl FittedModel {
  /// Configuration the fit ran with.
  pub fn config(&self) -> &FitConfig {
    &self.config
  }

  /// Asset names, in column order.
  pub fn names(&self) -> &[String] {
    &self.names
  }

  /// Per-period return table this fit derived.
  pub fn returns(&self) -> &Array2<f64> {
    &self.returns
  }

  /// Annualized per-asset statistics.
  pub fn statistics(&self) -> &AssetStatistics {
    &self.statistics
  }

  /// Annualized covariance matrix.
  pub fn covariance(&self) -> &Array2<f64> {
    &self.covariance
  }

  /// The full ordered frontier, ascending in target return.
  pub fn frontier(&self) -> &[FrontierPoint] {
    &self.frontier
  }

  /// The published max-Sharpe portfolio.
  pub fn optimum(&self) -> &OptimizationResult {
    &self.optimum
  }

  /// Flat `(volatility, target_return, sharpe)` triples of the frontier, the
  /// exact surface presentation collaborators consume.
  pub fn frontier_curve(&self) -> Vec<(f64, f64, f64)> {
    self
      .frontier
      .iter()
      .map(|p| (p.volatility, p.target_return, p.sharpe))
      .collect()
  }

  /// Per-asset statistics joined with the optimal allocation.
  pub fn asset_breakdown(&self) -> Vec<AssetBreakdown> {
    self
      .names
      .iter()
      .enumerate()
      .map(|(i, name)| AssetBreakdown {
        name: name.clone(),
        annual_return: self.statistics.annual_return[i],
        annual_volatility: self.statistics.annual_volatility[i],
        sharpe: self.statistics.sharpe[i],
        weight: self.optimum.weights[i],
      })
      .collect()
  }

  /// Optimal allocation paired with asset names.
  pub fn optimal_allocation(&self) -> Vec<(&str, f64)> {
    self
      .names
      .iter()
      .map(String::as_str)
      .zip(self.optimum.weights.iter().copied())
      .collect()
  }

  /// Value of the optimal portfolio over time: each price column normalized
  /// to its first row, weighted by the optimal allocation and summed. Starts
  /// at 1.
  pub fn cumulative_value(&self) -> Array1<f64> {
    let (rows, cols) = self.prices.dim();
    let mut out = Array1::zeros(rows);

    for t in 0..rows {
      let mut acc = 0.0;
      for a in 0..cols {
        acc += self.optimum.weights[a] * self.prices[[t, a]] / self.prices[[0, a]];
      }
      out[t] = acc;
    }

    out
  }
}

#[cfg(test)]
mod tests {
  use ndarray::Array2;
  use ndarray::array;
  use tracing_test::traced_test;

  use super::*;

  /// Three assets with distinct drifts and out-of-phase oscillations, so the
  /// annual means are well separated and the covariance has full rank.
  fn sample_prices() -> PriceTable {
    let drifts = [0.08 / 252.0, 0.15 / 252.0, 0.25 / 252.0];
    let amps = [0.010, 0.014, 0.018];
    let freqs = [0.31, 0.47, 0.73];
    let rows = 253;

    let mut prices = Array2::zeros((rows, 3));
    for t in 0..rows {
      for a in 0..3 {
        let x = drifts[a] * t as f64 + amps[a] * (freqs[a] * t as f64).sin();
        prices[[t, a]] = 100.0 * x.exp();
      }
    }

    PriceTable::new(
      vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()],
      prices,
    )
    .unwrap()
  }

  fn single_asset_prices() -> PriceTable {
    let rows = 120;
    let mut prices = Array2::zeros((rows, 1));
    for t in 0..rows {
      let x = 0.001 * t as f64 + 0.01 * (0.5 * t as f64).sin();
      prices[[t, 0]] = 100.0 * x.exp();
    }
    PriceTable::new(vec!["ONLY".to_string()], prices).unwrap()
  }

  #[test]
  fn defaults_match_the_documented_values() {
    let cfg = FitConfig::default();
    assert_eq!(cfg.return_kind, ReturnKind::Log);
    assert_eq!(cfg.objective, Objective::Sharpe);
    assert!((cfg.min_target_return - 0.03).abs() < 1e-15);
    assert!((cfg.risk_free_rate - 0.01).abs() < 1e-15);
    assert!((cfg.periods_per_year - 252.0).abs() < 1e-15);
    assert_eq!(cfg.grid_points, 30);
    assert!(cfg.clamp_min_target);
    assert!(cfg.include_nonconverged);
  }

  #[test]
  fn frontier_has_thirty_linearly_spaced_ascending_targets() {
    let model = FrontierEngine::default().fit(&sample_prices()).unwrap();
    let frontier = model.frontier();
    assert_eq!(frontier.len(), 30);

    let means = &model.statistics().annual_return;
    let max_mean = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_mean = means.iter().copied().fold(f64::INFINITY, f64::min);
    // Default 0.03 minimum sits below every asset mean, so clamping raises it.
    let effective_min = min_mean.max(0.03);

    let step = (max_mean - effective_min) / 29.0;
    for (k, point) in frontier.iter().enumerate() {
      let expected = effective_min + step * k as f64;
      assert!((point.target_return - expected).abs() < 1e-9);
      if k > 0 {
        assert!(point.target_return >= frontier[k - 1].target_return);
      }
    }
  }

  #[test]
  fn every_frontier_weight_vector_stays_on_the_simplex() {
    let model = FrontierEngine::default().fit(&sample_prices()).unwrap();

    for point in model.frontier() {
      let sum: f64 = point.weights.sum();
      assert!((sum - 1.0).abs() < 1e-6);
      for &w in point.weights.iter() {
        assert!((0.0..=1.0).contains(&w));
      }
    }
  }

  #[test]
  fn optimum_dominates_every_frontier_point() {
    let model = FrontierEngine::default().fit(&sample_prices()).unwrap();
    let best = model.optimum();

    for point in model.frontier() {
      assert!(best.sharpe >= point.sharpe);
    }

    let max_sharpe = model
      .frontier()
      .iter()
      .map(|p| p.sharpe)
      .fold(f64::NEG_INFINITY, f64::max);
    assert!((best.sharpe - max_sharpe).abs() < 1e-15);
  }

  #[test]
  fn parallel_sweep_reproduces_the_sequential_frontier() {
    let prices = sample_prices();
    let sequential = FrontierEngine::default().fit(&prices).unwrap();
    let parallel = FrontierEngine::new(FitConfig {
      parallel: true,
      ..FitConfig::default()
    })
    .fit(&prices)
    .unwrap();

    assert_eq!(sequential.frontier().len(), parallel.frontier().len());
    for (s, p) in sequential.frontier().iter().zip(parallel.frontier()) {
      assert!((s.target_return - p.target_return).abs() < 1e-15);
      assert!((s.volatility - p.volatility).abs() < 1e-12);
      assert!((s.sharpe - p.sharpe).abs() < 1e-12);
    }
  }

  #[test]
  fn risk_free_above_every_mean_keeps_all_sharpes_negative() {
    let engine = FrontierEngine::new(FitConfig {
      risk_free_rate: 0.60,
      ..FitConfig::default()
    });
    let model = engine.fit(&sample_prices()).unwrap();

    for &s in model.statistics().sharpe.iter() {
      assert!(s < 0.0);
    }
    for point in model.frontier() {
      assert!(point.sharpe < 0.0);
    }

    // The optimum is still the least-negative point.
    let max_sharpe = model
      .frontier()
      .iter()
      .map(|p| p.sharpe)
      .fold(f64::NEG_INFINITY, f64::max);
    assert!((model.optimum().sharpe - max_sharpe).abs() < 1e-15);
    assert!(model.optimum().sharpe < 0.0);
  }

  #[test]
  fn single_asset_frontier_collapses_to_full_investment() {
    let model = FrontierEngine::default().fit(&single_asset_prices()).unwrap();
    let own_vol = model.statistics().annual_volatility[0];

    for point in model.frontier() {
      assert!((point.weights[0] - 1.0).abs() < 1e-9);
      assert!((point.volatility - own_vol).abs() < 1e-9);
    }
    assert!((model.optimum().weights[0] - 1.0).abs() < 1e-9);
  }

  fn handmade_point(target: f64, sharpe: f64, converged: bool) -> FrontierPoint {
    FrontierPoint {
      target_return: target,
      volatility: 0.2,
      sharpe,
      weights: array![1.0],
      converged,
      iterations: 50,
    }
  }

  #[test]
  fn selector_skips_nonconverged_points_when_excluded() {
    let frontier = vec![
      handmade_point(0.10, 1.0, true),
      handmade_point(0.12, 2.0, false),
    ];

    let inclusive = select_optimum(&frontier, true).unwrap();
    assert!((inclusive.sharpe - 2.0).abs() < 1e-15);
    assert!(!inclusive.converged);

    let exclusive = select_optimum(&frontier, false).unwrap();
    assert!((exclusive.sharpe - 1.0).abs() < 1e-15);
    assert!(exclusive.converged);
  }

  #[test]
  fn selector_fails_when_every_point_is_excluded() {
    let frontier = vec![
      handmade_point(0.10, 1.0, false),
      handmade_point(0.12, 2.0, false),
    ];
    let err = select_optimum(&frontier, false).unwrap_err().to_string();
    assert!(err.contains("no frontier point eligible"));
  }

  #[test]
  fn selector_keeps_the_earliest_point_on_ties() {
    let frontier = vec![
      handmade_point(0.10, 1.5, true),
      handmade_point(0.12, 1.5, true),
    ];
    let best = select_optimum(&frontier, true).unwrap();
    assert!((best.target_return - 0.10).abs() < 1e-15);
  }

  #[test]
  #[traced_test]
  fn non_convergent_point_is_reported_through_a_warning() {
    let solved = SolvedPoint {
      weights: array![1.0],
      volatility: 0.2,
      converged: false,
      iterations: 10_000,
    };
    let point = frontier_point(0, 30, 0.10, solved, 0.01, false);

    assert!(!point.converged);
    assert!(logs_contain("did not converge"));
  }

  #[test]
  fn two_price_rows_fail_with_an_error_instead_of_panicking() {
    let prices = PriceTable::new(
      vec!["AAA".to_string(), "BBB".to_string()],
      array![[100.0, 50.0], [101.0, 50.5]],
    )
    .unwrap();

    let err = FrontierEngine::default().fit(&prices).unwrap_err().to_string();
    assert!(err.contains("observation"));
    assert!(err.contains("at least 2"));
  }

  #[test]
  fn unattainable_minimum_target_fails_before_solving() {
    let engine = FrontierEngine::new(FitConfig {
      min_target_return: 5.0,
      ..FitConfig::default()
    });
    let err = engine.fit(&sample_prices()).unwrap_err().to_string();
    assert!(err.contains("not below"));
    assert!(err.contains("5"));
  }

  #[test]
  fn excluding_nonconverged_points_still_yields_an_optimum_here() {
    let engine = FrontierEngine::new(FitConfig {
      include_nonconverged: false,
      ..FitConfig::default()
    });
    let model = engine.fit(&sample_prices()).unwrap();
    assert!(model.optimum().converged);
  }

  #[test]
  fn presentation_surfaces_are_consistent() {
    let model = FrontierEngine::default().fit(&sample_prices()).unwrap();

    let curve = model.frontier_curve();
    assert_eq!(curve.len(), model.frontier().len());

    let breakdown = model.asset_breakdown();
    assert_eq!(breakdown.len(), 3);
    let total_weight: f64 = breakdown.iter().map(|row| row.weight).sum();
    assert!((total_weight - 1.0).abs() < 1e-6);

    let allocation = model.optimal_allocation();
    assert_eq!(allocation[0].0, "AAA");

    let value = model.cumulative_value();
    assert_eq!(value.len(), 253);
    assert!((value[0] - 1.0).abs() < 1e-9);
  }

  #[test]
  #[traced_test]
  fn verbose_fit_reports_per_point_progress() {
    let engine = FrontierEngine::new(FitConfig {
      verbose: true,
      ..FitConfig::default()
    });
    engine.fit(&sample_prices()).unwrap();
    assert!(logs_contain("frontier point"));
  }
}
