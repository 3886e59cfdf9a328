//! # Stats
//!
//! $$
//! \mu_a = 252\,\bar r_a, \qquad \sigma_a = \sqrt{252}\,s_a, \qquad \Sigma = 252\,\widehat{\mathrm{Cov}}(r)
//! $$
//!
//! Annualized per-asset statistics and the covariance matrix derived from a
//! per-period return table.

use anyhow::Result;
use anyhow::anyhow;
use anyhow::bail;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray_stats::CorrelationExt;

/// Annualized per-asset summary statistics.
///
/// A constant price series has zero volatility; its Sharpe ratio is then
/// non-finite and is propagated as such rather than clamped.
#[derive(Clone, Debug)]
pub struct AssetStatistics {
  /// Mean per-period return scaled by the period count.
  pub annual_return: Array1<f64>,
  /// Per-period standard deviation (ddof 1) scaled by the square root of the
  /// period count.
  pub annual_volatility: Array1<f64>,
  /// `(annual_return - risk_free) / annual_volatility`.
  pub sharpe: Array1<f64>,
}

/// Compute annualized per-asset statistics from a return table.
pub fn asset_statistics(
  returns: &Array2<f64>,
  periods_per_year: f64,
  risk_free_rate: f64,
) -> Result<AssetStatistics> {
  let mean = returns
    .mean_axis(Axis(0))
    .ok_or_else(|| anyhow!("return table has no rows"))?;

  let annual_return = mean * periods_per_year;
  let annual_volatility = returns.std_axis(Axis(0), 1.0) * periods_per_year.sqrt();
  let sharpe = (&annual_return - risk_free_rate) / &annual_volatility;

  Ok(AssetStatistics {
    annual_return,
    annual_volatility,
    sharpe,
  })
}

/// Annualized sample covariance matrix of the return table.
///
/// Square, symmetric, one row/column per asset.
pub fn annualized_covariance(returns: &Array2<f64>, periods_per_year: f64) -> Result<Array2<f64>> {
  let observations = returns.nrows();
  if observations < 2 {
    bail!(
      "return table has {observations} observation row(s); sample covariance \
       needs at least 2 (3 or more price rows)"
    );
  }

  // CorrelationExt wants variables along rows, observations along columns.
  let cov = returns
    .t()
    .cov(1.0)
    .map_err(|e| anyhow!("covariance of return table failed: {e}"))?;
  Ok(cov * periods_per_year)
}
