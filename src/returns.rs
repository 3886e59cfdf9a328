//! # Returns
//!
//! $$
//! r_t = \ln\frac{p_t}{p_{t-1}} \quad \text{or} \quad r_t = \frac{p_t}{p_{t-1}} - 1
//! $$
//!
//! Price-history container and per-period return calculation.

use anyhow::Result;
use anyhow::bail;
use ndarray::Array2;

/// How per-period returns are derived from consecutive prices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnKind {
  /// `ln(p_t / p_{t-1})`.
  #[default]
  Log,
  /// `p_t / p_{t-1} - 1`.
  Arithmetic,
}

impl ReturnKind {
  /// Accepted spellings for [`ReturnKind::parse`].
  pub const ACCEPTED: [&'static str; 2] = ["log", "arithmetic"];

  /// Parse a string into a [`ReturnKind`], rejecting anything else.
  pub fn parse(s: &str) -> Result<Self> {
    match s.to_lowercase().as_str() {
      "log" => Ok(Self::Log),
      "arithmetic" => Ok(Self::Arithmetic),
      _ => bail!(
        "unsupported return kind '{s}', expected one of {:?}",
        Self::ACCEPTED
      ),
    }
  }
}

/// Chronologically ordered price history, one column per asset.
#[derive(Clone, Debug)]
pub struct PriceTable {
  names: Vec<String>,
  prices: Array2<f64>,
}

impl PriceTable {
  /// Validate and wrap a price matrix (rows are time points, columns are assets).
  ///
  /// Requires at least two rows, at least one asset, one name per column and
  /// strictly positive finite prices.
  pub fn new(names: Vec<String>, prices: Array2<f64>) -> Result<Self> {
    let (rows, cols) = prices.dim();
    if rows < 2 {
      bail!("price table needs at least 2 time points, got {rows}");
    }
    if cols == 0 {
      bail!("price table needs at least 1 asset column");
    }
    if names.len() != cols {
      bail!(
        "expected {cols} asset names to match the price columns, got {}",
        names.len()
      );
    }
    for ((t, a), &p) in prices.indexed_iter() {
      if !p.is_finite() || p <= 0.0 {
        bail!("non-positive or non-finite price {p} for asset '{}' at row {t}", names[a]);
      }
    }

    Ok(Self { names, prices })
  }

  /// Asset names, in column order.
  pub fn names(&self) -> &[String] {
    &self.names
  }

  /// Price matrix, rows chronological.
  pub fn prices(&self) -> &Array2<f64> {
    &self.prices
  }

  /// Number of asset columns.
  pub fn n_assets(&self) -> usize {
    self.prices.ncols()
  }
}

/// Convert a price matrix into a per-period return matrix.
///
/// The result has one row fewer than the input; the first period has no prior
/// price to compare against. Pure function of its inputs.
pub fn period_returns(prices: &Array2<f64>, kind: ReturnKind) -> Array2<f64> {
  let (rows, cols) = prices.dim();
  let mut out = Array2::zeros((rows.saturating_sub(1), cols));

  for t in 1..rows {
    for a in 0..cols {
      let ratio = prices[[t, a]] / prices[[t - 1, a]];
      out[[t - 1, a]] = match kind {
        ReturnKind::Log => ratio.ln(),
        ReturnKind::Arithmetic => ratio - 1.0,
      };
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  #[test]
  fn parse_accepts_both_kinds() {
    assert_eq!(ReturnKind::parse("log").unwrap(), ReturnKind::Log);
    assert_eq!(ReturnKind::parse("Arithmetic").unwrap(), ReturnKind::Arithmetic);
  }

  #[test]
  fn parse_rejects_unknown_kind_listing_accepted_values() {
    let err = ReturnKind::parse("geometric").unwrap_err().to_string();
    assert!(err.contains("geometric"));
    assert!(err.contains("log"));
    assert!(err.contains("arithmetic"));
  }

  #[test]
  fn log_and_arithmetic_returns_match_definitions() {
    let prices = array![[100.0, 50.0], [110.0, 45.0], [99.0, 54.0]];

    let log = period_returns(&prices, ReturnKind::Log);
    assert_eq!(log.dim(), (2, 2));
    assert!((log[[0, 0]] - (1.1_f64).ln()).abs() < 1e-15);
    assert!((log[[1, 1]] - (54.0_f64 / 45.0).ln()).abs() < 1e-15);

    let arith = period_returns(&prices, ReturnKind::Arithmetic);
    assert!((arith[[0, 0]] - 0.1).abs() < 1e-15);
    assert!((arith[[0, 1]] + 0.1).abs() < 1e-15);
  }

  #[test]
  fn log_returns_are_bit_identical_across_calls() {
    let prices = array![[100.0, 50.0], [101.5, 49.2], [103.1, 51.0], [99.7, 50.4]];
    let first = period_returns(&prices, ReturnKind::Log);
    let second = period_returns(&prices, ReturnKind::Log);
    assert_eq!(first, second);
  }

  #[test]
  fn price_table_rejects_degenerate_shapes() {
    let one_row = Array2::from_elem((1, 2), 100.0);
    assert!(PriceTable::new(vec!["A".into(), "B".into()], one_row).is_err());

    let no_assets = Array2::from_elem((5, 0), 100.0);
    assert!(PriceTable::new(vec![], no_assets).is_err());

    let mismatched = Array2::from_elem((5, 2), 100.0);
    assert!(PriceTable::new(vec!["A".into()], mismatched).is_err());
  }

  #[test]
  fn price_table_rejects_non_positive_prices() {
    let prices = array![[100.0, 50.0], [110.0, 0.0]];
    let err = PriceTable::new(vec!["A".into(), "B".into()], prices)
      .unwrap_err()
      .to_string();
    assert!(err.contains("'B'"));
  }
}
