//! # Frontier Grid
//!
//! $$
//! r^\*_k = r_{\min} + \frac{k}{n-1}\,(r_{\max} - r_{\min}), \quad k = 0,\dots,n-1
//! $$
//!
//! Validated, linearly spaced sequence of target annual returns.

use anyhow::Result;
use anyhow::bail;
use ndarray::Array1;

/// Build the ascending target-return grid for the frontier sweep.
///
/// The upper end is the maximum per-asset annual mean. The lower end is
/// `min_target`, optionally raised (`clamp`) to the lowest per-asset annual
/// mean when it falls below it, which the legacy behavior did to keep the
/// grid inside the region spanned by the available assets.
pub fn target_grid(
  annual_returns: &Array1<f64>,
  min_target: f64,
  points: usize,
  clamp: bool,
) -> Result<Array1<f64>> {
  let Some(max_ret) = annual_returns
    .iter()
    .copied()
    .reduce(f64::max)
  else {
    bail!("cannot build a target grid without assets");
  };
  let min_ret = annual_returns.iter().copied().fold(f64::INFINITY, f64::min);

  if !(min_target < max_ret) {
    bail!(
      "minimum target return {min_target} is not below the maximum attainable \
       per-asset return {max_ret}"
    );
  }

  let effective_min = if clamp && min_target < min_ret {
    min_ret
  } else {
    min_target
  };

  Ok(Array1::linspace(effective_min, max_ret, points))
}
