//! # Efficient Frontier
//!
//! $$
//! \min_{\mathbf{w}}\ \sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}
//! \quad \text{s.t.} \quad \mathbf{1}^\top\mathbf{w} = 1,\;
//! \mu^\top\mathbf{w} = r^\*,\; 0 \le w_i \le 1
//! $$
//!
//! Mean-variance efficient frontier construction and max-Sharpe portfolio
//! selection for long-only baskets. A price history is converted into
//! per-period returns, annualized statistics and a covariance matrix; a grid
//! of target returns is swept with one constrained minimum-volatility solve
//! per point, and the point with the best Sharpe ratio becomes the published
//! allocation.
//!
//! ## Modules
//!
//! | Module       | Description                                                        |
//! |--------------|--------------------------------------------------------------------|
//! | [`returns`]  | Price-table container and log/arithmetic return calculation.       |
//! | [`stats`]    | Annualized per-asset statistics and the covariance matrix.         |
//! | [`frontier`] | Target-return grid and the per-point constrained volatility solve. |
//! | [`model`]    | Fit orchestration, optimum selection and the fitted model.         |
//!
//! ## Example usage
//!
//! ```rust
//! use efficient_frontier::{FitConfig, FrontierEngine, PriceTable};
//! use ndarray::array;
//!
//! let prices = PriceTable::new(
//!   vec!["AAA".to_string(), "BBB".to_string()],
//!   array![[100.0, 50.0], [101.0, 50.5], [102.5, 50.1], [102.0, 51.2]],
//! )?;
//! let model = FrontierEngine::new(FitConfig::default()).fit(&prices)?;
//! let best = model.optimum();
//! println!("sharpe {:.3} at volatility {:.3}", best.sharpe, best.volatility);
//! # anyhow::Ok(())
//! ```

pub mod frontier;
pub mod model;
pub mod returns;
pub mod stats;

pub use frontier::FrontierPoint;
pub use frontier::Objective;
pub use frontier::OptimizationResult;
pub use model::AssetBreakdown;
pub use model::FitConfig;
pub use model::FittedModel;
pub use model::FrontierEngine;
pub use returns::PriceTable;
pub use returns::ReturnKind;
pub use stats::AssetStatistics;
