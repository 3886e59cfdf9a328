//! # Frontier
//!
//! $$
//! \sigma_p(r^\*) = \min_{\mathbf{w}\in\Delta} \sqrt{\mathbf{w}^\top \Sigma \mathbf{w}}
//! \quad \text{s.t.} \quad \mu^\top\mathbf{w} = r^\*
//! $$
//!
//! Target-return grid construction and the per-point constrained
//! minimum-volatility solve.

pub mod grid;
pub mod solver;
pub mod types;

pub use grid::target_grid;
pub use solver::SolvedPoint;
pub use solver::portfolio_volatility;
pub use solver::solve_min_volatility;
pub use types::FrontierPoint;
pub use types::Objective;
pub use types::OptimizationResult;
