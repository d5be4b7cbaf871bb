pub mod optimizer;
pub mod session;
pub mod transaction;

pub use optimizer::{OptimizationResult, OptimizationStep, OptimizerConfig, RosterOptimizer};
pub use session::{ChangeValuation, Simulator, UnitValue};
pub use transaction::RosterMutation;
