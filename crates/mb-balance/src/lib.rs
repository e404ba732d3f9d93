//! Mass balancing of stock solutions against target compositions.
//!
//! Given ordered stock mixtures and a target, this crate finds how much of
//! each stock to combine so every target component is reproduced within a
//! relative tolerance, honouring a minimum pipettable transfer, and emits the
//! transfer protocol.
//!
//! The unknowns are the masses drawn from each stock (grams). They solve a
//! lower-bounded linear least-squares problem over the stock mass-fraction
//! matrix; stocks pinned at the minimum-transfer bound are additionally tried
//! at zero.

pub mod config;
pub mod error;
pub mod nnls;
pub mod problem;
pub mod report;
pub mod session;
pub mod solver;

pub use config::{BalanceConfig, BalanceRequest};
pub use error::{BalanceError, BalanceResult};
pub use nnls::{LsqConfig, LsqSolution, bounded_lsq};
pub use problem::BalanceProblem;
pub use report::{BalanceReport, TargetReport};
pub use session::BalanceSession;
pub use solver::{BalanceSolver, BalancedTarget, Candidate, TargetOutcome};
