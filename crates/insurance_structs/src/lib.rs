//! Common structs for the insurance dataset, sweep results and prediction
//! payloads shared across crates.

mod category;
mod hyperparameters;
mod performance;
mod prediction;
mod record;

pub use category::*;
pub use hyperparameters::*;
pub use performance::*;
pub use prediction::*;
pub use record::*;
