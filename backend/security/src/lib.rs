pub mod audit;
pub mod baseline;
pub mod evaluator;
pub mod registry;

pub use audit::run_audit;
pub use baseline::{baseline_table, required_role};
pub use evaluator::evaluate;
pub use registry::FetcherRegistry;
