mod staging;
mod transaction;
mod types;

pub use transaction::{OutputTransaction, OutputWriter};
pub use types::ProducedOutput;
