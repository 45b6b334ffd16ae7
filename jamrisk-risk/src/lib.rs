pub mod error;
pub mod scenario;
pub mod simulation;

#[cfg(test)]
mod test_utils;

pub use error::RiskError;
