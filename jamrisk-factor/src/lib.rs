pub mod adequacy;
pub mod correlation;
mod eigen_ops;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod factor_model;
pub mod rotation;

#[cfg(test)]
mod test_utils;

pub use engine::{fit, fit_table};
pub use error::{FactorError, FactorWarning};
pub use factor_model::FactorModel;
