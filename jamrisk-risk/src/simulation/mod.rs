mod monte_carlo;
mod risk_report;
mod sampler;

pub use monte_carlo::{simulate, stream_id};
pub use risk_report::{Reliability, RiskReport, RiskReportRow, ScenarioRisk};
pub use sampler::ScenarioSampler;
