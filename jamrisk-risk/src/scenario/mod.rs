mod bucketing;
mod conditional_distribution;
mod record_audit;

pub use bucketing::{assign_scenario, partition, ScenarioPartition};
pub use conditional_distribution::{
    estimate_conditional_distributions, ConditionalDistribution, ConditionalDistributions,
    ExcludedScenario,
};
pub use record_audit::RecordAudit;
