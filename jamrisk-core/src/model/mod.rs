mod feature_matrix;
mod observation;
mod weather_scenario;

pub use feature_matrix::{FeatureMatrix, DEFAULT_FEATURES};
pub use observation::{ObservationRecord, ObservationSet};
pub use weather_scenario::{PrecipitationIntensity, WeatherCondition, WeatherScenario};
