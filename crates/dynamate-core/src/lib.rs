pub mod app_config;
pub mod config;
pub mod preview;
pub mod pricing;
pub mod schedule;
pub mod variant;

pub use app_config::{AppConfig, Environment};
pub use config::load_app_config_with_base_url;
pub use preview::{build_preview, count_fallbacks, format_price, PreviewRow};
pub use pricing::{
    apply_rule, evaluate, round_money, EvaluationResult, PriceField, PriceRule, PricingError,
    RuleParameter,
};
pub use schedule::{
    parse_local_datetime, FilterSelection, RevertRequest, ScheduleError, SchedulePayload,
    SimulationRequest,
};
pub use variant::{Collection, SimulatedVariant, Variant};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
