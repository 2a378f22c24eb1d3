pub mod api_observability;
pub mod app_config;
pub mod database;
pub mod notifier;
pub mod rotation;

pub use api_observability::{ApiConfig, ObservabilityConfig};
pub use app_config::AppConfig;
pub use database::DatabaseConfig;
pub use notifier::{NotifierConfig, NotifierKind};
pub use rotation::RotationConfig;
