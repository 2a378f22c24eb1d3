pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::models::AppConfig;
pub use errors::*;
pub use models::{
    DeliveryStatus, Dealer, LeadForm, LeadSubmission, LeadSummary, NewDealer, NewLeadSubmission,
    RotationProgress,
};
pub use traits::{DealerNotifier, DealerRepository, LeadRepository, NotifyError};

/// 统一的Result类型
pub type RotationResult<T> = std::result::Result<T, RotationError>;
