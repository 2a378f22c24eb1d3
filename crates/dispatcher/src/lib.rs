pub mod assignment;
pub mod coordinator;
pub mod cycle_reset;
pub mod metrics;
pub mod retry;

pub use assignment::AssignmentEngine;
pub use coordinator::LeadSubmissionCoordinator;
pub use cycle_reset::CycleResetController;
pub use metrics::RotationMetrics;
pub use retry::BackoffPolicy;
