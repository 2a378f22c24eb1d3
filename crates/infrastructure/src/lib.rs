pub mod database;
pub mod notifier;

pub use database::*;
pub use notifier::*;
