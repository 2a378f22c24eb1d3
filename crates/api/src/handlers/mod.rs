pub mod dealers;
pub mod health;
pub mod leads;
pub mod metrics;
pub mod rotation;
