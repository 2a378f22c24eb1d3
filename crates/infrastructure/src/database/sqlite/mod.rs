pub mod sqlite_dealer_repository;
pub mod sqlite_lead_repository;

pub use sqlite_dealer_repository::SqliteDealerRepository;
pub use sqlite_lead_repository::SqliteLeadRepository;
