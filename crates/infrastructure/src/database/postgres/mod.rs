pub mod postgres_dealer_repository;
pub mod postgres_lead_repository;

pub use postgres_dealer_repository::PostgresDealerRepository;
pub use postgres_lead_repository::PostgresLeadRepository;
