pub mod models;
pub mod order_repo;

pub use order_repo::DieselOrderStore;
