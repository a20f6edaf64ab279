pub mod local_store;
pub mod models;
pub mod order_repo;
pub mod remote_store;
