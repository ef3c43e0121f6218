pub mod errors;
pub mod fetch_client;
