pub mod db;
pub mod embeddings;
pub mod filter;
pub mod migrate;
pub mod models;
pub mod records;
pub mod stats;
pub mod tags;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
