pub mod descriptor;
pub mod engine;
pub mod manager;
pub mod materialize;
pub mod mutation;
pub mod query;

pub use engine::Engine;
pub use manager::{DatabaseError, DatabaseManager};
