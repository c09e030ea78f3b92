pub mod envelope;

pub use envelope::{ListMetadata, ListResult};
