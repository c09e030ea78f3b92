pub mod error;
pub mod order;
pub mod params;
pub mod types;
pub mod where_clause;

pub use error::FilterError;
pub use params::ListParams;
pub use types::{SortDirection, SqlResult};
