use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Unknown filter column: {0}")]
    UnknownFilterColumn(String),

    #[error("Unknown sort column: {0}")]
    UnknownSortColumn(String),
}
