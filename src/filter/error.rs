use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid column name: {0}")]
    InvalidColumn(String),
}
