mod error;
mod filter_where;
mod types;

pub use error::FilterError;
pub use filter_where::FilterWhere;
pub use types::{DocumentFilter, FilterValue, Predicate};
