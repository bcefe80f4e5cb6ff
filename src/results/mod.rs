//! Result rows produced by the pricing/inventory computation
//!
//! The compute stage itself is an external collaborator; this module only models its
//! output: ordered rows of typed values, tagged with a client identifier.

pub mod loader;
pub mod row;
pub mod set;
pub mod value;

pub use loader::{load_result_set, ResultFormat};
pub use row::ResultRow;
pub use set::{ColumnMapping, ResultSet};
pub use value::FieldValue;
