// Placeholder resolution: flattens data objects into a FieldMap and recognizes
// the placeholder syntaxes that templates embed (`<<Path>>`, `{Path}`, `{Path[i]}`).

pub mod field_map;
pub mod resolver;
pub mod token;

pub use field_map::FieldMap;
pub use resolver::{FieldAccess, FieldError, FieldSource, FieldValue};
pub use token::{Dialect, PlaceholderToken};
