// Document layer: the in-memory word-processing tree the template engine edits.
// Paragraphs keep their runs and run formatting so cloned blocks render exactly
// like the template they were copied from. Encoding to bytes lives in `io`.

pub mod io;
pub mod model;
pub mod replace;

pub use model::{Block, Cell, Container, Document, Paragraph, Row};
