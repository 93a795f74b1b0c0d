// Export pipeline: layout lookup, template loading, generation and encoding.
// Generation itself is synchronous; `service` moves it onto the blocking pool.

pub mod generator;
pub mod service;
pub mod store;

pub use service::ExportService;
pub use store::{FsTemplateStore, TemplateStore};
