//! Export service HTTP handlers.

mod export;
mod status;
mod tables;

pub use export::export_handler;
pub use status::status_handler;
pub use tables::tables_handler;
