//! shelf application library
//!
//! Application modules mounted by the shelf server and reused by the CLI.

pub mod modules;

/// Re-export commonly used types
pub use modules::books::{
    catalog::{BookCatalog, Timed},
    models::{Book, ListBooksParams},
    query::{BookQuery, ListBooksError},
};
