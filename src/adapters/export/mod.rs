//! Dream export adapters.

mod local_file_export;

pub use local_file_export::LocalFileExporter;
