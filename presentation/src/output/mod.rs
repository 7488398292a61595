//! Output formatting for run detail/list/diff results.

pub mod console;
pub mod formatter;

pub use console::{ConsoleFormatter, JsonFormatter};
pub use formatter::OutputFormatter;
