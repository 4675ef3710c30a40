//! Subcommand implementations.

mod embed;
mod table;

pub use embed::EmbedCommand;
pub use table::TableCommand;
