pub mod pg_dump;
pub mod runner;
pub mod tar;

// Re-export for convenience
pub use pg_dump::PgDump;
pub use runner::{CommandError, CommandRunner, SystemRunner};
pub use tar::Tar;
