// Utilities for storage module
pub mod error;
pub mod path;
pub mod size;
pub mod url;

/// Output format for CLI commands that can render machine-readable results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human friendly multi-line output
    #[default]
    Human,
    /// Single-line JSON output
    Json,
}
