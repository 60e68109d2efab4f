//! hclparse-tables cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the parse table and write it to the cache file
    ///
    /// Writes to HCLPARSE_TABLE_CACHE (or the default location) unless --output is given
    #[command(alias = "gen")]
    Generate(GenerateCommand),

    /// Check that a cache file can be used by this build
    Verify(VerifyCommand),

    /// Print the grammar fingerprint
    Fingerprint,

    /// Print parse table statistics
    Stats(StatsCommand),
}

#[derive(Parser, Debug)]
pub struct GenerateCommand {
    /// Cache file to write
    #[clap(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Rebuild even if the existing cache file is up to date
    #[clap(short = 'f', long = "force")]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct VerifyCommand {
    /// Cache file to check
    #[clap(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct StatsCommand {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
