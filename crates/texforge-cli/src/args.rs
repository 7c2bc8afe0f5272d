//! Command-line surface for `texforge-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "texforge-cli", version, about = "texforge LaTeX compilation client", long_about = None)]
pub struct Cli {
    /// Service base URL, e.g. <http://127.0.0.1:8000>
    #[arg(long, env = "TEXFORGE_SITE_URL")]
    pub site: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the service is up
    Health,
    /// Compile a `.tex` file into a PDF
    Compile(CompileArgs),
}

#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// LaTeX source file
    pub file: PathBuf,

    /// Suggested output filename (sanitized by the server)
    #[arg(long)]
    pub filename: Option<String>,

    /// How the server should deliver the PDF
    #[arg(long, value_enum, default_value_t = DeliveryMode::Direct)]
    pub mode: DeliveryMode,

    /// Where to write the PDF; defaults to the filename chosen by the server
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeliveryMode {
    /// Raw PDF response
    Direct,
    /// PDF embedded as base64 in JSON
    Base64,
    /// PDF stored server-side; prints the download URL
    Url,
}
