use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the texforge binary.
#[derive(Debug, Parser)]
#[command(name = "texforge", version, about = "LaTeX to PDF compilation server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TEXFORGE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP compilation service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CompilerOverrides {
    /// Override the LaTeX executable invoked for each pass.
    #[arg(long = "compiler-program", value_name = "PATH")]
    pub program: Option<PathBuf>,

    /// Override the per-pass compiler timeout.
    #[arg(long = "compiler-timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Override the directory under which per-request workspaces are created.
    #[arg(long = "compiler-scratch-dir", value_name = "PATH")]
    pub scratch_dir: Option<PathBuf>,

    /// Cap the number of compilations running at once.
    #[arg(long = "compiler-max-concurrency", value_name = "COUNT")]
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub compiler: CompilerOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the maximum accepted request body size in bytes.
    #[arg(long = "server-max-request-bytes", value_name = "BYTES")]
    pub server_max_request_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the directory where PDFs for URL delivery are stored.
    #[arg(long = "artifacts-directory", value_name = "PATH")]
    pub artifacts_directory: Option<PathBuf>,

    /// Override the public base URL used to build download links.
    #[arg(long = "artifacts-public-base-url", value_name = "URL")]
    pub artifacts_public_base_url: Option<String>,
}
