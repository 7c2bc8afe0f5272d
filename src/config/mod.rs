//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{CliArgs, Command, CompilerOverrides, ServeArgs, ServeOverrides};

use std::{
    net::SocketAddr,
    num::{NonZeroU64, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::compile::{CompileOptions, DEFAULT_COMPILE_TIMEOUT};
use crate::infra::compiler::DEFAULT_COMPILER_PROGRAM;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "texforge";
const ENV_PREFIX: &str = "TEXFORGE";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_MAX_REQUEST_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_ARTIFACTS_DIRNAME: &str = "texforge-artifacts";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub compiler: CompilerSettings,
    pub artifacts: ArtifactSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CompilerSettings {
    pub program: PathBuf,
    pub timeout: Duration,
    pub scratch_dir: Option<PathBuf>,
    pub max_concurrency: Option<NonZeroUsize>,
}

impl From<&CompilerSettings> for CompileOptions {
    fn from(settings: &CompilerSettings) -> Self {
        Self {
            timeout: settings.timeout,
            scratch_dir: settings.scratch_dir.clone(),
            max_concurrency: settings.max_concurrency,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactSettings {
    pub directory: PathBuf,
    /// Base for download links; derived from the request `Host` when `None`.
    /// Always ends with `/` so stored names can be joined onto it.
    pub public_base_url: Option<Url>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    // `TEXFORGE_ARTIFACTS__DIRECTORY`: single `_` after the prefix, `__` between sections.
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    compiler: RawCompilerSettings,
    artifacts: RawArtifactSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(bytes) = overrides.server_max_request_bytes {
            self.server.max_request_bytes = Some(bytes);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(directory) = overrides.artifacts_directory.as_ref() {
            self.artifacts.directory = Some(directory.clone());
        }
        if let Some(url) = overrides.artifacts_public_base_url.as_ref() {
            self.artifacts.public_base_url = Some(url.clone());
        }

        self.apply_compiler_overrides(&overrides.compiler);
    }

    fn apply_compiler_overrides(&mut self, overrides: &CompilerOverrides) {
        if let Some(program) = overrides.program.as_ref() {
            self.compiler.program = Some(program.clone());
        }
        if let Some(seconds) = overrides.timeout_seconds {
            self.compiler.timeout_seconds = Some(seconds);
        }
        if let Some(dir) = overrides.scratch_dir.as_ref() {
            self.compiler.scratch_dir = Some(dir.clone());
        }
        if let Some(limit) = overrides.max_concurrency {
            self.compiler.max_concurrency = Some(limit);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            compiler,
            artifacts,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            compiler: build_compiler_settings(compiler)?,
            artifacts: build_artifact_settings(artifacts)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }
    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    let max_request_bytes_value = server
        .max_request_bytes
        .unwrap_or(DEFAULT_MAX_REQUEST_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("server.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "server.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
        max_request_bytes,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_compiler_settings(compiler: RawCompilerSettings) -> Result<CompilerSettings, LoadError> {
    let program = compiler
        .program
        .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPILER_PROGRAM));
    if program.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "compiler.program",
            "path must not be empty",
        ));
    }

    let timeout = match compiler.timeout_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "compiler.timeout_seconds",
                "must be greater than zero",
            ));
        }
        Some(seconds) => Duration::from_secs(seconds),
        None => DEFAULT_COMPILE_TIMEOUT,
    };

    let scratch_dir = compiler
        .scratch_dir
        .filter(|dir| !dir.as_os_str().is_empty());

    let max_concurrency = compiler
        .max_concurrency
        .map(|limit| {
            NonZeroUsize::new(limit).ok_or_else(|| {
                LoadError::invalid("compiler.max_concurrency", "must be greater than zero")
            })
        })
        .transpose()?;

    Ok(CompilerSettings {
        program,
        timeout,
        scratch_dir,
        max_concurrency,
    })
}

fn build_artifact_settings(artifacts: RawArtifactSettings) -> Result<ArtifactSettings, LoadError> {
    let directory = artifacts
        .directory
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_ARTIFACTS_DIRNAME));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "artifacts.directory",
            "path must not be empty",
        ));
    }

    let public_base_url = artifacts
        .public_base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(|value| parse_base_url(&value))
        .transpose()
        .map_err(|reason| LoadError::invalid("artifacts.public_base_url", reason))?;

    Ok(ArtifactSettings {
        directory,
        public_base_url,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCompilerSettings {
    program: Option<PathBuf>,
    timeout_seconds: Option<u64>,
    scratch_dir: Option<PathBuf>,
    max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawArtifactSettings {
    directory: Option<PathBuf>,
    public_base_url: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_base_url(value: &str) -> Result<Url, String> {
    let mut url = Url::parse(value).map_err(|err| format!("invalid URL `{value}`: {err}"))?;
    if url.cannot_be_a_base() {
        return Err(format!("`{value}` cannot be used as a base URL"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests;
