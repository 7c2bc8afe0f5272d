#![deny(clippy::all, clippy::pedantic)]

use reqwest::{Client, Response, StatusCode, Url, header::HeaderMap};
use serde::{Serialize, de::DeserializeOwned};
use texforge_api_types::ErrorBody;
use thiserror::Error;

use crate::args::Cli;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("site URL is required (use --site or TEXFORGE_SITE_URL)")]
    MissingSite,
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write output file {path}: {source}")]
    OutputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {detail}")]
    Server { status: StatusCode, detail: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

#[derive(Clone, Debug)]
pub struct Ctx {
    pub client: Client,
    pub base: Url,
}

impl Ctx {
    /// `site` may carry a path prefix (`https://host/texforge`); routes resolve beneath it.
    pub fn new(site: &str) -> Result<Self, CliError> {
        let mut base = Url::parse(site)?;
        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("texforge-cli/", env!("CARGO_PKG_VERSION"))
    }

    pub fn url(&self, path: &str) -> Result<Url, CliError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(CliError::Url)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        let resp = self.client.get(self.url(path)?).send().await?;
        let resp = Self::check(resp).await?;
        Self::parse(resp).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CliError> {
        let resp = self.client.post(self.url(path)?).json(body).send().await?;
        let resp = Self::check(resp).await?;
        Self::parse(resp).await
    }

    /// POST a JSON body and return the raw response bytes with their headers.
    pub async fn post_for_bytes<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(HeaderMap, Vec<u8>), CliError> {
        let resp = self.client.post(self.url(path)?).json(body).send().await?;
        let resp = Self::check(resp).await?;
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await?;
        Ok((headers, bytes.to_vec()))
    }

    async fn check(resp: Response) -> Result<Response, CliError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let bytes = resp.bytes().await?;
        let detail = serde_json::from_slice::<ErrorBody>(&bytes)
            .map(|body| body.detail)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        Err(CliError::Server { status, detail })
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, CliError> {
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CliError::InvalidResponse(format!("failed to parse body: {e}")))
    }
}

pub fn build_ctx_from_cli(cli: &Cli) -> Result<Ctx, CliError> {
    let site = cli.site.as_deref().ok_or(CliError::MissingSite)?;
    Ctx::new(site)
}
