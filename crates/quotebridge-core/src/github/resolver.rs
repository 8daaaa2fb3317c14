use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use tracing::{debug, warn};

use super::target::{contents_url, file_name_from_url, raw_url, repository_url, GithubTarget};
use super::{decode_text, FileSource, GithubFile};
use crate::credentials::CredentialSource;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::SourceError;

/// Default environment variable holding a GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
const README: &str = "README.md";
/// Branches tried, in order, for a repository root without a token.
const FALLBACK_BRANCHES: [&str; 2] = ["main", "master"];
const GITHUB_TIMEOUT_MS: u64 = 20_000;
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Resolves GitHub URLs into decoded file content.
#[derive(Clone)]
pub struct GithubFileResolver {
    http_client: Arc<dyn HttpClient>,
    credentials: CredentialSource,
}

impl GithubFileResolver {
    pub fn new(http_client: Arc<dyn HttpClient>, credentials: CredentialSource) -> Self {
        Self {
            http_client,
            credentials,
        }
    }

    /// Fetch the file `url` points at.
    ///
    /// With a token everything goes through the contents API (private
    /// repositories work); without one, files are fetched from the raw host.
    pub async fn resolve(&self, url: &str, token: Option<&str>) -> Result<GithubFile, SourceError> {
        let target = GithubTarget::parse(url)?;
        let token = self.credentials.resolve(token);

        match (target, token) {
            (GithubTarget::RepoRoot { owner, repo }, Some(token)) => {
                let branch = self.default_branch(&owner, &repo, &token).await?;
                self.fetch_via_api(&owner, &repo, &branch, README, &token).await
            }
            (GithubTarget::RepoRoot { owner, repo }, None) => {
                self.find_readme(&owner, &repo).await
            }
            (
                GithubTarget::File {
                    owner,
                    repo,
                    git_ref,
                    path,
                }
                | GithubTarget::Directory {
                    owner,
                    repo,
                    git_ref,
                    path,
                },
                Some(token),
            ) => self.fetch_via_api(&owner, &repo, &git_ref, &path, &token).await,
            (
                GithubTarget::File {
                    owner,
                    repo,
                    git_ref,
                    path,
                },
                None,
            ) => self.fetch_raw(&raw_url(&owner, &repo, &git_ref, &path)).await,
            (GithubTarget::Directory { .. }, None) => Err(SourceError::not_a_file(
                "the provided URL points to a directory, not a file",
            )),
        }
    }

    /// Try `README.md` on `main`, then `master`. Only the last error is kept.
    async fn find_readme(&self, owner: &str, repo: &str) -> Result<GithubFile, SourceError> {
        let mut last_error = None;
        for branch in FALLBACK_BRANCHES {
            match self.fetch_raw(&raw_url(owner, repo, branch, README)).await {
                Ok(file) => return Ok(file),
                Err(error) => {
                    debug!(owner, repo, branch, error = %error, "readme lookup failed");
                    last_error = Some(error);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| SourceError::not_found("README.md not found")))
    }

    async fn fetch_raw(&self, url: &str) -> Result<GithubFile, SourceError> {
        let response = self.send(HttpRequest::get(url)).await?;
        let bytes = response.body;
        Ok(GithubFile {
            file_name: file_name_from_url(url),
            size_bytes: bytes.len(),
            content_text: decode_text(bytes),
            source: FileSource::Raw,
        })
    }

    async fn fetch_via_api(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        path: &str,
        token: &str,
    ) -> Result<GithubFile, SourceError> {
        let url = contents_url(owner, repo, git_ref, path);
        let response = self.send(api_request(&url, token)).await?;

        let value: serde_json::Value = response.json().map_err(|e| {
            SourceError::unsupported_shape(format!("failed to parse GitHub contents response: {e}"))
        })?;
        if value.is_array() {
            return Err(SourceError::not_a_file(
                "the provided URL points to a directory, not a file",
            ));
        }
        let entry: ContentsEntry = serde_json::from_value(value).map_err(|e| {
            SourceError::unsupported_shape(format!("unexpected GitHub contents response: {e}"))
        })?;

        let bytes = match (entry.encoding.as_deref(), entry.content.as_deref()) {
            (Some("base64"), Some(content)) => decode_base64(content)?,
            _ => {
                let download_url = entry.download_url.as_deref().ok_or_else(|| {
                    SourceError::unsupported_shape(
                        "unable to retrieve file content from GitHub API response",
                    )
                })?;
                debug!(download_url, "following GitHub download url");
                // The download host serves raw bytes; the API Accept header does not apply.
                let request = HttpRequest::get(download_url)
                    .with_bearer_token(token)
                    .with_timeout_ms(GITHUB_TIMEOUT_MS);
                self.send(request).await?.body
            }
        };

        Ok(GithubFile {
            file_name: entry
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| file_name_from_url(path)),
            size_bytes: bytes.len(),
            content_text: decode_text(bytes),
            source: FileSource::Api,
        })
    }

    async fn default_branch(&self, owner: &str, repo: &str, token: &str) -> Result<String, SourceError> {
        let response = self
            .send(api_request(&repository_url(owner, repo), token))
            .await?;
        let info: RepositoryInfo = response.json().map_err(|e| {
            SourceError::unsupported_shape(format!("failed to parse GitHub repository response: {e}"))
        })?;
        info.default_branch
            .filter(|branch| !branch.is_empty())
            .ok_or_else(|| SourceError::unsupported_shape("GitHub repository has no default branch"))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SourceError> {
        let url = request.url.clone();
        debug!(url = %url, "github request");
        let request = request.with_timeout_ms(GITHUB_TIMEOUT_MS);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| SourceError::upstream(format!("github transport error: {}", error.message())))?;
        if !response.is_success() {
            warn!(url = %url, status = response.status, "github returned error status");
            return Err(SourceError::from_status("github", response.status));
        }
        Ok(response)
    }
}

fn api_request(url: &str, token: &str) -> HttpRequest {
    HttpRequest::get(url)
        .with_header("accept", GITHUB_ACCEPT)
        .with_bearer_token(token)
}

/// GitHub wraps base64 payloads at 60 columns.
fn decode_base64(content: &str) -> Result<Vec<u8>, SourceError> {
    let compact = content
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect::<String>();
    STANDARD
        .decode(compact)
        .map_err(|e| SourceError::unsupported_shape(format!("invalid base64 content from GitHub: {e}")))
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: Option<String>,
    encoding: Option<String>,
    content: Option<String>,
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    default_branch: Option<String>,
}
