//! # GitHub Contents Store
//!
//! Blob storage on top of the GitHub repository contents API. Every file is
//! a blob, directories are namespaces and the file's git blob SHA is the
//! version token. GitHub enforces the SHA check on `PUT` and `DELETE`,
//! which gives us optimistic concurrency for free.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::backend::{BlobEntry, BlobStore, StoredBlob};
use super::errors::{BlobStoreError, BlobStoreResult};

const ACCEPT: &str = "application/vnd.github.v3+json";

/// Longest upstream error message echoed into an error value
const MAX_UPSTREAM_MESSAGE: usize = 200;

/// Connection settings for the contents API
#[derive(Debug)]
pub struct GitHubStoreConfig {
    /// API root, e.g. `https://api.github.com`
    pub api_base_url: String,
    pub owner: String,
    pub repository: String,
    pub branch: String,
    pub token: SecretString,
    /// Per-request timeout; a hung call becomes a transport error
    pub timeout: Duration,
}

/// GitHub-backed blob store
#[derive(Debug)]
pub struct GitHubContentsStore {
    client: reqwest::Client,
    config: GitHubStoreConfig,
}

#[derive(Debug, Deserialize)]
struct ContentsItem {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    branch: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteContentsRequest<'a> {
    message: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsFile,
}

#[derive(Debug, Deserialize)]
struct PutContentsFile {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

impl GitHubContentsStore {
    /// Create a store client
    pub fn new(config: GitHubStoreConfig) -> BlobStoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("intake-vault/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BlobStoreError::Transport(format!("client build failed: {}", e)))?;

        Ok(Self { client, config })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repository,
            path.trim_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.contents_url(path))
            .header(
                header::AUTHORIZATION,
                format!("token {}", self.config.token.expose_secret()),
            )
            .header(header::ACCEPT, ACCEPT)
    }

    async fn get(&self, path: &str) -> BlobStoreResult<Response> {
        let response = self
            .request(Method::GET, path)
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await?;
        Ok(response)
    }
}

/// Turn a non-success response into an upstream error, keeping only the
/// API's `message` field
async fn upstream_error(response: Response) -> BlobStoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let mut message = serde_json::from_str::<GitHubErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or_else(|_| "unexpected response".to_string());
    if message.len() > MAX_UPSTREAM_MESSAGE {
        let mut cut = MAX_UPSTREAM_MESSAGE;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }

    tracing::warn!(status, body = %body, "contents API request failed");
    BlobStoreError::Upstream { status, message }
}

fn decode_content(item: &ContentsItem) -> BlobStoreResult<Vec<u8>> {
    if item.encoding.as_deref() != Some("base64") {
        return Err(BlobStoreError::InvalidResponse(format!(
            "{} is not returned inline (too large for the contents API?)",
            item.path
        )));
    }

    // The API wraps base64 at 60 columns
    let packed: String = item
        .content
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    base64::engine::general_purpose::STANDARD
        .decode(packed)
        .map_err(|e| BlobStoreError::InvalidResponse(format!("bad base64 in {}: {}", item.path, e)))
}

#[async_trait]
impl BlobStore for GitHubContentsStore {
    async fn read_blob(&self, name: &str) -> BlobStoreResult<StoredBlob> {
        let response = self.get(name).await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(BlobStoreError::NotFound(name.to_string())),
            _ => return Err(upstream_error(response).await),
        }

        let item: ContentsItem = response.json().await?;
        if item.kind != "file" {
            return Err(BlobStoreError::InvalidResponse(format!(
                "{} is a {}, not a file",
                name, item.kind
            )));
        }

        Ok(StoredBlob {
            content: decode_content(&item)?,
            version: item.sha,
        })
    }

    async fn write_blob(
        &self,
        name: &str,
        content: &[u8],
        expected_version: Option<&str>,
    ) -> BlobStoreResult<String> {
        let message = match expected_version {
            Some(_) => format!("Update {}", name),
            None => format!("Create {}", name),
        };
        let body = PutContentsRequest {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            sha: expected_version,
            branch: &self.config.branch,
        };

        let response = self.request(Method::PUT, name).json(&body).send().await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let created: PutContentsResponse = response.json().await?;
                Ok(created.content.sha)
            }
            StatusCode::CONFLICT => Err(BlobStoreError::Conflict(name.to_string())),
            // "sha wasn't supplied": the file already exists
            StatusCode::UNPROCESSABLE_ENTITY if expected_version.is_none() => {
                Err(BlobStoreError::Conflict(name.to_string()))
            }
            StatusCode::NOT_FOUND => Err(BlobStoreError::NotFound(name.to_string())),
            _ => Err(upstream_error(response).await),
        }
    }

    async fn delete_blob(&self, name: &str, expected_version: &str) -> BlobStoreResult<()> {
        let body = DeleteContentsRequest {
            message: format!("Delete {}", name),
            sha: expected_version,
            branch: &self.config.branch,
        };

        let response = self.request(Method::DELETE, name).json(&body).send().await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(BlobStoreError::NotFound(name.to_string())),
            StatusCode::CONFLICT => Err(BlobStoreError::Conflict(name.to_string())),
            _ => Err(upstream_error(response).await),
        }
    }

    async fn list_blobs(&self, prefix: &str) -> BlobStoreResult<Vec<BlobEntry>> {
        let response = self.get(prefix).await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(Vec::new()),
            _ => return Err(upstream_error(response).await),
        }

        let value: serde_json::Value = response.json().await?;
        if !value.is_array() {
            return Err(BlobStoreError::InvalidResponse(format!(
                "{} is not a directory",
                prefix
            )));
        }

        let items: Vec<ContentsItem> = serde_json::from_value(value)
            .map_err(|e| BlobStoreError::InvalidResponse(e.to_string()))?;

        Ok(items
            .into_iter()
            .filter(|item| item.kind == "file")
            .map(|item| BlobEntry {
                name: item.path,
                version: item.sha,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const FILE_PATH: &str = "/repos/acme/data/contents/early-access/a_at_x.com_1.encrypted";

    fn store_for(server: &mockito::ServerGuard) -> GitHubContentsStore {
        GitHubContentsStore::new(GitHubStoreConfig {
            api_base_url: server.url(),
            owner: "acme".to_string(),
            repository: "data".to_string(),
            branch: "main".to_string(),
            token: SecretString::from("test-token".to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_read_decodes_wrapped_base64() {
        let mut server = mockito::Server::new_async().await;
        // "deadbeef" wrapped over two lines
        server
            .mock("GET", FILE_PATH)
            .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
            .match_header("authorization", "token test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "type": "file",
                    "path": "early-access/a_at_x.com_1.encrypted",
                    "sha": "abc123",
                    "encoding": "base64",
                    "content": "ZGVh\nZGJlZWY=\n"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let blob = store_for(&server)
            .read_blob("early-access/a_at_x.com_1.encrypted")
            .await
            .unwrap();

        assert_eq!(blob.content, b"deadbeef");
        assert_eq!(blob.version, "abc123");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", FILE_PATH)
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let result = store_for(&server)
            .read_blob("early-access/a_at_x.com_1.encrypted")
            .await;
        assert!(matches!(result, Err(BlobStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_sends_base64_without_sha() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", FILE_PATH)
            .match_body(Matcher::Json(json!({
                "message": "Create early-access/a_at_x.com_1.encrypted",
                "content": "ZGVhZGJlZWY=",
                "branch": "main"
            })))
            .with_status(201)
            .with_body(r#"{"content":{"sha":"new-sha"},"commit":{"sha":"c1"}}"#)
            .create_async()
            .await;

        let version = store_for(&server)
            .write_blob("early-access/a_at_x.com_1.encrypted", b"deadbeef", None)
            .await
            .unwrap();

        assert_eq!(version, "new-sha");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stale_update_is_conflict() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", FILE_PATH)
            .match_body(Matcher::PartialJson(json!({ "sha": "old-sha" })))
            .with_status(409)
            .with_body(r#"{"message":"is at 111 but expected old-sha"}"#)
            .create_async()
            .await;

        let result = store_for(&server)
            .write_blob("early-access/a_at_x.com_1.encrypted", b"x", Some("old-sha"))
            .await;
        assert!(matches!(result, Err(BlobStoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_over_existing_is_conflict() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", FILE_PATH)
            .with_status(422)
            .with_body(r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#)
            .create_async()
            .await;

        let result = store_for(&server)
            .write_blob("early-access/a_at_x.com_1.encrypted", b"x", None)
            .await;
        assert!(matches!(result, Err(BlobStoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_stale_is_conflict() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", FILE_PATH)
            .match_body(Matcher::PartialJson(json!({ "sha": "old-sha", "branch": "main" })))
            .with_status(409)
            .with_body(r#"{"message":"does not match"}"#)
            .create_async()
            .await;

        let result = store_for(&server)
            .delete_blob("early-access/a_at_x.com_1.encrypted", "old-sha")
            .await;
        assert!(matches!(result, Err(BlobStoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_missing_namespace_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/data/contents/early-access")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let entries = store_for(&server).list_blobs("early-access").await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_list_keeps_files_only() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/data/contents/early-access")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!([
                    { "type": "file", "path": "early-access/a.encrypted", "sha": "s1" },
                    { "type": "dir", "path": "early-access/archive", "sha": "s2" },
                    { "type": "file", "path": "early-access/b.encrypted", "sha": "s3" }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let entries = store_for(&server).list_blobs("early-access").await.unwrap();
        assert_eq!(
            entries,
            vec![
                BlobEntry {
                    name: "early-access/a.encrypted".into(),
                    version: "s1".into()
                },
                BlobEntry {
                    name: "early-access/b.encrypted".into(),
                    version: "s3".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_with_safe_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/data/contents/early-access")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("<html>upstream meltdown</html>")
            .create_async()
            .await;

        let err = store_for(&server).list_blobs("early-access").await.unwrap_err();
        match err {
            BlobStoreError::Upstream { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "unexpected response");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hung_request_times_out_as_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepter = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => held.push(socket),
                    Err(_) => break,
                }
            }
        });

        let store = GitHubContentsStore::new(GitHubStoreConfig {
            api_base_url: format!("http://{}", addr),
            owner: "acme".to_string(),
            repository: "data".to_string(),
            branch: "main".to_string(),
            token: SecretString::from("test-token".to_string()),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let started = std::time::Instant::now();
        let err = store
            .read_blob("early-access/a_at_x.com_1.encrypted")
            .await
            .unwrap_err();
        accepter.abort();

        assert!(matches!(err, BlobStoreError::Transport(_)), "got {:?}", err);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
