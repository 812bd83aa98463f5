// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vault Client
//!
//! Typed HTTP client for the vault API. Trusts a private root CA when one is
//! given, keeps the session token after register or login, and streams
//! uploads as NDJSON frames.
//!
//! ```rust,ignore
//! let mut client = VaultClient::with_root_ca("https://vault.local:8443", &ca_pem)?;
//! client.login("alice", "pw1").await?;
//! let id = client.upload("note", "text", b"secret".to_vec(), 4096).await?;
//! ```

use futures::{stream, Stream, StreamExt};
use reqwest::{header, Certificate, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::api::ndjson::{encode_frame, CONTENT_TYPE};
use crate::models::{
    CredentialsRequest, DeleteResponse, RecordContent, Reply, TokenResponse, WriteResponse,
};
use crate::pipeline::WriteChunk;
use crate::storage::{RecordId, RecordSummary};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// Business error returned by the server.
    #[error("{0}")]
    Service(String),
}

#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl VaultClient {
    /// Client using the platform's default trust roots.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().use_rustls_tls().build()?;
        Self::from_parts(http, base_url)
    }

    /// Client that trusts the given PEM root certificate.
    pub fn with_root_ca(base_url: &str, ca_pem: &[u8]) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .add_root_certificate(Certificate::from_pem(ca_pem)?)
            .build()?;
        Self::from_parts(http, base_url)
    }

    fn from_parts(http: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Create an account and keep its session token.
    pub async fn register(&mut self, login: &str, password: &str) -> Result<(), ClientError> {
        let token = self.credentials("v1/users/register", login, password).await?;
        self.token = Some(token);
        Ok(())
    }

    /// Log in and keep the session token.
    pub async fn login(&mut self, login: &str, password: &str) -> Result<(), ClientError> {
        let token = self.credentials("v1/users/login", login, password).await?;
        self.token = Some(token);
        Ok(())
    }

    async fn credentials(
        &self,
        path: &str,
        login: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let body = CredentialsRequest {
            login: login.to_string(),
            password: password.to_string(),
        };
        let reply: TokenResponse = self.send_json(reqwest::Method::POST, path, &body).await?;
        Ok(reply.token)
    }

    pub async fn list_records(&self) -> Result<Vec<RecordSummary>, ClientError> {
        let response = self.request(reqwest::Method::GET, "v1/records")?.send().await?;
        unpack(response).await
    }

    pub async fn read_record(&self, id: RecordId) -> Result<RecordContent, ClientError> {
        let path = format!("v1/records/{id}");
        let response = self.request(reqwest::Method::GET, &path)?.send().await?;
        unpack(response).await
    }

    pub async fn delete_record(&self, id: RecordId) -> Result<u64, ClientError> {
        let path = format!("v1/records/{id}");
        let response = self.request(reqwest::Method::DELETE, &path)?.send().await?;
        let reply: DeleteResponse = unpack(response).await?;
        Ok(reply.deleted)
    }

    /// Stream `chunks` as one upload and return the new record id.
    pub async fn write_record<S>(&self, chunks: S) -> Result<RecordId, ClientError>
    where
        S: Stream<Item = WriteChunk> + Send + 'static,
    {
        let frames = chunks.map(|chunk| encode_frame(&chunk));
        let response = self
            .request(reqwest::Method::POST, "v1/records")?
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .body(reqwest::Body::wrap_stream(frames))
            .send()
            .await?;
        let reply: WriteResponse = unpack(response).await?;
        Ok(reply.id)
    }

    /// Upload `data` split into frames of at most `chunk_size` bytes.
    ///
    /// Name and kind travel on the first frame only.
    pub async fn upload(
        &self,
        name: &str,
        kind: &str,
        data: Vec<u8>,
        chunk_size: usize,
    ) -> Result<RecordId, ClientError> {
        let chunk_size = chunk_size.max(1);
        let mut frames: Vec<WriteChunk> = data
            .chunks(chunk_size)
            .map(|part| WriteChunk::new("", "", part))
            .collect();
        match frames.first_mut() {
            Some(first) => {
                first.name = name.to_string();
                first.kind = kind.to_string();
            }
            None => frames.push(WriteChunk::new(name, kind, Vec::new())),
        }
        self.write_record(stream::iter(frames)).await
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send_json<B, T>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path)?.json(body).send().await?;
        unpack(response).await
    }
}

async fn unpack<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let code = body["error_code"].as_str().unwrap_or("unauthenticated");
        return Err(ClientError::Unauthenticated(code.to_string()));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<Reply<T>>()
        .await?
        .into_result()
        .map_err(ClientError::Service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = VaultClient::new("https://vault.local:8443/api").unwrap();
        assert_eq!(
            client.base_url.join("v1/records").unwrap().as_str(),
            "https://vault.local:8443/api/v1/records"
        );

        let client = VaultClient::new("https://vault.local:8443").unwrap();
        assert_eq!(
            client.base_url.join("v1/records/3").unwrap().as_str(),
            "https://vault.local:8443/v1/records/3"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(VaultClient::new("not a url"), Err(ClientError::Url(_))));
        assert!(matches!(
            VaultClient::new("https://vault.local:99999"),
            Err(ClientError::Url(_))
        ));
    }

    #[test]
    fn token_is_kept() {
        let mut client = VaultClient::new("http://127.0.0.1:1").unwrap();
        assert!(client.token().is_none());
        client.set_token("abc");
        assert_eq!(client.token(), Some("abc"));
    }
}
