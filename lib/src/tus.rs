//! Minimal client for the resumable chunked-transfer protocol the registry
//! uses for upload jobs (tus 1.0): create an upload target, then transfer
//! the content with sequential `PATCH` requests carrying the current offset.

use crate::errors::TransportError;
use crate::transport::Transport;
use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use url::Url;

const TUS_VERSION: &str = "1.0.0";
const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct TusUpload {
    transport: Transport,
    chunk_size: usize,
}

impl TusUpload {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Declares a new upload of `length` bytes at `endpoint` and returns the
    /// upload URL assigned by the server (the `Location` header, resolved
    /// against the endpoint when relative).
    pub fn create(&self, endpoint: &str, length: u64, file_name: &str) -> Result<String> {
        let metadata = format!("filename {}", STANDARD.encode(file_name));
        let resp = self
            .transport
            .authorize(self.transport.http().post(endpoint))
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Length", length)
            .header("Upload-Metadata", metadata)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(TransportError::new(endpoint, status, body).into());
        }
        let location = resp
            .headers()
            .get("Location")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| anyhow!("Upload creation at {endpoint} returned no Location header"))?
            .to_string();
        Ok(Url::parse(endpoint)?.join(&location)?.to_string())
    }

    /// Transfers `data` to a previously created upload URL, one chunk per
    /// `PATCH`. The protocol requires `204 No Content` per chunk; anything
    /// else is a [`TransportError`] with the response body preserved, so
    /// callers can inspect known non-conformant answers.
    pub fn upload(&self, upload_url: &str, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            let end = (offset + self.chunk_size).min(data.len());
            let chunk = data[offset..end].to_vec();
            debug!("patching {}..{} of {} to {upload_url}", offset, end, data.len());
            let resp = self
                .transport
                .authorize(self.transport.http().patch(upload_url))
                .header("Tus-Resumable", TUS_VERSION)
                .header("Upload-Offset", offset)
                .header("Content-Type", "application/offset+octet-stream")
                .body(chunk)
                .send()?;
            let status = resp.status();
            if status != reqwest::StatusCode::NO_CONTENT {
                let body = resp.text().unwrap_or_default();
                return Err(TransportError::new(upload_url, status, body).into());
            }
            offset = end;
        }
        Ok(())
    }
}
