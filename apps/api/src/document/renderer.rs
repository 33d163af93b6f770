//! Document renderer. Turns one page of SVG into a PDF through an external service.
//!
//! The production backend is an html2pdf-style HTTP service: it receives a form field `url`
//! holding a `data:image/svg+xml;base64,...` URI and answers with the PDF bytes.
//! No retries: a failed page fails the whole document.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Renderer unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("Renderer failed (status {status}): {message}")]
    Failure { status: u16, message: String },
}

/// Renders a single page. Carried in `AppState` as `Arc<dyn DocumentRenderer>`.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_page(&self, svg: &str) -> Result<Bytes, RendererError>;
}

/// `data:` URI for an SVG document.
pub fn svg_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", BASE64.encode(svg.as_bytes()))
}

#[derive(Clone)]
pub struct Html2PdfClient {
    client: Client,
    endpoint: String,
}

impl Html2PdfClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, RendererError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DocumentRenderer for Html2PdfClient {
    async fn render_page(&self, svg: &str) -> Result<Bytes, RendererError> {
        let data_uri = svg_data_uri(svg);
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("url", data_uri.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("<unreadable response body: {e}>"),
            };
            return Err(RendererError::Failure {
                status: status.as_u16(),
                message,
            });
        }

        let pdf = response.bytes().await?;
        debug!(bytes = pdf.len(), "Renderer returned page");
        Ok(pdf)
    }
}
