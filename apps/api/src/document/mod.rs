// Document assembly: turns rendered pages into the response body.
// PDF output goes through the external renderer one page at a time, then lopdf merges.

pub mod merge;
pub mod renderer;

use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info};

use crate::sheet::tile::escape_xml;
use crate::sheet::RenderedPage;

pub use merge::merge_pdfs;
pub use renderer::{svg_data_uri, DocumentRenderer, Html2PdfClient, RendererError};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Renderer(#[from] RendererError),

    #[error("PDF merge failed: {0}")]
    Merge(#[from] lopdf::Error),

    #[error("PDF write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("No pages to assemble")]
    NoPages,
}

/// Output selected by the form's `action` button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Merged PDF from the external renderer.
    Pdf,
    /// Page SVGs inlined into one HTML body (zoomed out).
    InlineSvg,
    /// Each page as an `<img>` with a data URI (zoomed in).
    ZoomedPreview,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid action: {0:?}")]
pub struct UnsupportedFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnsupportedFormat;

    fn from_str(action: &str) -> Result<Self, Self::Err> {
        match action {
            "generate" => Ok(Self::Pdf),
            "preview" | "preview_small" => Ok(Self::InlineSvg),
            "preview_large" => Ok(Self::ZoomedPreview),
            other => Err(UnsupportedFormat(other.to_string())),
        }
    }
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::InlineSvg | Self::ZoomedPreview => "text/html; charset=utf-8",
        }
    }
}

/// A finished response body.
#[derive(Debug)]
pub struct Document {
    pub format: OutputFormat,
    pub body: Vec<u8>,
}

/// Assembles pages into the requested format. Any renderer failure discards the pages
/// already converted.
pub async fn assemble(
    format: OutputFormat,
    pages: &[RenderedPage],
    renderer: &dyn DocumentRenderer,
) -> Result<Document, DocumentError> {
    if pages.is_empty() {
        return Err(DocumentError::NoPages);
    }

    let body = match format {
        OutputFormat::Pdf => render_pdf(pages, renderer).await?,
        OutputFormat::InlineSvg => inline_preview(pages).into_bytes(),
        OutputFormat::ZoomedPreview => zoomed_preview(pages).into_bytes(),
    };

    info!(?format, pages = pages.len(), bytes = body.len(), "Document assembled");
    Ok(Document { format, body })
}

async fn render_pdf(
    pages: &[RenderedPage],
    renderer: &dyn DocumentRenderer,
) -> Result<Vec<u8>, DocumentError> {
    let mut pdfs = Vec::with_capacity(pages.len());
    for page in pages {
        let pdf = renderer.render_page(&page.markup).await?;
        debug!(
            page = page.number,
            tiles = page.tile_count,
            bytes = pdf.len(),
            "Page rendered to PDF"
        );
        pdfs.push(pdf);
    }
    merge_pdfs(&pdfs)
}

fn html_page(body: impl IntoIterator<Item = String>) -> String {
    let mut out = String::from("<!DOCTYPE html><html><body>");
    for part in body {
        out.push_str(&part);
    }
    out.push_str("</body></html>");
    out
}

/// All page SVGs inline, one after another.
pub fn inline_preview(pages: &[RenderedPage]) -> String {
    html_page(pages.iter().map(|p| p.markup.clone()))
}

/// Each page as an image, which the browser scales up to its natural size.
/// The page header doubles as the image's alt text.
pub fn zoomed_preview(pages: &[RenderedPage]) -> String {
    html_page(pages.iter().map(|p| {
        format!(
            r#"<img src="{}" alt="{}" />"#,
            svg_data_uri(&p.markup),
            escape_xml(&p.header_lines.join(" "))
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::merge::tests::one_page_pdf;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page(number: usize) -> RenderedPage {
        RenderedPage {
            number,
            tile_count: 1,
            header_lines: vec![format!("page {number}")],
            markup: format!("<svg>{number}</svg>"),
        }
    }

    /// Returns a one-page PDF per call, or fails on the given call.
    struct StubRenderer {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl StubRenderer {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl DocumentRenderer for StubRenderer {
        async fn render_page(&self, svg: &str) -> Result<Bytes, RendererError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(call) {
                return Err(RendererError::Failure {
                    status: 503,
                    message: "down".to_string(),
                });
            }
            Ok(Bytes::from(one_page_pdf(svg)))
        }
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!("generate".parse::<OutputFormat>(), Ok(OutputFormat::Pdf));
        // `preview` is deliberately an alias of `preview_small`, not an invalid action.
        assert_eq!("preview".parse::<OutputFormat>(), Ok(OutputFormat::InlineSvg));
        assert_eq!("preview_small".parse::<OutputFormat>(), Ok(OutputFormat::InlineSvg));
        assert_eq!("preview_large".parse::<OutputFormat>(), Ok(OutputFormat::ZoomedPreview));
        assert_eq!(
            "invalid".parse::<OutputFormat>(),
            Err(UnsupportedFormat("invalid".to_string()))
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(OutputFormat::Pdf.content_type(), "application/pdf");
        assert!(OutputFormat::ZoomedPreview
            .content_type()
            .starts_with("text/html"));
    }

    #[test]
    fn test_inline_preview_keeps_page_order() {
        let html = inline_preview(&[page(1), page(2)]);
        assert_eq!(
            html,
            "<!DOCTYPE html><html><body><svg>1</svg><svg>2</svg></body></html>"
        );
    }

    #[test]
    fn test_zoomed_preview_uses_data_uris() {
        let html = zoomed_preview(&[page(1), page(2)]);
        assert_eq!(html.matches(r#"<img src="data:image/svg+xml;base64,"#).count(), 2);
        assert!(!html.contains("<svg>"));
        assert!(html.contains(r#"alt="page 1""#));
        assert!(html.contains(r#"alt="page 2""#));
    }

    #[tokio::test]
    async fn test_assemble_pdf_merges_in_order() {
        let renderer = StubRenderer::new(None);
        let doc = assemble(OutputFormat::Pdf, &[page(1), page(2), page(3)], &renderer)
            .await
            .unwrap();
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);

        let pdf = lopdf::Document::load_mem(&doc.body).unwrap();
        let pages = pdf.get_pages();
        assert_eq!(pages.len(), 3);
        let first = pdf.get_page_content(pages[&1]).unwrap();
        assert!(String::from_utf8_lossy(&first).contains("<svg>1</svg>"));
    }

    #[tokio::test]
    async fn test_assemble_pdf_fails_without_partial_output() {
        let renderer = StubRenderer::new(Some(1));
        let result = assemble(OutputFormat::Pdf, &[page(1), page(2), page(3)], &renderer).await;
        assert!(matches!(
            result,
            Err(DocumentError::Renderer(RendererError::Failure { status: 503, .. }))
        ));
        // No retry, and nothing after the failing page.
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_assemble_preview_skips_renderer() {
        let renderer = StubRenderer::new(Some(0));
        let doc = assemble(OutputFormat::InlineSvg, &[page(1)], &renderer)
            .await
            .unwrap();
        assert_eq!(doc.format, OutputFormat::InlineSvg);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_assemble_rejects_no_pages() {
        let renderer = StubRenderer::new(None);
        let result = assemble(OutputFormat::InlineSvg, &[], &renderer).await;
        assert!(matches!(result, Err(DocumentError::NoPages)));
    }
}
