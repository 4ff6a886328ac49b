//! Document upload and analysis endpoint.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;

use super::super::AppState;
use super::error::ApiError;
use crate::analysis::{AnalysisRequest, Verdict};

const NO_FILE_PROVIDED: &str = "No file provided";
const NO_FILE_SELECTED: &str = "No file selected";
const ONLY_PDF: &str = "Only PDF files are allowed";
const UNREADABLE_PDF: &str =
    "Could not extract text from PDF. The file may be corrupted or contain only images.";
const TOO_SHORT: &str = "Document appears to be too short or mostly empty";

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: Verdict,
    /// Characters of extracted text sent for analysis.
    pub document_length: usize,
}

/// Parts of the multipart form we care about.
#[derive(Debug, Default)]
struct Upload {
    file: Option<(String, Bytes)>,
    context: String,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                // A part without a filename attribute is a plain form value, not an upload
                let Some(filename) = field.file_name().map(str::to_string) else {
                    tracing::debug!("Ignoring file field without a filename");
                    continue;
                };
                let bytes = field.bytes().await?;
                upload.file = Some((filename, bytes));
            }
            Some("context") => {
                upload.context = field.text().await?;
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown form field");
            }
        }
    }

    Ok(upload)
}

fn has_pdf_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

/// Bytes that are recognisably some other format. Unknown content passes
/// and is left for the extractor to reject.
fn is_other_format(bytes: &[u8]) -> bool {
    infer::get(bytes).is_some_and(|kind| kind.mime_type() != "application/pdf")
}

/// POST /api/analyze - extract a PDF's text and analyze it.
pub async fn analyze_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut multipart = multipart?;
    let upload = read_upload(&mut multipart).await?;

    let (filename, bytes) = upload
        .file
        .ok_or_else(|| ApiError::bad_request(NO_FILE_PROVIDED))?;
    if filename.is_empty() {
        return Err(ApiError::bad_request(NO_FILE_SELECTED));
    }
    if !has_pdf_extension(&filename) || is_other_format(&bytes) {
        return Err(ApiError::bad_request(ONLY_PDF));
    }

    tracing::info!(file = %filename, bytes = bytes.len(), "Received document for analysis");

    let extractor = state.extractor.clone();
    let extracted = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| {
            tracing::warn!(file = %filename, error = %e, "Text extraction failed");
            ApiError::bad_request(UNREADABLE_PDF)
        })?
        .require_min_length(state.settings.server.min_text_chars)
        .map_err(|e| {
            tracing::warn!(error = %e, "Document rejected");
            ApiError::bad_request(TOO_SHORT)
        })?;

    let request = AnalysisRequest::new(upload.context, extracted.text);
    let analysis = state.analyzer.analyze(&request).await;

    tracing::info!(
        chars = extracted.length,
        fallback = analysis.is_fallback(),
        "Analysis complete"
    );

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis,
        document_length: extracted.length,
    }))
}
