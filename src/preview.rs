use reqwest::Url;
use serde::Serialize;

use crate::storage::models::FileRecord;

const OFFICE_VIEWER: &str = "https://view.officeapps.live.com/op/embed.aspx";

/// How a file is shown in the preview pane, chosen from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    /// PDF in an inline frame
    Document,
    Image,
    Video,
    Audio,
    /// Office formats rendered by the hosted office viewer
    SpreadsheetEmbed,
    PlainText,
    /// Download only
    Unsupported,
}

impl PreviewKind {
    pub fn from_file_type(file_type: &str) -> Self {
        match file_type.to_lowercase().as_str() {
            "pdf" => PreviewKind::Document,
            "png" | "jpg" | "jpeg" | "gif" => PreviewKind::Image,
            "mp4" => PreviewKind::Video,
            "mp3" => PreviewKind::Audio,
            "docx" | "xlsx" | "pptx" | "csv" => PreviewKind::SpreadsheetEmbed,
            "txt" => PreviewKind::PlainText,
            _ => PreviewKind::Unsupported,
        }
    }
}

/// What the client needs to render a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub kind: PreviewKind,
    /// Source to embed; `None` when only a download is offered
    pub src: Option<String>,
    pub download_url: String,
    pub title: String,
}

impl Preview {
    pub fn for_file(file: &FileRecord) -> Self {
        let kind = PreviewKind::from_file_type(&file.file_type);
        let src = match kind {
            PreviewKind::Document => Some(format!("{}#view=fit", file.blob_ref)),
            PreviewKind::Image
            | PreviewKind::Video
            | PreviewKind::Audio
            | PreviewKind::PlainText => Some(file.blob_ref.clone()),
            PreviewKind::SpreadsheetEmbed => office_viewer_url(&file.blob_ref),
            PreviewKind::Unsupported => None,
        };

        Preview {
            kind,
            src,
            download_url: file.blob_ref.clone(),
            title: file.name.clone(),
        }
    }
}

fn office_viewer_url(blob_ref: &str) -> Option<String> {
    match Url::parse_with_params(OFFICE_VIEWER, &[("src", blob_ref)]) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build office viewer URL");
            None
        }
    }
}
