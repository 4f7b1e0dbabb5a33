use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Image payloads above this are rejected before any encoding or network
/// call happens.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const SPREADSHEET_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Spreadsheet,
}

/// A file picked up from disk, prior to validation.
#[derive(Clone)]
pub struct AttachmentUpload {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Structured extraction for a receipt image. Rendered into conversation
/// text and then discarded, never persisted client-side.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptAnalysis {
    pub amount: f64,
    pub vendor: String,
    pub date: String,
    pub category: String,
    pub description: String,
    pub confidence: f64,
}

/// Import summary for an analyzed spreadsheet.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub filename: String,
    #[serde(default)]
    pub imported: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub errors: Vec<String>,
}
