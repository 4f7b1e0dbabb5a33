#[cfg(test)]
#[path = "ingest_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use tokio::fs;

use crate::domain::models::AttachmentKind;
use crate::domain::models::AttachmentUpload;
use crate::domain::models::DocumentSummary;
use crate::domain::models::ReceiptAnalysis;
use crate::domain::models::MAX_IMAGE_BYTES;
use crate::domain::models::SPREADSHEET_EXTENSIONS;

fn extension(filename: &str) -> String {
    return path::Path::new(filename)
        .extension()
        .map(|e| return e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "png" => return "image/png",
        "jpg" | "jpeg" => return "image/jpeg",
        "gif" => return "image/gif",
        "webp" => return "image/webp",
        "csv" => return "text/csv",
        "xlsx" => {
            return "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
        }
        "xls" => return "application/vnd.ms-excel",
        _ => return "application/octet-stream",
    }
}

pub fn classify(upload: &AttachmentUpload) -> Result<AttachmentKind> {
    if upload.mime.starts_with("image/") {
        return Ok(AttachmentKind::Image);
    }

    let ext = extension(&upload.filename);
    if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(AttachmentKind::Spreadsheet);
    }

    bail!(format!(
        "Unsupported attachment {}. Receipts must be images, and spreadsheets must be .csv, .xlsx, or .xls files.",
        upload.filename
    ))
}

/// Validates an upload before anything touches the network. Oversized
/// images are rejected here, prior to base64 encoding.
pub fn validate(upload: &AttachmentUpload) -> Result<AttachmentKind> {
    let kind = classify(upload)?;

    if kind == AttachmentKind::Image && upload.bytes.len() > MAX_IMAGE_BYTES {
        bail!(format!(
            "{} is too large. Receipt images are capped at 5 MiB.",
            upload.filename
        ))
    }

    return Ok(kind);
}

/// Reads and validates a file from disk.
pub async fn load_upload(file_path: &path::Path) -> Result<AttachmentUpload> {
    let filename = file_path
        .file_name()
        .map(|e| return e.to_string_lossy().to_string())
        .unwrap_or_default();
    if filename.is_empty() {
        bail!(format!("{} is not a file", file_path.display()))
    }

    let bytes = fs::read(file_path).await?;
    let upload = AttachmentUpload {
        mime: mime_for_extension(&extension(&filename)).to_string(),
        filename,
        bytes,
    };

    validate(&upload)?;
    return Ok(upload);
}

pub fn to_data_url(upload: &AttachmentUpload) -> String {
    return format!("data:{};base64,{}", upload.mime, b64.encode(&upload.bytes));
}

pub fn render_receipt(analysis: &ReceiptAnalysis) -> String {
    return format!(
        r#"**Receipt Analysis**

Amount: ${amount:.2}
Vendor: {vendor}
Date: {date}
Category: {category}
Description: {description}
Confidence: {confidence:.0}%

Would you like me to create a transaction from this receipt?"#,
        amount = analysis.amount,
        vendor = analysis.vendor,
        date = analysis.date,
        category = analysis.category,
        description = analysis.description,
        confidence = analysis.confidence * 100.0,
    );
}

pub fn render_document_summary(summary: &DocumentSummary) -> String {
    let mut text = format!(
        "Uploaded {filename}: imported {imported} transactions.",
        filename = summary.filename,
        imported = summary.imported,
    );

    if summary.skipped > 0 {
        text += &format!(" Skipped {} rows with invalid data.", summary.skipped);
    }
    if !summary.errors.is_empty() {
        text += &format!("\nErrors: {}", summary.errors.join(", "));
    }
    if summary.imported > 0 {
        text += "\nCheck the transactions page to see your imported data.";
    }

    return text;
}
