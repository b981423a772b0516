// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Documents Module
//!
//! Renders the signed agreement into a durable HTML artifact. The document
//! embeds the agreement text, the acceptance details and, when the captured
//! signature decodes cleanly, the signature image as an inline data URI. A
//! signature that fails to decode is left out; the document still renders
//! and the acceptance record keeps the raw payload untouched.
//!
//! Document ids carry the render timestamp plus a content-hash prefix, so
//! repeated renders never collide and byte-identical content is spottable
//! from the id alone.

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::storage::{FileStorage, StorageError, StorageResult};

/// Metadata for a rendered agreement document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StoredDocument {
    /// Document identifier (`nda-{timestamp}-{hash prefix}`)
    pub id: String,
    /// Account the document was rendered for
    pub account_id: String,
    /// SHA-256 of the rendered HTML, hex
    pub sha256: String,
    /// When the document was rendered
    pub rendered_at: DateTime<Utc>,
}

/// Inputs for one agreement render.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub account_id: &'a str,
    pub representative_name: &'a str,
    pub representative_email: &'a str,
    pub company_name: &'a str,
    pub accepted_at: DateTime<Utc>,
    /// Origin address captured at acceptance
    pub origin_ip: Option<&'a str>,
    /// Base64 PNG as captured at acceptance, unvalidated
    pub signature_png: Option<&'a str>,
    pub agreement_text: &'a str,
}

/// Renders and stores agreement documents.
pub struct DocumentGenerator<'a> {
    storage: &'a FileStorage,
}

impl<'a> DocumentGenerator<'a> {
    /// Create a new DocumentGenerator.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Render an acceptance into a stored document.
    pub fn render(&self, request: &RenderRequest<'_>) -> StorageResult<StoredDocument> {
        let html = render_html(request);

        let digest = Sha256::digest(html.as_bytes());
        let sha256 = hex_encode(&digest);
        let rendered_at = Utc::now();
        let id = format!(
            "nda-{}-{}",
            rendered_at.format("%Y%m%d%H%M%S"),
            &sha256[..8]
        );

        let document = StoredDocument {
            id: id.clone(),
            account_id: request.account_id.to_string(),
            sha256,
            rendered_at,
        };

        self.storage
            .write_raw(self.storage.paths().document_file(&id), html.as_bytes())?;
        self.storage
            .write_json(self.storage.paths().document_meta(&id), &document)?;

        tracing::info!(document_id = %id, account_id = %request.account_id, "Agreement document rendered");
        Ok(document)
    }

    /// Get document metadata by id.
    pub fn get(&self, document_id: &str) -> StorageResult<StoredDocument> {
        let path = self.storage.paths().document_meta(document_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Document {document_id}")));
        }
        self.storage.read_json(path)
    }

    /// Read the rendered HTML by id.
    pub fn read_html(&self, document_id: &str) -> StorageResult<String> {
        let path = self.storage.paths().document_file(document_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Document {document_id}")));
        }
        let bytes = self.storage.read_raw(path)?;
        String::from_utf8(bytes)
            .map_err(|e| StorageError::SerializationError(format!("Document not UTF-8: {e}")))
    }
}

/// Build the document HTML.
fn render_html(request: &RenderRequest<'_>) -> String {
    let mut html = String::with_capacity(2048 + request.agreement_text.len());

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Dealer Agreement</title>\n</head>\n<body>\n");
    html.push_str("<h1>Dealer Agreement</h1>\n");

    html.push_str("<div class=\"agreement-text\">\n");
    for paragraph in request.agreement_text.split("\n\n") {
        let trimmed = paragraph.trim();
        if trimmed.is_empty() {
            continue;
        }
        html.push_str("<p>");
        html.push_str(&escape_html(trimmed));
        html.push_str("</p>\n");
    }
    html.push_str("</div>\n");

    html.push_str("<div class=\"signing-block\">\n");
    html.push_str(&format!(
        "<p>Accepted by <strong>{}</strong> ({}) on behalf of <strong>{}</strong></p>\n",
        escape_html(request.representative_name),
        escape_html(request.representative_email),
        escape_html(request.company_name),
    ));
    html.push_str(&format!(
        "<p>Accepted at: {}</p>\n",
        request.accepted_at.to_rfc3339()
    ));
    if let Some(origin_ip) = request.origin_ip {
        html.push_str(&format!(
            "<p>Origin address: {}</p>\n",
            escape_html(origin_ip)
        ));
    }

    if let Some(data_uri) = signature_data_uri(request.signature_png) {
        html.push_str(&format!(
            "<img class=\"signature\" alt=\"Signature\" src=\"{data_uri}\">\n"
        ));
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// Validate the captured signature and turn it into a data URI.
///
/// Returns None when the payload is absent, empty or not valid base64; the
/// caller omits the image block in that case.
fn signature_data_uri(signature_png: Option<&str>) -> Option<String> {
    let raw = signature_png?.trim();
    if raw.is_empty() {
        tracing::warn!("Captured signature is empty; rendering without image");
        return None;
    }

    match Base64::decode_vec(raw) {
        Ok(bytes) if !bytes.is_empty() => Some(format!("data:image/png;base64,{raw}")),
        _ => {
            tracing::warn!("Captured signature is not valid base64; rendering without image");
            None
        }
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use std::env;
    use std::fs;

    fn test_storage() -> FileStorage {
        let test_dir = env::temp_dir().join(format!("test-documents-{}", uuid::Uuid::new_v4()));
        let paths = StoragePaths::new(&test_dir);
        let mut storage = FileStorage::new(paths);
        storage.initialize().expect("Failed to initialize");
        storage
    }

    fn cleanup(storage: &FileStorage) {
        let _ = fs::remove_dir_all(storage.paths().root());
    }

    fn request<'a>(signature: Option<&'a str>) -> RenderRequest<'a> {
        RenderRequest {
            account_id: "acct-1",
            representative_name: "Jane Doe",
            representative_email: "jane@acme.test",
            company_name: "Acme Equipment",
            accepted_at: Utc::now(),
            origin_ip: Some("203.0.113.9"),
            signature_png: signature,
            agreement_text: "Clause one.\n\nClause two.",
        }
    }

    #[test]
    fn render_stores_html_and_metadata() {
        let storage = test_storage();
        let generator = DocumentGenerator::new(&storage);

        // "sig" as base64 PNG stand-in
        let document = generator.render(&request(Some("c2ln"))).unwrap();
        assert!(document.id.starts_with("nda-"));
        assert_eq!(document.account_id, "acct-1");

        let meta = generator.get(&document.id).unwrap();
        assert_eq!(meta, document);

        let html = generator.read_html(&document.id).unwrap();
        assert!(html.contains("Jane Doe"));
        assert!(html.contains("jane@acme.test"));
        assert!(html.contains("Acme Equipment"));
        assert!(html.contains("203.0.113.9"));
        assert!(html.contains("Clause one."));
        assert!(html.contains("data:image/png;base64,c2ln"));

        cleanup(&storage);
    }

    #[test]
    fn missing_origin_omits_the_address_line() {
        let storage = test_storage();
        let generator = DocumentGenerator::new(&storage);

        let mut req = request(None);
        req.origin_ip = None;
        let document = generator.render(&req).unwrap();
        let html = generator.read_html(&document.id).unwrap();
        assert!(!html.contains("Origin address"));

        cleanup(&storage);
    }

    #[test]
    fn invalid_signature_renders_without_image() {
        let storage = test_storage();
        let generator = DocumentGenerator::new(&storage);

        let document = generator.render(&request(Some("not//valid!!base64"))).unwrap();
        let html = generator.read_html(&document.id).unwrap();
        assert!(!html.contains("data:image/png"));
        assert!(html.contains("Jane Doe"));

        cleanup(&storage);
    }

    #[test]
    fn empty_signature_renders_without_image() {
        let storage = test_storage();
        let generator = DocumentGenerator::new(&storage);

        let document = generator.render(&request(Some("  "))).unwrap();
        let html = generator.read_html(&document.id).unwrap();
        assert!(!html.contains("data:image/png"));

        cleanup(&storage);
    }

    #[test]
    fn html_is_escaped() {
        let storage = test_storage();
        let generator = DocumentGenerator::new(&storage);

        let mut req = request(None);
        req.company_name = "Acme <Equipment> & Sons";
        let document = generator.render(&req).unwrap();
        let html = generator.read_html(&document.id).unwrap();
        assert!(html.contains("Acme &lt;Equipment&gt; &amp; Sons"));

        cleanup(&storage);
    }

    #[test]
    fn unknown_document_is_not_found() {
        let storage = test_storage();
        let generator = DocumentGenerator::new(&storage);

        assert!(matches!(
            generator.get("nda-nope"),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            generator.read_html("nda-nope"),
            Err(StorageError::NotFound(_))
        ));

        cleanup(&storage);
    }
}
