//! Catalog data model.
//!
//! A [`CatalogEntry`] is the metadata record for one shared file. Entries are
//! immutable once stored: there is no update path, only insert and bulk delete.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::error::{Error, Result};

// =============================================================================
// FILE TYPES
// =============================================================================

/// Category tag of a cataloged file.
///
/// Used as an exact-match filter by find, count, delete, and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Document,
    Video,
    Audio,
    Photo,
    Animation,
    Voice,
    VideoNote,
    Sticker,
}

impl FileType {
    /// All known file types, in declaration order.
    pub const ALL: [FileType; 8] = [
        FileType::Document,
        FileType::Video,
        FileType::Audio,
        FileType::Photo,
        FileType::Animation,
        FileType::Voice,
        FileType::VideoNote,
        FileType::Sticker,
    ];

    /// The tag stored in documents for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Photo => "photo",
            Self::Animation => "animation",
            Self::Voice => "voice",
            Self::VideoNote => "video_note",
            Self::Sticker => "sticker",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "document" => Ok(Self::Document),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "photo" => Ok(Self::Photo),
            "animation" => Ok(Self::Animation),
            "voice" => Ok(Self::Voice),
            "video_note" | "videonote" => Ok(Self::VideoNote),
            "sticker" => Ok(Self::Sticker),
            _ => Err(format!("Invalid file type: {}", s)),
        }
    }
}

// =============================================================================
// CATALOG ENTRY
// =============================================================================

/// Metadata record for a single file.
///
/// `file_id` is the primary key of the stored document. Every other field is
/// optional; absent fields are omitted from the stored document and read back
/// as `None`. Unknown document keys are ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Globally unique file identifier.
    pub file_id: String,
    /// Opaque token used to re-fetch the file from its origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<String>,
    /// Human-readable label, the field search matches against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl CatalogEntry {
    /// Create an entry with only its identifier set.
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            file_ref: None,
            file_name: None,
            file_size: None,
            file_type: None,
            mime_type: None,
            caption: None,
        }
    }

    /// Set the opaque re-fetch reference.
    pub fn with_file_ref(mut self, file_ref: impl Into<String>) -> Self {
        self.file_ref = Some(file_ref.into());
        self
    }

    /// Set the display name that searches match against.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the size in bytes.
    pub fn with_file_size(mut self, file_size: i64) -> Self {
        self.file_size = Some(file_size);
        self
    }

    /// Set the file category.
    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    /// Set the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Check that the entry can be persisted.
    ///
    /// An entry without a usable `file_id` has no primary key and is rejected.
    pub fn validate(&self) -> Result<()> {
        if self.file_id.trim().is_empty() {
            return Err(Error::InvalidInput("file_id cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Encode the entry as the document stored in the collection.
    pub fn to_document(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a stored document.
    pub fn from_document(doc: JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(doc)?)
    }

    /// Decode a document read as part of a multi-entry result.
    ///
    /// A document that no longer decodes (e.g. an unknown `file_type` tag)
    /// is logged by key and skipped, so it cannot fail every page it lands on.
    pub fn decode_or_skip(file_id: &str, doc: JsonValue) -> Option<Self> {
        match Self::from_document(doc) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    subsystem = "catalog",
                    op = "decode",
                    file_id = %file_id,
                    error = %e,
                    "Skipping undecodable stored document"
                );
                None
            }
        }
    }
}

// =============================================================================
// WRITE OUTCOMES
// =============================================================================

/// Result of saving a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new document was written.
    Inserted,
    /// A document with the same `file_id` already existed and was left untouched.
    Duplicate,
}

impl SaveOutcome {
    /// `true` when the entry was inserted, `false` for a duplicate.
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Totals for a batch save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub inserted: u64,
    pub duplicates: u64,
}

impl SaveSummary {
    pub fn record(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Inserted => self.inserted += 1,
            SaveOutcome::Duplicate => self.duplicates += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.inserted + self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_or_skip_drops_unknown_file_type() {
        let bad = json!({"file_id": "x", "file_type": "hologram"});
        assert!(CatalogEntry::from_document(bad.clone()).is_err());
        assert_eq!(CatalogEntry::decode_or_skip("x", bad), None);

        let good = json!({"file_id": "y", "file_type": "video"});
        assert_eq!(
            CatalogEntry::decode_or_skip("y", good),
            Some(CatalogEntry::new("y").with_file_type(FileType::Video))
        );
    }

    #[test]
    fn test_file_type_round_trips_through_str() {
        for ft in FileType::ALL {
            let parsed: FileType = ft.to_string().parse().unwrap();
            assert_eq!(parsed, ft);
        }
    }

    #[test]
    fn test_file_type_parse_is_case_insensitive() {
        assert_eq!("VIDEO".parse::<FileType>().unwrap(), FileType::Video);
        assert_eq!("Video-Note".parse::<FileType>().unwrap(), FileType::VideoNote);
        assert!("spreadsheet".parse::<FileType>().is_err());
    }

    #[test]
    fn test_absent_fields_are_omitted_from_document() {
        let entry = CatalogEntry::new("abc").with_file_name("The.Matrix.1999.mkv");
        let doc = entry.to_document().unwrap();

        assert_eq!(doc, json!({"file_id": "abc", "file_name": "The.Matrix.1999.mkv"}));
    }

    #[test]
    fn test_full_document_shape() {
        let entry = CatalogEntry::new("abc")
            .with_file_ref("ref-1")
            .with_file_name("report.pdf")
            .with_file_size(2048)
            .with_file_type(FileType::Document)
            .with_mime_type("application/pdf")
            .with_caption("Q3 report");

        assert_eq!(
            entry.to_document().unwrap(),
            json!({
                "file_id": "abc",
                "file_ref": "ref-1",
                "file_name": "report.pdf",
                "file_size": 2048,
                "file_type": "document",
                "mime_type": "application/pdf",
                "caption": "Q3 report"
            })
        );
    }

    #[test]
    fn test_null_and_missing_fields_read_back_as_absent() {
        let entry =
            CatalogEntry::from_document(json!({"file_id": "abc", "file_name": null})).unwrap();
        assert_eq!(entry, CatalogEntry::new("abc"));
    }

    #[test]
    fn test_unknown_document_keys_are_ignored() {
        let entry = CatalogEntry::from_document(json!({
            "file_id": "abc",
            "file_type": "video",
            "legacy_field": 42
        }))
        .unwrap();
        assert_eq!(entry.file_type, Some(FileType::Video));
    }

    #[test]
    fn test_unknown_file_type_is_rejected() {
        let result = CatalogEntry::from_document(json!({"file_id": "abc", "file_type": "hologram"}));
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_document_without_file_id_is_rejected() {
        let result = CatalogEntry::from_document(json!({"file_name": "orphan.mkv"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_blank_file_id() {
        assert!(CatalogEntry::new("").validate().is_err());
        assert!(CatalogEntry::new("   ").validate().is_err());
        assert!(CatalogEntry::new("BQACAgQ").validate().is_ok());
    }

    #[test]
    fn test_save_summary_counts_outcomes() {
        let mut summary = SaveSummary::default();
        summary.record(SaveOutcome::Inserted);
        summary.record(SaveOutcome::Duplicate);
        summary.record(SaveOutcome::Inserted);

        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.total(), 3);
        assert!(SaveOutcome::Inserted.is_inserted());
        assert!(!SaveOutcome::Duplicate.is_inserted());
    }
}
