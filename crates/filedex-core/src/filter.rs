//! Field-equality filters over catalog entries.
//!
//! An [`EntryFilter`] constrains any subset of the entry fields to an exact
//! value. Unset fields do not constrain; the empty filter matches every entry.
//! Filters are typed, so a filter can never name a field the catalog does not
//! know about.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::{CatalogEntry, FileType};

/// Exact-match filter over [`CatalogEntry`] fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl EntryFilter {
    /// Filter matching every entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// Shorthand for a filter on `file_type` only.
    pub fn by_type(file_type: FileType) -> Self {
        Self::default().file_type(file_type)
    }

    /// Require an exact `file_id`.
    pub fn file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }

    /// Require an exact `file_ref`.
    pub fn file_ref(mut self, file_ref: impl Into<String>) -> Self {
        self.file_ref = Some(file_ref.into());
        self
    }

    /// Require an exact `file_name` (no substring matching; use search for that).
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Require an exact size in bytes.
    pub fn file_size(mut self, file_size: i64) -> Self {
        self.file_size = Some(file_size);
        self
    }

    /// Require a file category.
    pub fn file_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    /// Require an exact MIME type.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Require an exact caption.
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Returns true if no field is constrained.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Render the filter as a JSON object suitable for document containment
    /// (`doc @> filter`). Field names and value encodings match the stored
    /// document exactly.
    pub fn to_containment(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    /// Evaluate the filter against an entry.
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        fn eq<T: PartialEq>(want: &Option<T>, have: &Option<T>) -> bool {
            match want {
                None => true,
                Some(w) => have.as_ref() == Some(w),
            }
        }

        self.file_id.as_ref().map_or(true, |id| id == &entry.file_id)
            && eq(&self.file_ref, &entry.file_ref)
            && eq(&self.file_name, &entry.file_name)
            && eq(&self.file_size, &entry.file_size)
            && eq(&self.file_type, &entry.file_type)
            && eq(&self.mime_type, &entry.mime_type)
            && eq(&self.caption, &entry.caption)
    }
}
