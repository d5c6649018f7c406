//! Core domain types for artfill artwork records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ArtworkId
// ---------------------------------------------------------------------------

/// Opaque, immutable identifier of an artwork record.
///
/// Imported records keep whatever id they arrived with (including Mongo-style
/// `{"$oid": "..."}` ids); new records get a UUID v7.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtworkId(pub String);

impl ArtworkId {
    /// Generate a new time-sortable identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtworkId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for ArtworkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Number(i64),
            ObjectId {
                #[serde(rename = "$oid")]
                oid: String,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Plain(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
            Raw::ObjectId { oid } => Self(oid),
        })
    }
}

// ---------------------------------------------------------------------------
// ArtworkRecord
// ---------------------------------------------------------------------------

/// A single artwork document as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkRecord {
    /// Store-assigned identifier.
    #[serde(alias = "_id")]
    pub id: ArtworkId,
    /// Display name, if the source document had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// URL of the page describing the artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    /// URL of the image asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// When artfill last wrote to this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ArtworkRecord {
    /// Read one of the two URL fields.
    pub fn field(&self, field: UrlField) -> Option<&str> {
        match field {
            UrlField::ArtworkUrl => self.artwork_url.as_deref(),
            UrlField::ImageUrl => self.image_url.as_deref(),
        }
    }

    /// Label used in log lines: the name when present, otherwise the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

// ---------------------------------------------------------------------------
// UrlField / FillDirection
// ---------------------------------------------------------------------------

/// One of the two URL columns on an artwork record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlField {
    ArtworkUrl,
    ImageUrl,
}

impl UrlField {
    /// Column name in the store. Only these two literals ever reach SQL.
    pub fn column(self) -> &'static str {
        match self {
            Self::ArtworkUrl => "artwork_url",
            Self::ImageUrl => "image_url",
        }
    }

    /// The other URL field.
    pub fn other(self) -> Self {
        match self {
            Self::ArtworkUrl => Self::ImageUrl,
            Self::ImageUrl => Self::ArtworkUrl,
        }
    }
}

impl std::fmt::Display for UrlField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Which field a fill job populates. The page to scrape comes from the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillDirection {
    /// Read `artwork_url`, write `image_url`.
    ImageUrl,
    /// Read `image_url`, write `artwork_url`.
    ArtworkUrl,
}

impl FillDirection {
    /// Field that gets written.
    pub fn target(self) -> UrlField {
        match self {
            Self::ImageUrl => UrlField::ImageUrl,
            Self::ArtworkUrl => UrlField::ArtworkUrl,
        }
    }

    /// Field whose URL gets fetched.
    pub fn source(self) -> UrlField {
        self.target().other()
    }
}

impl std::fmt::Display for FillDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source(), self.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sources_are_swapped() {
        assert_eq!(FillDirection::ImageUrl.source(), UrlField::ArtworkUrl);
        assert_eq!(FillDirection::ImageUrl.target(), UrlField::ImageUrl);
        assert_eq!(FillDirection::ArtworkUrl.source(), UrlField::ImageUrl);
        assert_eq!(FillDirection::ArtworkUrl.target(), UrlField::ArtworkUrl);
        assert_eq!(
            FillDirection::ImageUrl.to_string(),
            "artwork_url -> image_url"
        );
    }

    #[test]
    fn record_accepts_mongo_export() {
        let json = r#"{
            "_id": {"$oid": "66b0c2f1a7e4d93b1c2d3e4f"},
            "name": "Mural on 5th",
            "artwork_url": "https://streetartcities.com/markers/abc",
            "location": {"coordinates": [4.9, 52.3]}
        }"#;
        let record: ArtworkRecord = serde_json::from_str(json).expect("parse record");
        assert_eq!(record.id.as_str(), "66b0c2f1a7e4d93b1c2d3e4f");
        assert_eq!(record.label(), "Mural on 5th");
        assert_eq!(
            record.field(UrlField::ArtworkUrl),
            Some("https://streetartcities.com/markers/abc")
        );
        assert_eq!(record.field(UrlField::ImageUrl), None);
    }

    #[test]
    fn record_accepts_plain_and_numeric_ids() {
        let a: ArtworkRecord = serde_json::from_str(r#"{"id": "art-1"}"#).unwrap();
        assert_eq!(a.id, ArtworkId::from("art-1"));
        assert_eq!(a.label(), "art-1");

        let b: ArtworkRecord = serde_json::from_str(r#"{"_id": 42}"#).unwrap();
        assert_eq!(b.id.as_str(), "42");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ArtworkId::generate(), ArtworkId::generate());
    }
}
