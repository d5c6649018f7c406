//! Import artwork documents from a JSON export into the store.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, instrument};

use artfill_shared::{ArtfillError, ArtworkId, ArtworkRecord, Result};
use artfill_storage::Storage;

/// One document from an export. Unknown keys are ignored. When both `_id`
/// and `id` are present, `_id` wins.
#[derive(Debug, Deserialize)]
struct SeedDocument {
    #[serde(default, rename = "_id")]
    mongo_id: Option<ArtworkId>,
    #[serde(default)]
    id: Option<ArtworkId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artwork_url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl SeedDocument {
    fn into_record(self) -> ArtworkRecord {
        ArtworkRecord {
            id: self
                .mongo_id
                .filter(|id| !id.as_str().is_empty())
                .or(self.id)
                .filter(|id| !id.as_str().is_empty())
                .unwrap_or_else(ArtworkId::generate),
            name: self.name,
            artwork_url: blank_to_none(self.artwork_url),
            image_url: blank_to_none(self.image_url),
            updated_at: None,
        }
    }
}

/// Blank URLs count as missing so the fill jobs pick them up.
fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Documents read from the input.
    pub read: usize,
    /// Documents inserted as new records.
    pub inserted: usize,
    /// Documents whose id was already present.
    pub existing: usize,
}

/// Import a JSON array of artwork documents from `path`.
pub async fn seed_from_path(storage: &Storage, path: &Path) -> Result<SeedReport> {
    let content = std::fs::read_to_string(path).map_err(|e| ArtfillError::io(path, e))?;
    seed_from_str(storage, &content).await
}

/// Import a JSON array of artwork documents.
#[instrument(skip_all)]
pub async fn seed_from_str(storage: &Storage, json: &str) -> Result<SeedReport> {
    let docs: Vec<SeedDocument> = serde_json::from_str(json)
        .map_err(|e| ArtfillError::parse(format!("invalid artwork export: {e}")))?;

    let mut report = SeedReport {
        read: docs.len(),
        ..SeedReport::default()
    };

    for doc in docs {
        let record = doc.into_record();
        if storage.insert_artwork(&record).await? {
            report.inserted += 1;
        } else {
            report.existing += 1;
        }
    }

    info!(
        read = report.read,
        inserted = report.inserted,
        existing = report.existing,
        "seed completed"
    );
    Ok(report)
}
