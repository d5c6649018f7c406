//! Collection health summary.

use artfill_shared::{ArtworkRecord, Result, UrlField};
use artfill_storage::Storage;

/// Record counts plus one sample record.
#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub total: u64,
    /// Records with both URL fields set.
    pub complete: u64,
    pub missing_image_url: u64,
    pub missing_artwork_url: u64,
    pub sample: Option<ArtworkRecord>,
}

pub async fn collect_stats(storage: &Storage) -> Result<CollectionStats> {
    Ok(CollectionStats {
        total: storage.count_artworks().await?,
        complete: storage.count_complete().await?,
        missing_image_url: storage.count_missing(UrlField::ImageUrl).await?,
        missing_artwork_url: storage.count_missing(UrlField::ArtworkUrl).await?,
        sample: storage.sample_artwork().await?,
    })
}
