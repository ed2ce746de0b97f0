use crate::model::{empty_platform_counts, Platform, PlatformCounts, ReleaseRecord};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ReleasePayload {
    pub tag_name: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<AssetPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetPayload {
    pub name: String,
    pub download_count: u64,
}

/// Map an asset file name to the platform it ships for. Update bundles
/// (`*.asar.gz`) belong to no platform.
pub fn classify_asset(name: &str) -> Option<Platform> {
    if name.ends_with("asar.gz") {
        None
    } else if name.ends_with("dmg") {
        Some(Platform::MacOS)
    } else if name.ends_with("exe") {
        Some(Platform::Windows)
    } else {
        Some(Platform::Linux)
    }
}

pub fn platform_downloads(assets: &[AssetPayload]) -> PlatformCounts {
    let mut counts = empty_platform_counts();
    for asset in assets {
        if let Some(platform) = classify_asset(&asset.name) {
            *counts.entry(platform).or_insert(0) += asset.download_count;
        }
    }
    counts
}

/// Published releases sorted oldest first. Drafts carry no publish date and are dropped.
pub fn records_from_payload(payload: Vec<ReleasePayload>) -> Vec<ReleaseRecord> {
    let mut records: Vec<ReleaseRecord> = payload
        .into_iter()
        .filter_map(|release| {
            let Some(published) = release.published_at else {
                tracing::debug!(tag = %release.tag_name, "skipping unpublished release");
                return None;
            };
            Some(ReleaseRecord {
                downloads: platform_downloads(&release.assets),
                version: release.tag_name,
                published_at: published.date_naive(),
            })
        })
        .collect();
    records.sort_by(|a, b| a.published_at.cmp(&b.published_at));
    records
}
