use crate::error::{Result, StatsError};
use crate::model::EntityKind;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_REPOSITORY: &str = "obsidianmd/obsidian-releases";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_THEME_STATS_URL: &str = "https://releases.obsidian.md/stats/theme";
pub const DEFAULT_BASE_COLOR: &str = "#773ee9";
pub const DEFAULT_TOP_N: [usize; 9] = [0, 20, 50, 100, 200, 500, 700, 1000, 1200];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FileFormat {
    #[default]
    Json,
    Csv,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Csv => "csv",
        }
    }

    /// The given format first, then the remaining one.
    pub fn preferring(self) -> [FileFormat; 2] {
        match self {
            FileFormat::Json => [FileFormat::Json, FileFormat::Csv],
            FileFormat::Csv => [FileFormat::Csv, FileFormat::Json],
        }
    }
}

/// Everything a run needs, resolved once and passed into each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub raw_base: String,
    pub repository: String,
    pub branch: String,
    pub theme_stats_url: String,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
    pub data_dir: PathBuf,
    pub format: FileFormat,
    pub base_color: String,
    pub top_n: Vec<usize>,
    pub headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            theme_stats_url: DEFAULT_THEME_STATS_URL.to_string(),
            token: None,
            timeout: Some(Duration::from_secs(30)),
            data_dir: PathBuf::from("."),
            format: FileFormat::Json,
            base_color: DEFAULT_BASE_COLOR.to_string(),
            top_n: DEFAULT_TOP_N.to_vec(),
            headless: false,
        }
    }
}

/// Per-kind paths and payload fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSettings {
    pub kind: EntityKind,
    pub save_dir: PathBuf,
    /// Manifest tracked in the commit history; `None` for releases.
    pub manifest_path: Option<&'static str>,
    pub latest_url: String,
    /// Numeric attribute summed into the metric series and used for rankings.
    pub metric_field: Option<&'static str>,
    /// Persisted name of the counts series; `None` for releases.
    pub counts_series: Option<&'static str>,
    /// Persisted name of the metric series, when the kind tracks one.
    pub metric_series: Option<&'static str>,
    pub snapshot_prefix: &'static str,
    /// Value column of the dated latest-stats file; releases write per-platform columns instead.
    pub snapshot_header: Option<&'static str>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !self.repository.contains('/') {
            return Err(StatsError::InvalidConfig(format!(
                "repository must be owner/name, got '{}'",
                self.repository
            )));
        }
        crate::chart::parse_hex_color(&self.base_color)?;
        if self.top_n.is_empty() {
            return Err(StatsError::InvalidConfig("top-n thresholds must not be empty".into()));
        }
        Ok(())
    }

    pub fn commits_url(&self, manifest: &str) -> String {
        format!(
            "{}/repos/{}/commits?path={manifest}&per_page=100",
            self.api_base.trim_end_matches('/'),
            self.repository
        )
    }

    pub fn raw_file_url(&self, reference: &str, manifest: &str) -> String {
        format!(
            "{}/{}/{reference}/{manifest}",
            self.raw_base.trim_end_matches('/'),
            self.repository
        )
    }

    pub fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/releases",
            self.api_base.trim_end_matches('/'),
            self.repository
        )
    }

    pub fn kind(&self, kind: EntityKind) -> KindSettings {
        match kind {
            EntityKind::Plugins => {
                let manifest = "community-plugin-stats.json";
                KindSettings {
                    kind,
                    save_dir: self.data_dir.join("saved_plugins"),
                    manifest_path: Some(manifest),
                    latest_url: self.raw_file_url(&self.branch, manifest),
                    metric_field: Some("downloads"),
                    counts_series: Some("plugin_counts"),
                    metric_series: Some("plugin_downloads"),
                    snapshot_prefix: "plugins",
                    snapshot_header: Some("Downloads"),
                }
            }
            EntityKind::Themes => KindSettings {
                kind,
                save_dir: self.data_dir.join("saved_themes"),
                manifest_path: Some("community-css-themes.json"),
                latest_url: self.theme_stats_url.clone(),
                metric_field: Some("download"),
                counts_series: Some("theme_counts"),
                metric_series: None,
                snapshot_prefix: "themes",
                snapshot_header: Some("Download"),
            },
            EntityKind::Releases => KindSettings {
                kind,
                save_dir: self.data_dir.join("saved_releases"),
                manifest_path: None,
                latest_url: self.releases_url(),
                metric_field: None,
                counts_series: None,
                metric_series: None,
                snapshot_prefix: "releases",
                snapshot_header: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn urls_are_built_from_bases() {
        let config = Config {
            api_base: "http://localhost:9999/".into(),
            ..Config::default()
        };
        assert_eq!(
            config.commits_url("community-plugin-stats.json"),
            "http://localhost:9999/repos/obsidianmd/obsidian-releases/commits?path=community-plugin-stats.json&per_page=100"
        );
        assert_eq!(
            config.kind(EntityKind::Plugins).latest_url,
            "https://raw.githubusercontent.com/obsidianmd/obsidian-releases/master/community-plugin-stats.json"
        );
    }

    #[test]
    fn save_dirs_live_under_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/stats"),
            ..Config::default()
        };
        assert_eq!(config.kind(EntityKind::Themes).save_dir, PathBuf::from("/tmp/stats/saved_themes"));
        assert_eq!(config.kind(EntityKind::Themes).metric_series, None);
        assert_eq!(config.kind(EntityKind::Plugins).metric_series, Some("plugin_downloads"));
        assert_eq!(
            config.kind(EntityKind::Releases).latest_url,
            "https://api.github.com/repos/obsidianmd/obsidian-releases/releases"
        );
    }

    #[test]
    fn validate_rejects_bad_color_and_repo() {
        let bad_color = Config { base_color: "purple".into(), ..Config::default() };
        assert!(bad_color.validate().is_err());
        let bad_repo = Config { repository: "obsidian".into(), ..Config::default() };
        assert!(bad_repo.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }
}
