use crate::config::{FileFormat, KindSettings};
use crate::error::{Result, StatsError};
use crate::model::{EntitySnapshot, MonthKey, MonthlyMetricSeries, Platform, ReleaseRecord};
use crate::util::{csv_field, date_stamp, split_csv_line};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File-backed persistence for one entity kind's save directory.
///
/// Series live at `monthly_{name}.{ext}`, snapshots at `{prefix}_{YYYY-MM-DD}.{ext}`.
/// Writing the same name twice on one day overwrites the earlier file.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_kind(settings: &KindSettings) -> Self {
        Self::new(settings.save_dir.clone())
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn series_path(&self, name: &str, format: FileFormat) -> PathBuf {
        self.dir.join(format!("monthly_{name}.{}", format.extension()))
    }

    pub fn snapshot_path(&self, prefix: &str, date: NaiveDate, format: FileFormat) -> PathBuf {
        self.dir
            .join(format!("{prefix}_{}.{}", date_stamp(date), format.extension()))
    }

    pub fn save_series(
        &self,
        name: &str,
        label: &str,
        series: &MonthlyMetricSeries,
        format: FileFormat,
    ) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.series_path(name, format);
        let contents = match format {
            FileFormat::Json => to_pretty_json(series)?,
            FileFormat::Csv => {
                let mut out = format!("Month,{}\n", csv_field(label));
                for (month, value) in series {
                    out.push_str(&format!("{month},{value}\n"));
                }
                out
            }
        };
        write_file(&path, &contents)?;
        tracing::info!(path = %path.display(), months = series.len(), "saved monthly series");
        Ok(path)
    }

    /// `Ok(None)` when nothing was saved under `name` yet.
    pub fn load_series(&self, name: &str, format: FileFormat) -> Result<Option<MonthlyMetricSeries>> {
        let path = self.series_path(name, format);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let raw: Vec<(String, u64)> = match format {
            FileFormat::Json => {
                let map: BTreeMap<String, u64> = serde_json::from_str(&contents).map_err(|e| {
                    StatsError::MalformedResponse(format!("{}: {e}", path.display()))
                })?;
                map.into_iter().collect()
            }
            FileFormat::Csv => contents
                .lines()
                .skip(1)
                .filter(|line| !line.trim().is_empty())
                .map(|line| parse_series_row(line, &path))
                .collect::<Result<_>>()?,
        };

        let mut series = MonthlyMetricSeries::new();
        for (month, value) in raw {
            series.insert(MonthKey::parse(&month)?, value);
        }
        Ok(Some(series))
    }

    /// Load `name` in `preferred` format, or in the other format when only
    /// that one was saved. Returns the path that was read.
    pub fn load_series_any(
        &self,
        name: &str,
        preferred: FileFormat,
    ) -> Result<Option<(MonthlyMetricSeries, PathBuf)>> {
        for format in preferred.preferring() {
            if let Some(series) = self.load_series(name, format)? {
                return Ok(Some((series, self.series_path(name, format))));
            }
        }
        Ok(None)
    }

    /// Write the snapshot sorted by value, largest first.
    pub fn save_snapshot(
        &self,
        prefix: &str,
        header: &str,
        field: &str,
        snapshot: &EntitySnapshot,
        date: NaiveDate,
        format: FileFormat,
    ) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.snapshot_path(prefix, date, format);
        let sorted = snapshot.sorted_desc();
        let contents = match format {
            FileFormat::Json => {
                let mut map = Map::new();
                for entry in sorted {
                    let mut attrs = Map::new();
                    attrs.insert(field.to_string(), Value::from(entry.value));
                    map.insert(entry.name.clone(), Value::Object(attrs));
                }
                to_pretty_json(&map)?
            }
            FileFormat::Csv => {
                let mut out = format!("Name,{}\n", csv_field(header));
                for entry in sorted {
                    out.push_str(&format!("{},{}\n", csv_field(&entry.name), entry.value));
                }
                out
            }
        };
        write_file(&path, &contents)?;
        tracing::info!(path = %path.display(), entities = snapshot.len(), "saved latest snapshot");
        Ok(path)
    }

    pub fn save_releases(
        &self,
        prefix: &str,
        records: &[ReleaseRecord],
        date: NaiveDate,
        format: FileFormat,
    ) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.snapshot_path(prefix, date, format);
        let contents = match format {
            FileFormat::Json => to_pretty_json(&records)?,
            FileFormat::Csv => {
                let mut out = String::from("version,published_at");
                for platform in Platform::ALL {
                    out.push(',');
                    out.push_str(platform.as_str());
                }
                out.push('\n');
                for record in records {
                    out.push_str(&csv_field(&record.version));
                    out.push(',');
                    out.push_str(&record.published_at.to_string());
                    for platform in Platform::ALL {
                        let count = record.downloads.get(&platform).copied().unwrap_or(0);
                        out.push_str(&format!(",{count}"));
                    }
                    out.push('\n');
                }
                out
            }
        };
        write_file(&path, &contents)?;
        tracing::info!(path = %path.display(), releases = records.len(), "saved releases");
        Ok(path)
    }
}

fn parse_series_row(line: &str, path: &Path) -> Result<(String, u64)> {
    let fields = split_csv_line(line);
    match fields.as_slice() {
        [month, value] => {
            let value = value.trim().parse::<u64>().map_err(|_| {
                StatsError::MalformedResponse(format!("{}: bad value in row '{line}'", path.display()))
            })?;
            Ok((month.trim().to_string(), value))
        }
        _ => Err(StatsError::MalformedResponse(format!(
            "{}: expected two columns in row '{line}'",
            path.display()
        ))),
    }
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf)
        .map_err(|e| StatsError::MalformedResponse(format!("non UTF-8 JSON output: {e}")))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::empty_platform_counts;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn series(pairs: &[(&str, u64)]) -> MonthlyMetricSeries {
        pairs
            .iter()
            .map(|(m, v)| (MonthKey::parse(m).unwrap(), *v))
            .collect()
    }

    #[test]
    fn json_series_round_trips() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("saved_plugins"));
        let original = series(&[("2023-11", 1200), ("2023-12", 1250), ("2024-01", 1302)]);

        let path = store.save_series("plugin_counts", "Plugin Count", &original, FileFormat::Json).unwrap();
        assert!(path.ends_with("monthly_plugin_counts.json"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("    \"2023-11\": 1200"));

        let loaded = store.load_series("plugin_counts", FileFormat::Json).unwrap();
        assert_eq!(loaded, Some(original));
    }

    #[test]
    fn csv_series_round_trips() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let original = series(&[("2024-01", 10), ("2024-02", 12)]);

        store.save_series("theme_counts", "Theme Count", &original, FileFormat::Csv).unwrap();
        let text = fs::read_to_string(store.series_path("theme_counts", FileFormat::Csv)).unwrap();
        assert_eq!(text, "Month,Theme Count\n2024-01,10\n2024-02,12\n");
        assert_eq!(store.load_series("theme_counts", FileFormat::Csv).unwrap(), Some(original));
    }

    #[test]
    fn missing_series_is_none() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("nothing-here"));
        assert_eq!(store.load_series("plugin_counts", FileFormat::Json).unwrap(), None);
    }

    #[test]
    fn series_saved_in_other_format_is_found() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let original = series(&[("2024-01", 10)]);
        store.save_series("theme_counts", "Theme Count", &original, FileFormat::Csv).unwrap();

        let (loaded, path) = store.load_series_any("theme_counts", FileFormat::Json).unwrap().unwrap();
        assert_eq!(loaded, original);
        assert!(path.ends_with("monthly_theme_counts.csv"));
        assert!(store.load_series_any("plugin_counts", FileFormat::Json).unwrap().is_none());
    }

    #[test]
    fn preferred_format_wins_when_both_exist() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.save_series("theme_counts", "Theme Count", &series(&[("2024-01", 1)]), FileFormat::Csv).unwrap();
        store.save_series("theme_counts", "Theme Count", &series(&[("2024-01", 2)]), FileFormat::Json).unwrap();

        let (loaded, path) = store.load_series_any("theme_counts", FileFormat::Json).unwrap().unwrap();
        assert_eq!(loaded, series(&[("2024-01", 2)]));
        assert!(path.ends_with("monthly_theme_counts.json"));
    }

    #[test]
    fn corrupt_series_is_malformed() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        fs::write(store.series_path("plugin_counts", FileFormat::Json), "[1, 2]").unwrap();
        let err = store.load_series("plugin_counts", FileFormat::Json).unwrap_err();
        assert!(matches!(err, StatsError::MalformedResponse(_)));
    }

    #[test]
    fn snapshot_csv_is_date_stamped_and_sorted() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let snapshot = EntitySnapshot::from_pairs([("calendar", 50), ("dataview, plus", 900), ("tasks", 300)]);
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let path = store
            .save_snapshot("plugins", "Downloads", "downloads", &snapshot, date, FileFormat::Csv)
            .unwrap();
        assert!(path.ends_with("plugins_2024-06-01.csv"));
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "Name,Downloads\n\"dataview, plus\",900\ntasks,300\ncalendar,50\n");
    }

    #[test]
    fn same_day_snapshot_overwrites() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let first = EntitySnapshot::from_pairs([("a", 1)]);
        let second = EntitySnapshot::from_pairs([("b", 2)]);

        store.save_snapshot("themes", "Download", "download", &first, date, FileFormat::Json).unwrap();
        let path = store
            .save_snapshot("themes", "Download", "download", &second, date, FileFormat::Json)
            .unwrap();
        let value: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"b": {"download": 2}}));
    }

    #[test]
    fn releases_csv_has_platform_columns() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let mut downloads = empty_platform_counts();
        downloads.insert(Platform::Windows, 7);
        let records = vec![ReleaseRecord {
            version: "v1.6.0".into(),
            published_at: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            downloads,
        }];
        let date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let path = store.save_releases("releases", &records, date, FileFormat::Csv).unwrap();
        assert!(path.ends_with("releases_2024-06-04.csv"));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "version,published_at,Linux,Windows,MacOS\nv1.6.0,2024-06-03,0,7,0\n"
        );
    }
}
