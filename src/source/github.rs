use super::transport::{Page, Transport};
use super::HistorySource;
use crate::config::Config;
use crate::error::{Result, StatsError};
use crate::model::{ChangeEvent, EntitySnapshot, ReleaseRecord};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct CommitRecord {
    sha: String,
    commit: CommitBody,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    committer: CommitPerson,
}

#[derive(Debug, Deserialize)]
struct CommitPerson {
    date: String,
}

pub struct GithubSource<T> {
    transport: T,
    config: Config,
}

impl<T: Transport> GithubSource<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            config: config.clone(),
        }
    }

    /// Follow `rel="next"` links until exhausted. Any non-2xx page discards
    /// everything gathered so far.
    fn get_all_pages<D: DeserializeOwned>(&self, url: &str) -> Result<Vec<D>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let page = self.transport.get_api(&url)?;
            ensure_success(&url, &page)?;
            let batch: Vec<D> = parse_body(&url, &page.body)?;
            pages += 1;
            items.extend(batch);
            next = page.next;
        }

        tracing::debug!(pages, items = items.len(), "pagination complete");
        Ok(items)
    }

    fn get_json(&self, url: &str) -> Result<Value> {
        let page = self.transport.get(url)?;
        ensure_success(url, &page)?;
        parse_body(url, &page.body)
    }

    /// Current per-entity statistics published at `url`.
    pub fn latest_snapshot(&self, url: &str, metric_field: Option<&str>) -> Result<EntitySnapshot> {
        let value = self.get_json(url)?;
        EntitySnapshot::from_json(&value, metric_field)
    }

    /// Release listing at `url`, an API endpoint.
    pub fn releases(&self, url: &str) -> Result<Vec<ReleaseRecord>> {
        let page = self.transport.get_api(url)?;
        ensure_success(url, &page)?;
        let payload = parse_body(url, &page.body)?;
        Ok(crate::releases::records_from_payload(payload))
    }
}

impl<T: Transport> HistorySource for GithubSource<T> {
    fn change_events(&self, manifest: &str) -> Result<Vec<ChangeEvent>> {
        let url = self.config.commits_url(manifest);
        let commits: Vec<CommitRecord> = self.get_all_pages(&url)?;
        Ok(commits
            .into_iter()
            .map(|c| ChangeEvent::new(c.commit.committer.date, c.sha))
            .collect())
    }

    fn snapshot(
        &self,
        snapshot_id: &str,
        manifest: &str,
        metric_field: Option<&str>,
    ) -> Result<EntitySnapshot> {
        let url = self.config.raw_file_url(snapshot_id, manifest);
        let value = self.get_json(&url)?;
        EntitySnapshot::from_json(&value, metric_field)
    }
}

fn ensure_success(url: &str, page: &Page) -> Result<()> {
    if page.is_success() {
        return Ok(());
    }
    let hint = match page.status {
        401 => " (check the GitHub token)",
        403 | 429 => " (rate limited or missing GitHub token)",
        _ => "",
    };
    Err(StatsError::SourceUnavailable(format!(
        "{url} returned HTTP {}{hint}",
        page.status
    )))
}

fn parse_body<D: DeserializeOwned>(url: &str, body: &str) -> Result<D> {
    serde_json::from_str(body)
        .map_err(|e| StatsError::MalformedResponse(format!("unexpected payload from {url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeTransport {
        pages: HashMap<String, Page>,
        requested: RefCell<Vec<String>>,
        authenticated: RefCell<Vec<String>>,
    }

    impl FakeTransport {
        fn with(mut self, url: &str, status: u16, body: &str, next: Option<&str>) -> Self {
            self.pages.insert(
                url.to_string(),
                Page {
                    status,
                    body: body.to_string(),
                    next: next.map(str::to_string),
                },
            );
            self
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str) -> Result<Page> {
            self.requested.borrow_mut().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| StatsError::SourceUnavailable(format!("connection refused: {url}")))
        }

        fn get_api(&self, url: &str) -> Result<Page> {
            self.authenticated.borrow_mut().push(url.to_string());
            self.get(url)
        }
    }

    fn config() -> Config {
        Config {
            api_base: "http://api.test".into(),
            raw_base: "http://raw.test".into(),
            ..Config::default()
        }
    }

    const MANIFEST: &str = "community-plugin-stats.json";

    fn commits_json(entries: &[(&str, &str)]) -> String {
        let items: Vec<Value> = entries
            .iter()
            .map(|(sha, date)| serde_json::json!({"sha": sha, "commit": {"committer": {"date": date}}}))
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    #[test]
    fn change_events_concatenate_all_pages() {
        let cfg = config();
        let first = cfg.commits_url(MANIFEST);
        let second = "http://api.test/page2";
        let transport = FakeTransport::default()
            .with(&first, 200, &commits_json(&[("c3", "2024-03-02T10:00:00Z")]), Some(second))
            .with(second, 200, &commits_json(&[("c2", "2024-02-20T10:00:00Z"), ("c1", "2024-01-05T10:00:00Z")]), None);
        let source = GithubSource::new(transport, &cfg);

        let events = source.change_events(MANIFEST).unwrap();
        assert_eq!(
            events,
            vec![
                ChangeEvent::new("2024-03-02T10:00:00Z", "c3"),
                ChangeEvent::new("2024-02-20T10:00:00Z", "c2"),
                ChangeEvent::new("2024-01-05T10:00:00Z", "c1"),
            ]
        );
        assert_eq!(source.transport.requested.borrow().len(), 2);
    }

    #[test]
    fn failing_page_discards_partial_results() {
        let cfg = config();
        let first = cfg.commits_url(MANIFEST);
        let second = "http://api.test/page2";
        let transport = FakeTransport::default()
            .with(&first, 200, &commits_json(&[("c3", "2024-03-02T10:00:00Z")]), Some(second))
            .with(second, 403, "{\"message\":\"API rate limit exceeded\"}", None);
        let source = GithubSource::new(transport, &cfg);

        let err = source.change_events(MANIFEST).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn dropped_connection_mid_listing_returns_nothing() {
        let cfg = config();
        let first = cfg.commits_url(MANIFEST);
        let second = "http://api.test/page2";
        // no page registered for `second`: the transport itself fails
        let transport = FakeTransport::default().with(
            &first,
            200,
            &commits_json(&[("c3", "2024-03-02T10:00:00Z")]),
            Some(second),
        );
        let source = GithubSource::new(transport, &cfg);

        let result = source.change_events(MANIFEST);
        assert!(matches!(result, Err(StatsError::SourceUnavailable(_))), "{result:?}");
        assert_eq!(*source.transport.requested.borrow(), vec![first, second.to_string()]);
    }

    #[test]
    fn only_api_requests_are_authenticated() {
        let cfg = config();
        let raw = cfg.raw_file_url("abc123", MANIFEST);
        let stats = "http://stats.test/theme";
        let transport = FakeTransport::default()
            .with(&cfg.commits_url(MANIFEST), 200, &commits_json(&[("abc123", "2024-03-02T10:00:00Z")]), None)
            .with(&raw, 200, "{}", None)
            .with(stats, 200, "{}", None)
            .with(&cfg.releases_url(), 200, "[]", None);
        let source = GithubSource::new(transport, &cfg);

        source.change_events(MANIFEST).unwrap();
        source.snapshot("abc123", MANIFEST, Some("downloads")).unwrap();
        source.latest_snapshot(stats, Some("download")).unwrap();
        source.releases(&cfg.releases_url()).unwrap();

        assert_eq!(
            *source.transport.authenticated.borrow(),
            vec![cfg.commits_url(MANIFEST), cfg.releases_url()]
        );
    }

    #[test]
    fn unexpected_commit_shape_is_malformed() {
        let cfg = config();
        let transport = FakeTransport::default().with(&cfg.commits_url(MANIFEST), 200, "{\"sha\":1}", None);
        let source = GithubSource::new(transport, &cfg);
        let err = source.change_events(MANIFEST).unwrap_err();
        assert!(matches!(err, StatsError::MalformedResponse(_)));
    }

    #[test]
    fn snapshot_reads_manifest_at_revision() {
        let cfg = config();
        let url = cfg.raw_file_url("abc123", MANIFEST);
        let transport = FakeTransport::default().with(
            &url,
            200,
            "{\"a\":{\"downloads\":10},\"b\":{\"downloads\":5}}",
            None,
        );
        let source = GithubSource::new(transport, &cfg);
        let snapshot = source.snapshot("abc123", MANIFEST, Some("downloads")).unwrap();
        assert_eq!(snapshot, EntitySnapshot::from_pairs([("a", 10), ("b", 5)]));
    }

    #[test]
    fn releases_are_parsed_and_sorted() {
        let cfg = config();
        let body = serde_json::json!([
            {"tag_name": "v1.5.0", "published_at": "2024-01-10T00:00:00Z", "assets": [
                {"name": "Obsidian-1.5.0.dmg", "download_count": 10},
                {"name": "Obsidian-1.5.0.exe", "download_count": 20}
            ]},
            {"tag_name": "v1.4.0", "published_at": "2023-11-01T00:00:00Z", "assets": []}
        ]);
        let transport = FakeTransport::default().with(&cfg.releases_url(), 200, &body.to_string(), None);
        let source = GithubSource::new(transport, &cfg);
        let versions: Vec<String> = source.releases(&cfg.releases_url()).unwrap().into_iter().map(|r| r.version).collect();
        assert_eq!(versions, vec!["v1.4.0".to_string(), "v1.5.0".to_string()]);
    }
}
