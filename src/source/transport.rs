use crate::error::{Result, StatsError};
use std::io::Read;
use std::time::Duration;

/// A fetched page: status, body and the `rel="next"` cursor if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
    pub next: Option<String>,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    /// Issue an anonymous GET. Non-2xx responses are returned as pages; only
    /// transport failures are errors.
    fn get(&self, url: &str) -> Result<Page>;

    /// GET against the GitHub REST API, carrying the token when one is set.
    fn get_api(&self, url: &str) -> Result<Page> {
        self.get(url)
    }
}

pub struct UreqTransport {
    agent: ureq::Agent,
    token: Option<String>,
}

impl UreqTransport {
    pub fn new(token: Option<String>, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn fetch(&self, request: ureq::Request, url: &str) -> Result<Page> {
        let response = match request.call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(err)) => {
                return Err(StatsError::SourceUnavailable(format!("request to {url} failed: {err}")));
            }
        };

        let status = response.status();
        let next = response.header("link").and_then(crate::util::next_link);
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| StatsError::SourceUnavailable(format!("failed reading {url}: {e}")))?;

        tracing::debug!(url, status, has_next = next.is_some(), "fetched page");
        Ok(Page { status, body, next })
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<Page> {
        self.fetch(self.agent.get(url), url)
    }

    fn get_api(&self, url: &str) -> Result<Page> {
        let mut request = self.agent.get(url).set("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        self.fetch(request, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one `200` response with `body` and hand back the request head, lower-cased.
    fn serve_once(body: Vec<u8>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/stats/theme", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                head.push(line.to_ascii_lowercase());
            }
            let header = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len());
            stream.write_all(header.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
            head
        });
        (url, handle)
    }

    fn transport() -> UreqTransport {
        UreqTransport::new(Some("ghp_secret".into()), Some(Duration::from_secs(5)))
    }

    #[test]
    fn plain_get_never_sends_the_token() {
        let (url, handle) = serve_once(b"{}".to_vec());
        let page = transport().get(&url).unwrap();
        let head = handle.join().unwrap();

        assert_eq!(page.body, "{}");
        assert!(head.iter().all(|h| !h.starts_with("authorization:")), "{head:?}");
        assert!(head.iter().all(|h| !h.contains("ghp_secret")), "{head:?}");
    }

    #[test]
    fn api_get_sends_bearer_token() {
        let (url, handle) = serve_once(b"{}".to_vec());
        let page = transport().get_api(&url).unwrap();
        let head = handle.join().unwrap();

        assert!(page.is_success());
        assert!(head.contains(&"authorization: bearer ghp_secret".to_string()), "{head:?}");
        assert!(head.contains(&"accept: application/vnd.github+json".to_string()), "{head:?}");
    }

    #[test]
    fn large_manifests_are_read_whole() {
        let body = format!("\"{}\"", "x".repeat(11 * 1024 * 1024)).into_bytes();
        let expected = body.len();
        let (url, handle) = serve_once(body);
        let page = transport().get(&url).unwrap();
        handle.join().unwrap();
        assert_eq!(page.body.len(), expected);
    }

    #[test]
    fn blank_token_is_dropped() {
        let (url, handle) = serve_once(b"{}".to_vec());
        UreqTransport::new(Some("  ".into()), None).get_api(&url).unwrap();
        let head = handle.join().unwrap();
        assert!(head.iter().all(|h| !h.starts_with("authorization:")), "{head:?}");
    }
}
