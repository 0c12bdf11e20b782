//! Plain GET retrieval of templates and the version manifest.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{url} answered HTTP {code}")]
    Status { url: String, code: u16 },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// Something that can fetch a text resource.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Result<String, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self(url)
    }
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Blocking HTTP client. Non-2xx answers are errors.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        log::info!("fetching {url}");
        match self.agent.get(url).call() {
            Ok(response) => response.into_string().map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(ureq::Error::Status(code, _)) => Err(FetchError::Status {
                url: url.to_string(),
                code,
            }),
            Err(ureq::Error::Transport(transport)) => Err(FetchError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_act_as_fetchers() {
        let fetcher = |url: &str| -> Result<String, FetchError> {
            match url {
                "mem://ok" => Ok("body".to_string()),
                _ => Err(FetchError::Status {
                    url: url.to_string(),
                    code: 404,
                }),
            }
        };
        assert_eq!(fetcher.fetch("mem://ok").unwrap(), "body");
        let err = fetcher.fetch("mem://gone").unwrap_err();
        assert_eq!(err.to_string(), "mem://gone answered HTTP 404");
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let fetcher = HttpFetcher::new(Duration::from_millis(200));
        let err = fetcher.fetch("http://127.0.0.1:9/manifest.txt").unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
