use super::{parse_next_link, Request, Response, Transport};
use crate::config::SparkConfig;
use crate::error::{Result, SparkError};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const TOO_MANY_REQUESTS: u16 = 429;

/// How long to back off after a 429, and how many times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Used when the response carries no usable `Retry-After` header.
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            default_delay: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retries_so_far + 1`, or `None` once the
    /// budget is spent.
    pub fn delay(&self, retries_so_far: u32, retry_after: Option<&str>) -> Option<Duration> {
        if retries_so_far >= self.max_retries {
            return None;
        }
        let delay = retry_after
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default_delay);
        Some(delay)
    }

    /// Drive `send` until it returns something other than a 429, sleeping
    /// between attempts. `send` returns a response and its raw `Retry-After`.
    pub fn run<F, S>(&self, mut send: F, mut sleep: S) -> Result<Response>
    where
        F: FnMut() -> Result<(Response, Option<String>)>,
        S: FnMut(Duration),
    {
        let mut retries = 0;
        loop {
            let (response, retry_after) = send()?;
            if response.status != TOO_MANY_REQUESTS {
                return Ok(response);
            }
            match self.delay(retries, retry_after.as_deref()) {
                Some(delay) => {
                    warn!(
                        "Received a 429 Response. Backing off for {}s",
                        delay.as_secs()
                    );
                    sleep(delay);
                    retries += 1;
                }
                None => {
                    return Err(SparkError::RateLimited {
                        attempts: retries + 1,
                    })
                }
            }
        }
    }
}

/// Production transport: blocking HTTP on a shared `ureq` agent.
pub struct HttpTransport {
    agent: ureq::Agent,
    token: String,
    base: Url,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(token: impl Into<String>, api_base: &str, timeout: Duration) -> Result<Self> {
        let mut base = api_base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|e| SparkError::Config(format!("invalid api base {}: {}", api_base, e)))?;
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            agent,
            token: token.into(),
            base,
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &SparkConfig) -> Result<Self> {
        let token = config.token.clone().ok_or_else(|| {
            SparkError::Config("no API token: set SPARK_TOKEN or `token` in sparkly.toml".into())
        })?;
        let transport = Self::new(
            token,
            &config.api_base,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(transport.with_retry_policy(RetryPolicy {
            max_retries: config.max_rate_limit_retries,
            default_delay: Duration::from_secs(config.default_retry_after_secs),
        }))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URLs pass through untouched; anything else is joined onto
    /// the API base.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        let resolved = if url.starts_with("https://") || url.starts_with("http://") {
            Url::parse(url)
        } else {
            self.base.join(url.trim_start_matches('/'))
        };
        resolved.map_err(|e| SparkError::Transport(format!("bad url {}: {}", url, e)))
    }

    /// One round trip. Returns the response and its raw `Retry-After`.
    fn send_once(&self, request: &Request, url: &Url) -> Result<(Response, Option<String>)> {
        debug!("Sending {} to {}", request.method, url);

        let mut call = self
            .agent
            .request(request.method.as_str(), url.as_str())
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/json");
        for (key, value) in &request.query {
            call = call.query(key, value);
        }

        let result = match &request.body {
            Some(body) => call
                .set("Content-Type", "application/json; charset=utf-8")
                .send_string(&body.to_string()),
            None => call.call(),
        };

        // 4xx/5xx are ordinary responses here; callers decide what they mean.
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(e)) => return Err(SparkError::Transport(e.to_string())),
        };

        let status = response.status();
        let retry_after = response.header("Retry-After").map(str::to_string);
        let next_link = response.header("Link").and_then(parse_next_link);
        let body = response.into_string()?;

        Ok((
            Response::new(status, body).with_next_link(next_link),
            retry_after,
        ))
    }
}

impl Transport for HttpTransport {
    fn request(&self, request: &Request) -> Result<Response> {
        let url = self.resolve(&request.url)?;
        self.retry
            .run(|| self.send_once(request, &url), std::thread::sleep)
    }
}
