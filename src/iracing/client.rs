use std::time::Duration;

use serde_json::{json, Value};
use serenity::async_trait;
use tokio::{sync::Semaphore, time::sleep};
use tracing::{info, warn};

use super::{
    auth::hash_password,
    error::ApiError,
    model::{DriverInfo, RaceSession, SessionResults},
};

const DEFAULT_BASE_URL: &str = "https://members-ng.iracing.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_SNIPPET_LEN: usize = 200;

/// Backoff schedule for transient API failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following failed attempt `attempt` (0-based):
    /// base doubled per attempt, capped, plus up to 10% jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(20);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        delay + delay.mul_f64(rand::random::<f64>() * 0.1)
    }
}

/// The read side of the Data API, split out so services can run against a
/// stub in tests.
#[async_trait]
pub trait IracingApi: Send + Sync {
    async fn search_recent_sessions(
        &self,
        cust_id: i64,
        start_time_epoch_s: i64,
        end_time_epoch_s: i64,
    ) -> Result<Vec<RaceSession>, ApiError>;

    async fn get_subsession_results(&self, subsession_id: i64)
        -> Result<SessionResults, ApiError>;

    async fn lookup_driver(&self, query: &str) -> Result<Vec<DriverInfo>, ApiError>;
}

/// iRacing Data API client with the 2-step link/download fetch pattern.
///
/// Authentication relies on the cookie jar: `login` primes the session
/// cookies and every later request reuses them.
pub struct IracingClient {
    http: reqwest::Client,
    email: String,
    password_hash: String,
    base_url: String,
    semaphore: Semaphore,
    policy: RetryPolicy,
}

impl IracingClient {
    pub fn new(email: &str, password: &str, password_hashed: bool, concurrency: usize) -> Self {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("couldn't build the http client");

        Self {
            http,
            email: email.to_owned(),
            password_hash: hash_password(password, email, password_hashed),
            base_url: DEFAULT_BASE_URL.to_owned(),
            semaphore: Semaphore::new(concurrency.max(1)),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Authenticate and prime the session cookies.
    pub async fn login(&self) -> Result<(), ApiError> {
        let url = format!("{}/auth", self.base_url);
        let _permit = self.semaphore.acquire().await.expect("semaphore closed");

        let response = self
            .http
            .post(&url)
            .json(&json!({ "email": self.email, "password": self.password_hash }))
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 200 {
            info!("iRacing login successful");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status("auth", status, &body))
    }

    /// GET `/data/<path>?...` which answers `{"link": ...}`, then GET the
    /// link for the JSON payload. A body without a link is the payload
    /// itself. Transient failures retry with exponential backoff, an
    /// expired session triggers one re-login.
    pub async fn fetch_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let mut attempts = 0u32;
        let mut reauthed = false;

        loop {
            attempts += 1;
            match self.fetch_once(path, params).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempts < self.policy.max_attempts => {
                    warn!(path, attempts, %err, "retrying API request");
                    sleep(self.policy.delay_for(attempts - 1)).await;
                }
                Err(ApiError::AuthExpired) if !reauthed => {
                    reauthed = true;
                    warn!(path, "session expired, logging in again");
                    self.login().await?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_once(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}/data/{}", self.base_url, path);
        let body = self.get_checked(path, &url, Some(params)).await?;
        let data: Value =
            serde_json::from_str(&body).map_err(|source| ApiError::MalformedResponse {
                path: path.to_owned(),
                source,
            })?;

        let Some(link) = data.get("link").and_then(Value::as_str) else {
            return Ok(data);
        };

        let body = self.get_checked(path, link, None).await?;
        serde_json::from_str(&body).map_err(|source| ApiError::MalformedResponse {
            path: path.to_owned(),
            source,
        })
    }

    async fn get_checked(
        &self,
        path: &str,
        url: &str,
        params: Option<&[(&str, String)]>,
    ) -> Result<String, ApiError> {
        let _permit = self.semaphore.acquire().await.expect("semaphore closed");

        let mut request = self.http.get(url);
        if let Some(params) = params {
            request = request.query(params);
        }
        let response = request.send().await?;

        let status = response.status().as_u16();
        if status == 200 {
            return Ok(response.text().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(path, status, &body))
    }
}

fn classify_status(path: &str, status: u16, body: &str) -> ApiError {
    match status {
        429 => ApiError::RateLimited,
        500.. => ApiError::ServerError(status),
        401 | 403 => ApiError::AuthExpired,
        404 => ApiError::NotFound(path.to_owned()),
        _ => ApiError::Request {
            path: path.to_owned(),
            status,
            body: body.chars().take(BODY_SNIPPET_LEN).collect(),
        },
    }
}

#[async_trait]
impl IracingApi for IracingClient {
    /// Query `results/search` for finished race sessions of `cust_id`
    /// inside the window.
    async fn search_recent_sessions(
        &self,
        cust_id: i64,
        start_time_epoch_s: i64,
        end_time_epoch_s: i64,
    ) -> Result<Vec<RaceSession>, ApiError> {
        let params = [
            ("cust_id", cust_id.to_string()),
            ("start_time", start_time_epoch_s.to_string()),
            ("end_time", end_time_epoch_s.to_string()),
            ("simsession_type", "1".to_owned()),
            ("results_only", "true".to_owned()),
            ("page_size", "50".to_owned()),
        ];

        let data = match self.fetch_json("results/search", &params).await {
            Err(ApiError::NotFound(_)) => return Ok(Vec::new()),
            other => other?,
        };

        let mut sessions = Vec::new();
        if let Some(items) = data.get("sessions").and_then(Value::as_array) {
            for item in items {
                // The search already asks for races; drop anything else that
                // slips through (practice/qualify rows carry another type).
                if item
                    .get("simsession_type")
                    .and_then(Value::as_i64)
                    .unwrap_or(1)
                    != 1
                {
                    continue;
                }
                match serde_json::from_value::<RaceSession>(item.clone()) {
                    Ok(session) => sessions.push(session),
                    Err(err) => warn!(%err, "skipping unparsable session row"),
                }
            }
        }

        Ok(sessions)
    }

    async fn get_subsession_results(
        &self,
        subsession_id: i64,
    ) -> Result<SessionResults, ApiError> {
        let params = [("subsession_id", subsession_id.to_string())];
        let data = self.fetch_json("results/get", &params).await?;

        serde_json::from_value(data).map_err(|source| ApiError::MalformedResponse {
            path: "results/get".to_owned(),
            source,
        })
    }

    async fn lookup_driver(&self, query: &str) -> Result<Vec<DriverInfo>, ApiError> {
        let params = [
            ("search", query.to_owned()),
            ("page_size", "5".to_owned()),
        ];

        let data = match self.fetch_json("lookup/drivers", &params).await {
            Err(ApiError::NotFound(_)) => return Ok(Vec::new()),
            other => other?,
        };

        let mut drivers = Vec::new();
        if let Some(items) = data.get("drivers").and_then(Value::as_array) {
            for item in items {
                match serde_json::from_value::<DriverInfo>(item.clone()) {
                    Ok(driver) => drivers.push(driver),
                    Err(err) => warn!(%err, "skipping unparsable driver row"),
                }
            }
        }

        Ok(drivers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        };

        for (attempt, expected_s) in [(0u32, 1u64), (1, 2), (2, 4), (3, 8), (4, 16)] {
            let delay = policy.delay_for(attempt);
            let expected = Duration::from_secs(expected_s);
            assert!(delay >= expected, "attempt {attempt}: {delay:?}");
            assert!(delay <= expected.mul_f64(1.1), "attempt {attempt}: {delay:?}");
        }

        // Far past the doubling range the cap holds.
        let capped = policy.delay_for(12);
        assert!(capped >= Duration::from_secs(60));
        assert!(capped <= Duration::from_secs(66));
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status("results/get", 429, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            classify_status("results/get", 503, ""),
            ApiError::ServerError(503)
        ));
        assert!(matches!(
            classify_status("results/get", 401, ""),
            ApiError::AuthExpired
        ));
        assert!(matches!(
            classify_status("results/get", 403, ""),
            ApiError::AuthExpired
        ));
        assert!(matches!(
            classify_status("results/get", 404, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            classify_status("results/get", 418, "teapot"),
            ApiError::Request { status: 418, .. }
        ));
    }

    #[test]
    fn transient_errors_are_flagged() {
        assert!(ApiError::RateLimited.is_transient());
        assert!(ApiError::ServerError(502).is_transient());
        assert!(!ApiError::AuthExpired.is_transient());
        assert!(!ApiError::NotFound("x".to_owned()).is_transient());
    }
}
