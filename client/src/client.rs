use crate::{events::Stream, Error, Result};
use casino_types::{
    api::{
        AmountRequest, BalanceResponse, BetRequest, BlackjackView, Credentials, ErrorResponse,
        RaceFieldResponse, RaceRequest, RaceView, RouletteRequest, RouletteView, ScratchView,
        SessionResponse, SlotsView, Update,
    },
    casino::{Driver, Track},
    Principal,
};
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    sync::{Arc, RwLock},
    time::Duration,
};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tracing::{debug, info};
use url::Url;

/// Timeout for connections and requests
const TIMEOUT: Duration = Duration::from_secs(30);

/// Retry policy for transient HTTP failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request (including the first attempt).
    pub max_attempts: usize,
    /// Initial backoff delay after the first retryable failure.
    pub initial_backoff: Duration,
    /// Maximum backoff delay between attempts.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

#[derive(Clone, Debug)]
struct Signed {
    token: String,
    principal: Principal,
}

/// Casino API client
///
/// Clones share the signed-in session.
#[derive(Clone)]
pub struct Client {
    pub base_url: Url,
    pub ws_url: Url,
    pub http_client: HttpClient,

    session: Arc<RwLock<Option<Signed>>>,
    retry_policy: RetryPolicy,
}

impl Client {
    /// Create a new client
    #[allow(clippy::result_large_err)]
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;

        // Convert http(s) to ws(s) for WebSocket URL
        let ws_scheme = match base_url.scheme() {
            "http" => "ws",
            "https" => "wss",
            scheme => {
                return Err(Error::InvalidScheme(scheme.to_string()));
            }
        };

        let mut ws_url = base_url.clone();
        ws_url
            .set_scheme(ws_scheme)
            .map_err(|_| Error::InvalidScheme(ws_scheme.to_string()))?;

        let http_client = HttpClient::builder()
            .timeout(TIMEOUT)
            .pool_max_idle_per_host(100)
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            ws_url,
            http_client,
            session: Arc::new(RwLock::new(None)),
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Returns a new client with the provided retry policy.
    ///
    /// Only `GET` requests are retried.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Signed-in principal, if any.
    pub fn principal(&self) -> Option<Principal> {
        self.session
            .read()
            .ok()
            .and_then(|session| session.as_ref().map(|s| s.principal.clone()))
    }

    /// Session token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.session
            .read()
            .ok()
            .and_then(|session| session.as_ref().map(|s| s.token.clone()))
    }

    fn require_token(&self) -> Result<String> {
        self.token().ok_or(Error::NotSignedIn)
    }

    fn store_session(&self, session: Option<Signed>) {
        if let Ok(mut current) = self.session.write() {
            *current = session;
        }
    }

    async fn send_with_retry(
        &self,
        method: Method,
        make_request: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let max_attempts = if method == Method::GET {
            self.retry_policy.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 0usize;
        let mut backoff = self.retry_policy.initial_backoff;
        loop {
            attempt += 1;
            match make_request().send().await {
                Ok(response) => {
                    if !is_retryable_status(response.status()) || attempt >= max_attempts {
                        return Ok(response);
                    }
                }
                Err(err) => {
                    if attempt >= max_attempts || !is_retryable_error(&err) {
                        return Err(Error::Reqwest(err));
                    }
                }
            }

            if backoff > Duration::ZERO {
                sleep(backoff).await;
                backoff = std::cmp::min(backoff.saturating_mul(2), self.retry_policy.max_backoff);
            }
        }
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        let token = self.token();
        debug!(%method, %url, "sending request");
        let response = self
            .send_with_retry(method.clone(), || {
                let mut request = self.http_client.request(method.clone(), url.clone());
                if let Some(token) = &token {
                    request = request.bearer_auth(token);
                }
                if let Some(body) = body {
                    request = request.json(body);
                }
                request
            })
            .await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    fn signed_in(&self, session: SessionResponse) -> SessionResponse {
        info!(principal = %session.principal.id, "signed in");
        self.store_session(Some(Signed {
            token: session.token.clone(),
            principal: session.principal.clone(),
        }));
        session
    }

    /// Create an account and sign in to it.
    pub async fn register(&self, email: &str, password: &str) -> Result<SessionResponse> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = self.post("register", &credentials).await?;
        Ok(self.signed_in(session))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionResponse> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = self.post("login", &credentials).await?;
        Ok(self.signed_in(session))
    }

    pub async fn logout(&self) -> Result<()> {
        let token = self.require_token()?;
        let url = self.base_url.join("logout")?;
        let response = self
            .send_with_retry(Method::POST, || {
                self.http_client.post(url.clone()).bearer_auth(&token)
            })
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        self.store_session(None);
        info!("signed out");
        Ok(())
    }

    pub async fn balance(&self) -> Result<u64> {
        self.require_token()?;
        let balance: BalanceResponse = self.get("balance").await?;
        Ok(balance.credits)
    }

    pub async fn deposit(&self, amount: f64) -> Result<u64> {
        self.require_token()?;
        let balance: BalanceResponse = self
            .post("wallet/deposit", &AmountRequest { amount })
            .await?;
        Ok(balance.credits)
    }

    pub async fn blackjack_deal(&self, amount: f64) -> Result<BlackjackView> {
        self.require_token()?;
        self.post("blackjack/deal", &AmountRequest { amount }).await
    }

    pub async fn blackjack_hit(&self) -> Result<BlackjackView> {
        self.require_token()?;
        self.post("blackjack/hit", &()).await
    }

    pub async fn blackjack_stand(&self) -> Result<BlackjackView> {
        self.require_token()?;
        self.post("blackjack/stand", &()).await
    }

    pub async fn slots_spin(&self, amount: f64) -> Result<SlotsView> {
        self.require_token()?;
        self.post("slots/spin", &AmountRequest { amount }).await
    }

    pub async fn roulette_spin(&self, bets: Vec<BetRequest>) -> Result<RouletteView> {
        self.require_token()?;
        self.post("roulette/spin", &RouletteRequest { bets }).await
    }

    pub async fn scratch_new(&self, amount: f64) -> Result<ScratchView> {
        self.require_token()?;
        self.post("scratch/new", &AmountRequest { amount }).await
    }

    pub async fn scratch_reveal(&self, index: usize) -> Result<ScratchView> {
        self.require_token()?;
        self.post(&format!("scratch/reveal/{index}"), &()).await
    }

    /// Discard the current card; returns the balance.
    pub async fn scratch_end(&self) -> Result<u64> {
        self.require_token()?;
        let balance: BalanceResponse = self.post("scratch/end", &()).await?;
        Ok(balance.credits)
    }

    pub async fn race_field(&self, track: Track) -> Result<RaceFieldResponse> {
        let track = serde_json::to_value(track)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();
        self.get(&format!("race/field?track={track}")).await
    }

    pub async fn race(&self, track: Track, driver: Driver, amount: f64) -> Result<RaceView> {
        self.require_token()?;
        self.post(
            "race",
            &RaceRequest {
                track,
                driver,
                amount,
            },
        )
        .await
    }

    /// Connect to the balance and settlement feed of the signed-in session.
    pub async fn connect_updates(&self) -> Result<Stream<Update>> {
        self.connect_updates_with_capacity(0).await
    }

    /// Connect to the update feed with a configurable channel capacity.
    ///
    /// A `channel_capacity` of `0` uses the default capacity.
    pub async fn connect_updates_with_capacity(
        &self,
        channel_capacity: usize,
    ) -> Result<Stream<Update>> {
        let token = self.require_token()?;
        let ws_url = self.ws_url.join(&format!("updates/{token}"))?;
        info!(ws_url = %ws_url, "Connecting to updates WebSocket");

        let (ws_stream, _) = timeout(TIMEOUT, connect_async(ws_url.as_str()))
            .await
            .map_err(|_| Error::DialTimeout)??;
        info!("WebSocket connected");

        Ok(Stream::new_with_capacity(ws_stream, channel_capacity))
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    Ok(response.json().await?)
}

async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => Error::Api {
            status,
            message: body.error,
        },
        Err(_) => Error::Failed(status),
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
