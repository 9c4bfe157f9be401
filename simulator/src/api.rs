use crate::{Error, Simulator};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State as AxumState,
    },
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use casino_execution::{casino::GameError, IdentityError, WalletError};
use casino_types::{
    api::{AmountRequest, Credentials, ErrorResponse, RaceRequest, RouletteRequest, Update},
    casino::Track,
};
use commonware_codec::Encode;
use commonware_utils::from_hex;
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tower_http::cors::{Any, CorsLayer};

pub struct Api {
    simulator: Arc<Simulator>,
}

impl Api {
    pub fn new(simulator: Arc<Simulator>) -> Self {
        Self { simulator }
    }

    pub fn router(&self) -> Router {
        // Configure CORS
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/balance", get(balance))
            .route("/wallet/deposit", post(deposit))
            .route("/blackjack/deal", post(blackjack_deal))
            .route("/blackjack/hit", post(blackjack_hit))
            .route("/blackjack/stand", post(blackjack_stand))
            .route("/slots/spin", post(slots_spin))
            .route("/roulette/spin", post(roulette_spin))
            .route("/scratch/new", post(scratch_new))
            .route("/scratch/reveal/:index", post(scratch_reveal))
            .route("/scratch/end", post(scratch_end))
            .route("/race/field", get(race_field))
            .route("/race", post(race))
            .route("/updates/:token", get(updates_ws))
            .layer(cors)
            .with_state(self.simulator.clone())
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownSession => StatusCode::UNAUTHORIZED,
            Self::InvalidAmount => StatusCode::BAD_REQUEST,
            Self::Identity(err) => match err {
                IdentityError::EmailInUse => StatusCode::CONFLICT,
                IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                IdentityError::InvalidEmail | IdentityError::WeakPassword { .. } => {
                    StatusCode::BAD_REQUEST
                }
                IdentityError::Wallet(err) => wallet_status(err),
                IdentityError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::Game(err) => match err {
                GameError::Wallet(err) => wallet_status(err),
                GameError::RoundInProgress | GameError::NoActiveRound | GameError::RoundComplete => {
                    StatusCode::CONFLICT
                }
                GameError::DeckExhausted => StatusCode::INTERNAL_SERVER_ERROR,
                GameError::InvalidWager
                | GameError::InvalidBet
                | GameError::TooManyBets { .. }
                | GameError::EmptySlip
                | GameError::InvalidCell(_)
                | GameError::CellRevealed(_) => StatusCode::BAD_REQUEST,
            },
            Self::Wallet(err) => wallet_status(err),
        }
    }
}

fn wallet_status(err: &WalletError) -> StatusCode {
    match err {
        WalletError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        WalletError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
        WalletError::InvalidAmount => StatusCode::BAD_REQUEST,
        WalletError::MissingLedger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        WalletError::Contended | WalletError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        // Backing-service failures are reported generically
        let error = if self.is_unavailable() {
            tracing::warn!(error = %self, "backing service failure");
            "service unavailable".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Session token from an `Authorization: Bearer <token>` header.
fn bearer(headers: &HeaderMap) -> Result<String, Error> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(Error::UnknownSession)
}

async fn register(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, Error> {
    let session = simulator
        .register(&credentials.email, &credentials.password)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn login(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, Error> {
    let session = simulator
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(session))
}

async fn logout(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Error> {
    simulator.logout(&bearer(&headers)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn balance(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(simulator.balance(&bearer(&headers)?).await?))
}

async fn deposit(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Json(request): Json<AmountRequest>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(
        simulator
            .deposit(&bearer(&headers)?, request.amount)
            .await?,
    ))
}

async fn blackjack_deal(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Json(request): Json<AmountRequest>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(
        simulator
            .blackjack_deal(&bearer(&headers)?, request.amount)
            .await?,
    ))
}

async fn blackjack_hit(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(simulator.blackjack_hit(&bearer(&headers)?).await?))
}

async fn blackjack_stand(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(simulator.blackjack_stand(&bearer(&headers)?).await?))
}

async fn slots_spin(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Json(request): Json<AmountRequest>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(
        simulator
            .slots_spin(&bearer(&headers)?, request.amount)
            .await?,
    ))
}

async fn roulette_spin(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Json(request): Json<RouletteRequest>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(
        simulator
            .roulette_spin(&bearer(&headers)?, &request)
            .await?,
    ))
}

async fn scratch_new(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Json(request): Json<AmountRequest>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(
        simulator
            .scratch_new(&bearer(&headers)?, request.amount)
            .await?,
    ))
}

async fn scratch_reveal(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(
        simulator
            .scratch_reveal(&bearer(&headers)?, index)
            .await?,
    ))
}

async fn scratch_end(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(simulator.scratch_end(&bearer(&headers)?).await?))
}

#[derive(Deserialize)]
struct FieldQuery {
    track: Track,
}

async fn race_field(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Query(query): Query<FieldQuery>,
) -> impl IntoResponse {
    Json(simulator.race_field(query.track))
}

async fn race(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Json(request): Json<RaceRequest>,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(simulator.race(&bearer(&headers)?, &request).await?))
}

async fn updates_ws(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Path(token): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    if from_hex(&token).is_none() {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match simulator.subscribe(&token) {
        Ok((credits, updates)) => {
            ws.on_upgrade(move |socket| handle_updates_ws(socket, credits, updates))
        }
        Err(err) => err.into_response(),
    }
}

async fn send_update(sender: &mut SplitSink<WebSocket, Message>, update: Update) -> bool {
    sender
        .send(Message::Binary(update.encode().to_vec()))
        .await
        .is_ok()
}

async fn handle_updates_ws(
    socket: WebSocket,
    mut credits: watch::Receiver<u64>,
    mut updates: broadcast::Receiver<Update>,
) {
    tracing::info!("Updates WebSocket connected");
    let (mut sender, mut receiver) = socket.split();

    // Start with the current balance
    let current = *credits.borrow_and_update();
    if !send_update(&mut sender, Update::Credits(current)).await {
        tracing::warn!("Failed to send initial balance, client disconnected");
        return;
    }

    let mut balance_open = true;
    loop {
        tokio::select! {
            // Handle incoming WebSocket messages (ping/pong/close)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Client closed WebSocket connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            tracing::warn!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error: {:?}", e);
                        break;
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        break;
                    }
                    _ => {} // Ignore other message types
                }
            }
            // Handle committed balance changes
            changed = credits.changed(), if balance_open => {
                if changed.is_err() {
                    tracing::debug!("Balance feed closed");
                    balance_open = false;
                    continue;
                }
                let balance = *credits.borrow_and_update();
                if !send_update(&mut sender, Update::Credits(balance)).await {
                    tracing::warn!("Failed to send balance, client disconnected");
                    break;
                }
            }
            // Handle round updates
            update_result = updates.recv() => {
                match update_result {
                    Ok(update) => {
                        let signed_out = update == Update::SignedOut;
                        if !send_update(&mut sender, update).await {
                            tracing::warn!("Failed to send update, client disconnected");
                            break;
                        }
                        if signed_out {
                            tracing::info!("Session closed");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "WebSocket client lagged behind, skipped {} messages",
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Broadcast channel closed");
                        break;
                    }
                }
            }
        }
    }
    tracing::info!("Updates WebSocket handler exiting");
    let _ = sender.close().await;
}
