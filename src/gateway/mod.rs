//! Typed access to the EventHub REST API.
//!
//! [`Gateway`] has one method per backend resource action. [`HttpGateway`] is
//! the `reqwest` implementation; every failure it reports carries a single
//! human-readable message extracted by [`envelope`].

pub(crate) mod auth;
pub(crate) mod envelope;
pub(crate) mod events;
#[cfg(test)]
pub(crate) mod fake;
pub(crate) mod participations;
pub(crate) mod scoring;

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::model::*;

/// Backend operations used by the store and session.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn list_events(&self) -> Result<Vec<RawEvent>>;
    async fn get_event(&self, id: EventId) -> Result<RawEvent>;
    /// Returns the id assigned by the backend.
    async fn create_event(&self, payload: &EventPayload) -> Result<EventId>;
    async fn update_event(&self, id: EventId, payload: &EventPayload) -> Result<()>;
    async fn delete_event(&self, id: EventId) -> Result<()>;
    async fn add_media(&self, event_id: EventId, payload: &MediaPayload) -> Result<()>;
    async fn delete_media(&self, event_id: EventId, media_id: MediaId) -> Result<()>;
    /// Returns the id assigned by the backend.
    async fn add_activity(&self, event_id: EventId, payload: &ActivityPayload)
        -> Result<ActivityId>;
    async fn update_activity(&self, activity_id: ActivityId, payload: &ActivityPayload)
        -> Result<()>;
    async fn delete_activity(&self, activity_id: ActivityId) -> Result<()>;

    async fn list_participations(&self, event_id: EventId) -> Result<Vec<Participation>>;
    async fn create_participation(
        &self,
        event_id: EventId,
        payload: &NewParticipation,
    ) -> Result<Participation>;
    async fn join_team(&self, participation_id: ParticipationId) -> Result<()>;
    async fn delete_participation(&self, participation_id: ParticipationId) -> Result<()>;
    /// Leave a team (own id) or kick a member (captain only).
    async fn remove_member(&self, participation_id: ParticipationId, user_id: &str) -> Result<()>;
    async fn transfer_captaincy(
        &self,
        participation_id: ParticipationId,
        user_id: &str,
    ) -> Result<()>;
    async fn upload_participation_avatar(
        &self,
        participation_id: ParticipationId,
        file: Upload,
    ) -> Result<Participation>;
    async fn my_participations(&self) -> Result<Vec<Participation>>;

    async fn add_score(&self, payload: &ScorePayload) -> Result<()>;
    async fn leaderboard(&self, event_id: EventId) -> Result<Vec<LeaderboardEntry>>;
    async fn list_judges(&self, event_id: EventId) -> Result<Vec<User>>;
    async fn add_judge(&self, event_id: EventId, user_id: &str) -> Result<()>;

    async fn register(&self, request: &RegisterRequest) -> Result<User>;
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse>;
    async fn me(&self) -> Result<User>;
    async fn update_me(&self, update: &ProfileUpdate) -> Result<User>;
    async fn update_password(&self, update: &PasswordUpdate) -> Result<()>;
    async fn upload_avatar(&self, file: Upload) -> Result<User>;

    /// Set or clear the bearer token sent with subsequent requests.
    fn set_token(&self, token: Option<String>);
}

/// [`Gateway`] over HTTPS using [`reqwest`].
pub struct HttpGateway {
    http: reqwest::Client,
    config: ClientConfig,
    token: RwLock<Option<String>>,
}

pub(crate) enum Body {
    Empty,
    Json(Vec<u8>),
    Multipart(reqwest::multipart::Form),
}

impl HttpGateway {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Use the provided [`reqwest::Client`], e.g. one configured with timeouts
    /// or proxies.
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            http: client,
            config,
            token: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn token(&self) -> Option<String> {
        self.token
            .read()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Issue a request and return the body of a successful response.
    pub(crate) async fn send(&self, method: Method, path: &str, body: Body) -> Result<String> {
        let url = self.config.endpoint(path);
        debug!(%method, %url, "sending request");

        let mut request = self.http.request(method, &url);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        request = match body {
            Body::Empty => request,
            Body::Json(bytes) => request.header(CONTENT_TYPE, "application/json").body(bytes),
            Body::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await.map_err(|e| ApiError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let fallback = status.canonical_reason().unwrap_or("request failed");
            return Err(ApiError::Status {
                message: envelope::extract_message(&text, fallback),
                url,
                status,
            });
        }

        Ok(text)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.send(Method::GET, path, Body::Empty).await?;
        decode(path, &body)
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &B,
    ) -> Result<String> {
        let bytes = serde_json::to_vec(payload)?;
        self.send(method, path, Body::Json(bytes)).await
    }

    /// Call a legacy write endpoint answering `{"ok": bool, ...}`.
    pub(crate) async fn send_checked(
        &self,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<OkEnvelope> {
        let text = self.send(method, path, body).await?;
        check_ok(path, &text)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_events(&self) -> Result<Vec<RawEvent>> {
        events::list_events(self).await
    }

    async fn get_event(&self, id: EventId) -> Result<RawEvent> {
        events::get_event(self, id).await
    }

    async fn create_event(&self, payload: &EventPayload) -> Result<EventId> {
        events::create_event(self, payload).await
    }

    async fn update_event(&self, id: EventId, payload: &EventPayload) -> Result<()> {
        events::update_event(self, id, payload).await
    }

    async fn delete_event(&self, id: EventId) -> Result<()> {
        events::delete_event(self, id).await
    }

    async fn add_media(&self, event_id: EventId, payload: &MediaPayload) -> Result<()> {
        events::add_media(self, event_id, payload).await
    }

    async fn delete_media(&self, event_id: EventId, media_id: MediaId) -> Result<()> {
        events::delete_media(self, event_id, media_id).await
    }

    async fn add_activity(
        &self,
        event_id: EventId,
        payload: &ActivityPayload,
    ) -> Result<ActivityId> {
        events::add_activity(self, event_id, payload).await
    }

    async fn update_activity(
        &self,
        activity_id: ActivityId,
        payload: &ActivityPayload,
    ) -> Result<()> {
        events::update_activity(self, activity_id, payload).await
    }

    async fn delete_activity(&self, activity_id: ActivityId) -> Result<()> {
        events::delete_activity(self, activity_id).await
    }

    async fn list_participations(&self, event_id: EventId) -> Result<Vec<Participation>> {
        participations::list_participations(self, event_id).await
    }

    async fn create_participation(
        &self,
        event_id: EventId,
        payload: &NewParticipation,
    ) -> Result<Participation> {
        participations::create_participation(self, event_id, payload).await
    }

    async fn join_team(&self, participation_id: ParticipationId) -> Result<()> {
        participations::join_team(self, participation_id).await
    }

    async fn delete_participation(&self, participation_id: ParticipationId) -> Result<()> {
        participations::delete_participation(self, participation_id).await
    }

    async fn remove_member(&self, participation_id: ParticipationId, user_id: &str) -> Result<()> {
        participations::remove_member(self, participation_id, user_id).await
    }

    async fn transfer_captaincy(
        &self,
        participation_id: ParticipationId,
        user_id: &str,
    ) -> Result<()> {
        participations::transfer_captaincy(self, participation_id, user_id).await
    }

    async fn upload_participation_avatar(
        &self,
        participation_id: ParticipationId,
        file: Upload,
    ) -> Result<Participation> {
        participations::upload_avatar(self, participation_id, file).await
    }

    async fn my_participations(&self) -> Result<Vec<Participation>> {
        participations::my_participations(self).await
    }

    async fn add_score(&self, payload: &ScorePayload) -> Result<()> {
        scoring::add_score(self, payload).await
    }

    async fn leaderboard(&self, event_id: EventId) -> Result<Vec<LeaderboardEntry>> {
        scoring::leaderboard(self, event_id).await
    }

    async fn list_judges(&self, event_id: EventId) -> Result<Vec<User>> {
        scoring::list_judges(self, event_id).await
    }

    async fn add_judge(&self, event_id: EventId, user_id: &str) -> Result<()> {
        scoring::add_judge(self, event_id, user_id).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User> {
        auth::register(self, request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse> {
        auth::login(self, request).await
    }

    async fn me(&self) -> Result<User> {
        auth::me(self).await
    }

    async fn update_me(&self, update: &ProfileUpdate) -> Result<User> {
        auth::update_me(self, update).await
    }

    async fn update_password(&self, update: &PasswordUpdate) -> Result<()> {
        auth::update_password(self, update).await
    }

    async fn upload_avatar(&self, file: Upload) -> Result<User> {
        auth::upload_avatar(self, file).await
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: path.to_string(),
        source,
    })
}

/// Interpret a legacy `{"ok": bool}` body. An empty body counts as success.
pub(crate) fn check_ok(path: &str, body: &str) -> Result<OkEnvelope> {
    if body.trim().is_empty() {
        return Ok(OkEnvelope::default());
    }
    let reply: OkEnvelope = decode(path, body)?;
    if reply.ok == Some(false) {
        return Err(ApiError::Rejected {
            url: path.to_string(),
            message: envelope::extract_message(body, "request was rejected by the server"),
        });
    }
    Ok(reply)
}

/// Build the multipart form used by avatar uploads.
pub(crate) fn upload_form(file: Upload) -> Result<reqwest::multipart::Form> {
    let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
    if let Some(mime) = file.mime {
        part = part.mime_str(&mime).map_err(|e| ApiError::Transport {
            url: String::new(),
            message: e.to_string(),
        })?;
    }
    Ok(reqwest::multipart::Form::new().part("file", part))
}
