//! In-memory backend for store and session tests.
//!
//! Holds the "server side" state, records every call in order, and can be
//! scripted to fail or to hold a response until the test releases it.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use itertools::Itertools;
use tokio::sync::oneshot;

use crate::error::{ApiError, Result};
use crate::gateway::Gateway;
use crate::model::*;

#[derive(Default)]
struct Backend {
    events: BTreeMap<EventId, RawEvent>,
    participations: Vec<Participation>,
    scores: Vec<ScorePayload>,
    judges: BTreeMap<EventId, Vec<User>>,
    users: BTreeMap<UserId, User>,
    me: Option<User>,
    password: String,
    next_id: u64,
}

#[derive(Default)]
pub(crate) struct FakeGateway {
    backend: Mutex<Backend>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, VecDeque<String>>>,
    gates: Mutex<HashMap<String, VecDeque<oneshot::Receiver<()>>>>,
    token: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

pub(crate) fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        full_name: name.to_string(),
        email: Some(format!("{id}@example.com")),
        phone: None,
        avatar_url: None,
        height_cm: None,
        weight_kg: None,
        birthday: None,
        gender: None,
        role: Role::User,
        team: None,
    }
}

pub(crate) fn raw_event(id: EventId, title: &str, date: Option<&str>) -> RawEvent {
    RawEvent {
        id,
        title: title.to_string(),
        date: date.map(str::to_string),
        description: Some(format!("{title} description")),
        ..RawEvent::default()
    }
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        let fake = Self::default();
        {
            let mut backend = lock(&fake.backend);
            backend.next_id = 100;
            let me = user("u-1", "Ivan Ivanov");
            backend.users.insert(me.id.clone(), me.clone());
            backend.me = Some(me);
            backend.password = "secret".to_string();
        }
        fake
    }

    pub(crate) fn with_event(self, event: RawEvent) -> Self {
        lock(&self.backend).events.insert(event.id, event);
        self
    }

    pub(crate) fn with_user(self, user: User) -> Self {
        lock(&self.backend).users.insert(user.id.clone(), user);
        self
    }

    pub(crate) fn with_participation(self, participation: Participation) -> Self {
        lock(&self.backend).participations.push(participation);
        self
    }

    /// Mutate an event server-side without going through the API.
    pub(crate) fn edit_event(&self, id: EventId, edit: impl FnOnce(&mut RawEvent)) {
        if let Some(event) = lock(&self.backend).events.get_mut(&id) {
            edit(event);
        }
    }

    /// Make the next call named `op` fail with a status error carrying `message`.
    pub(crate) fn fail_next(&self, op: &str, message: &str) {
        lock(&self.failures)
            .entry(op.to_string())
            .or_default()
            .push_back(message.to_string());
    }

    /// Hold the next call named `op` after it has read backend state, until
    /// the returned sender fires (or is dropped).
    pub(crate) fn pause_next(&self, op: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.gates)
            .entry(op.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub(crate) fn count(&self, op: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.split('(').next() == Some(op))
            .count()
    }

    pub(crate) fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub(crate) fn token(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    pub(crate) fn scores(&self) -> Vec<ScorePayload> {
        lock(&self.backend).scores.clone()
    }

    fn begin(&self, op: &str, args: String) -> Result<()> {
        lock(&self.calls).push(format!("{op}({args})"));
        let failure = lock(&self.failures)
            .get_mut(op)
            .and_then(|queue| queue.pop_front());
        match failure {
            Some(message) if message == "transport" => Err(ApiError::Transport {
                url: format!("fake://{op}"),
                message: "error sending request: connection refused".to_string(),
            }),
            Some(message) => Err(ApiError::Status {
                url: format!("fake://{op}"),
                status: reqwest::StatusCode::BAD_REQUEST,
                message,
            }),
            None => Ok(()),
        }
    }

    async fn gate(&self, op: &str) {
        let gate = lock(&self.gates)
            .get_mut(op)
            .and_then(|queue| queue.pop_front());
        if let Some(rx) = gate {
            let _ = rx.await;
        }
    }

    fn next_id(&self) -> u64 {
        let mut backend = lock(&self.backend);
        backend.next_id += 1;
        backend.next_id
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            url: format!("fake://{what}"),
            status: reqwest::StatusCode::NOT_FOUND,
            message: format!("{what} not found"),
        }
    }

    fn me_or_unauthorized(&self) -> Result<User> {
        lock(&self.backend).me.clone().ok_or(ApiError::Status {
            url: "fake://users/me".to_string(),
            status: reqwest::StatusCode::UNAUTHORIZED,
            message: "Not authenticated".to_string(),
        })
    }

    fn with_participation_mut(
        &self,
        id: ParticipationId,
        edit: impl FnOnce(&mut Participation),
    ) -> Result<()> {
        let mut backend = lock(&self.backend);
        let participation = backend
            .participations
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Self::not_found("participation"))?;
        edit(participation);
        Ok(())
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn list_events(&self) -> Result<Vec<RawEvent>> {
        self.begin("list_events", String::new())?;
        let events = lock(&self.backend).events.values().cloned().collect_vec();
        self.gate("list_events").await;
        Ok(events)
    }

    async fn get_event(&self, id: EventId) -> Result<RawEvent> {
        self.begin("get_event", id.to_string())?;
        let event = lock(&self.backend).events.get(&id).cloned();
        self.gate("get_event").await;
        event.ok_or_else(|| Self::not_found("event"))
    }

    async fn create_event(&self, payload: &EventPayload) -> Result<EventId> {
        self.begin("create_event", payload.title.clone())?;
        let id = self.next_id();
        let event = RawEvent {
            id,
            title: payload.title.clone(),
            is_team: payload.is_team,
            date: payload.date.map(|d| d.to_string()),
            description: Some(payload.description.clone()),
            preview_url: payload.preview_url.clone(),
            start_time: payload.start_time,
            end_time: payload.end_time,
            max_members: payload.max_members,
            max_teams: payload.max_teams,
            ..RawEvent::default()
        };
        lock(&self.backend).events.insert(id, event);
        Ok(id)
    }

    async fn update_event(&self, id: EventId, payload: &EventPayload) -> Result<()> {
        self.begin("update_event", id.to_string())?;
        let mut backend = lock(&self.backend);
        let event = backend
            .events
            .get_mut(&id)
            .ok_or_else(|| Self::not_found("event"))?;
        event.title = payload.title.clone();
        event.is_team = payload.is_team;
        event.date = payload.date.map(|d| d.to_string());
        event.description = Some(payload.description.clone());
        event.preview_url = payload.preview_url.clone();
        event.start_time = payload.start_time;
        event.end_time = payload.end_time;
        event.max_members = payload.max_members;
        event.max_teams = payload.max_teams;
        Ok(())
    }

    async fn delete_event(&self, id: EventId) -> Result<()> {
        self.begin("delete_event", id.to_string())?;
        let mut backend = lock(&self.backend);
        backend
            .events
            .remove(&id)
            .ok_or_else(|| Self::not_found("event"))?;
        backend.participations.retain(|p| p.event_id != id);
        Ok(())
    }

    async fn add_media(&self, event_id: EventId, payload: &MediaPayload) -> Result<()> {
        self.begin("add_media", event_id.to_string())?;
        let id = self.next_id();
        let mut backend = lock(&self.backend);
        let event = backend
            .events
            .get_mut(&event_id)
            .ok_or_else(|| Self::not_found("event"))?;
        event.media.get_or_insert_with(Vec::new).push(Media {
            id,
            url: payload.url.clone(),
            media_type: payload.media_type,
            name: payload.name.clone(),
            order: payload.order,
        });
        Ok(())
    }

    async fn delete_media(&self, event_id: EventId, media_id: MediaId) -> Result<()> {
        self.begin("delete_media", format!("{event_id}, {media_id}"))?;
        let mut backend = lock(&self.backend);
        let event = backend
            .events
            .get_mut(&event_id)
            .ok_or_else(|| Self::not_found("event"))?;
        if let Some(media) = event.media.as_mut() {
            media.retain(|m| m.id != media_id);
        }
        Ok(())
    }

    async fn add_activity(
        &self,
        event_id: EventId,
        payload: &ActivityPayload,
    ) -> Result<ActivityId> {
        self.begin("add_activity", event_id.to_string())?;
        let id = self.next_id();
        let mut backend = lock(&self.backend);
        let event = backend
            .events
            .get_mut(&event_id)
            .ok_or_else(|| Self::not_found("event"))?;
        event.activities.get_or_insert_with(Vec::new).push(Activity {
            id,
            event_id: Some(event_id),
            name: payload.name.clone(),
            icon: payload.icon.clone(),
            latitude: payload.latitude,
            longitude: payload.longitude,
            is_scoreable: payload.is_scoreable,
            is_versus: payload.is_versus,
            max_score: payload.max_score,
            start_dt: payload.start_dt,
            end_dt: payload.end_dt,
        });
        Ok(id)
    }

    async fn update_activity(
        &self,
        activity_id: ActivityId,
        payload: &ActivityPayload,
    ) -> Result<()> {
        self.begin("update_activity", activity_id.to_string())?;
        let mut backend = lock(&self.backend);
        let activity = backend
            .events
            .values_mut()
            .flat_map(|e| e.activities.iter_mut().flatten())
            .find(|a| a.id == activity_id)
            .ok_or_else(|| Self::not_found("activity"))?;
        activity.name = payload.name.clone();
        activity.icon = payload.icon.clone();
        activity.is_scoreable = payload.is_scoreable;
        activity.max_score = payload.max_score;
        Ok(())
    }

    async fn delete_activity(&self, activity_id: ActivityId) -> Result<()> {
        self.begin("delete_activity", activity_id.to_string())?;
        let mut backend = lock(&self.backend);
        for event in backend.events.values_mut() {
            if let Some(activities) = event.activities.as_mut() {
                activities.retain(|a| a.id != activity_id);
            }
        }
        Ok(())
    }

    async fn list_participations(&self, event_id: EventId) -> Result<Vec<Participation>> {
        self.begin("list_participations", event_id.to_string())?;
        let participations = lock(&self.backend)
            .participations
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect_vec();
        self.gate("list_participations").await;
        Ok(participations)
    }

    async fn create_participation(
        &self,
        event_id: EventId,
        payload: &NewParticipation,
    ) -> Result<Participation> {
        self.begin("create_participation", event_id.to_string())?;
        let me = self.me_or_unauthorized()?;
        let id = self.next_id();
        let participation = Participation {
            id,
            event_id,
            participant_type: payload.participant_type,
            team_name: payload.team_name.clone(),
            team_avatar_url: None,
            creator: me.clone(),
            members: vec![me],
        };
        lock(&self.backend).participations.push(participation.clone());
        Ok(participation)
    }

    async fn join_team(&self, participation_id: ParticipationId) -> Result<()> {
        self.begin("join_team", participation_id.to_string())?;
        let me = self.me_or_unauthorized()?;
        self.with_participation_mut(participation_id, |p| p.members.push(me))
    }

    async fn delete_participation(&self, participation_id: ParticipationId) -> Result<()> {
        self.begin("delete_participation", participation_id.to_string())?;
        lock(&self.backend)
            .participations
            .retain(|p| p.id != participation_id);
        Ok(())
    }

    async fn remove_member(&self, participation_id: ParticipationId, user_id: &str) -> Result<()> {
        self.begin("remove_member", format!("{participation_id}, {user_id}"))?;
        self.with_participation_mut(participation_id, |p| {
            p.members.retain(|m| m.id != user_id)
        })
    }

    async fn transfer_captaincy(
        &self,
        participation_id: ParticipationId,
        user_id: &str,
    ) -> Result<()> {
        self.begin("transfer_captaincy", format!("{participation_id}, {user_id}"))?;
        let new_captain = lock(&self.backend)
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| Self::not_found("user"))?;
        self.with_participation_mut(participation_id, |p| p.creator = new_captain)
    }

    async fn upload_participation_avatar(
        &self,
        participation_id: ParticipationId,
        file: Upload,
    ) -> Result<Participation> {
        self.begin("upload_participation_avatar", participation_id.to_string())?;
        let url = format!("/media/teams/{}", file.file_name);
        self.with_participation_mut(participation_id, |p| p.team_avatar_url = Some(url))?;
        lock(&self.backend)
            .participations
            .iter()
            .find(|p| p.id == participation_id)
            .cloned()
            .ok_or_else(|| Self::not_found("participation"))
    }

    async fn my_participations(&self) -> Result<Vec<Participation>> {
        self.begin("my_participations", String::new())?;
        let me = self.me_or_unauthorized()?;
        Ok(lock(&self.backend)
            .participations
            .iter()
            .filter(|p| p.is_member(&me.id))
            .cloned()
            .collect_vec())
    }

    async fn add_score(&self, payload: &ScorePayload) -> Result<()> {
        self.begin("add_score", payload.participation_id.to_string())?;
        lock(&self.backend).scores.push(payload.clone());
        Ok(())
    }

    async fn leaderboard(&self, event_id: EventId) -> Result<Vec<LeaderboardEntry>> {
        self.begin("leaderboard", event_id.to_string())?;
        let backend = lock(&self.backend);
        // Ascending by participation id; the store does the ranking.
        Ok(backend
            .participations
            .iter()
            .filter(|p| p.event_id == event_id)
            .map(|p| LeaderboardEntry {
                participation: p.clone(),
                score: backend
                    .scores
                    .iter()
                    .filter(|s| s.participation_id == p.id)
                    .map(|s| s.score)
                    .sum(),
            })
            .collect_vec())
    }

    async fn list_judges(&self, event_id: EventId) -> Result<Vec<User>> {
        self.begin("list_judges", event_id.to_string())?;
        Ok(lock(&self.backend)
            .judges
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_judge(&self, event_id: EventId, user_id: &str) -> Result<()> {
        self.begin("add_judge", format!("{event_id}, {user_id}"))?;
        let mut backend = lock(&self.backend);
        let mut judge = backend
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| Self::not_found("user"))?;
        judge.role = Role::Judge;
        backend.judges.entry(event_id).or_default().push(judge);
        Ok(())
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.begin("register", request.email.clone())?;
        let id = format!("u-{}", self.next_id());
        let mut created = user(&id, &request.full_name);
        created.email = Some(request.email.clone());
        created.phone = Some(request.phone.clone());
        created.birthday = Some(request.birthday);
        created.gender = Some(request.gender);
        lock(&self.backend).users.insert(id, created.clone());
        Ok(created)
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse> {
        self.begin("login", request.login_identifier.clone())?;
        if request.password != lock(&self.backend).password {
            return Err(ApiError::Status {
                url: "fake://auth/login".to_string(),
                status: reqwest::StatusCode::UNAUTHORIZED,
                message: "Incorrect login or password".to_string(),
            });
        }
        Ok(TokenResponse {
            access_token: format!("token-for-{}", request.login_identifier),
            token_type: "bearer".to_string(),
            expires_in: 3600,
        })
    }

    async fn me(&self) -> Result<User> {
        self.begin("me", String::new())?;
        self.me_or_unauthorized()
    }

    async fn update_me(&self, update: &ProfileUpdate) -> Result<User> {
        self.begin("update_me", String::new())?;
        let mut backend = lock(&self.backend);
        let me = backend.me.as_mut().ok_or_else(|| Self::not_found("user"))?;
        if let Some(name) = &update.full_name {
            me.full_name = name.clone();
        }
        if update.height_cm.is_some() {
            me.height_cm = update.height_cm;
        }
        Ok(me.clone())
    }

    async fn update_password(&self, update: &PasswordUpdate) -> Result<()> {
        self.begin("update_password", String::new())?;
        let mut backend = lock(&self.backend);
        if backend.password != update.old_password {
            return Err(ApiError::Status {
                url: "fake://users/me/password".to_string(),
                status: reqwest::StatusCode::BAD_REQUEST,
                message: "Old password is incorrect".to_string(),
            });
        }
        backend.password = update.new_password.clone();
        Ok(())
    }

    async fn upload_avatar(&self, file: Upload) -> Result<User> {
        self.begin("upload_avatar", file.file_name.clone())?;
        let mut backend = lock(&self.backend);
        let me = backend.me.as_mut().ok_or_else(|| Self::not_found("user"))?;
        me.avatar_url = Some(format!("/media/avatars/{}", file.file_name));
        Ok(me.clone())
    }

    fn set_token(&self, token: Option<String>) {
        *lock(&self.token) = token;
    }
}
