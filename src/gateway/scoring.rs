use reqwest::Method;
use tracing::instrument;

use crate::error::Result;
use crate::gateway::HttpGateway;
use crate::model::*;

#[instrument(skip(gateway))]
pub(crate) async fn add_score(gateway: &HttpGateway, payload: &ScorePayload) -> Result<()> {
    gateway
        .send_json(Method::POST, "/scores", payload)
        .await
        .map(drop)
}

#[instrument(skip(gateway))]
pub(crate) async fn leaderboard(
    gateway: &HttpGateway,
    event_id: EventId,
) -> Result<Vec<LeaderboardEntry>> {
    gateway.get(&format!("/events/{event_id}/leaderboard")).await
}

#[instrument(skip(gateway))]
pub(crate) async fn list_judges(gateway: &HttpGateway, event_id: EventId) -> Result<Vec<User>> {
    gateway.get(&format!("/events/{event_id}/judges")).await
}

#[instrument(skip(gateway))]
pub(crate) async fn add_judge(gateway: &HttpGateway, event_id: EventId, user_id: &str) -> Result<()> {
    let payload = UserRef {
        user_id: user_id.to_string(),
    };
    gateway
        .send_json(Method::POST, &format!("/events/{event_id}/judges"), &payload)
        .await
        .map(drop)
}
