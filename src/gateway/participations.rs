use reqwest::Method;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::gateway::{decode, upload_form, Body, HttpGateway};
use crate::model::*;

#[instrument(skip(gateway))]
pub(crate) async fn list_participations(
    gateway: &HttpGateway,
    event_id: EventId,
) -> Result<Vec<Participation>> {
    let participations: Vec<Participation> = gateway
        .get(&format!("/events/{event_id}/participations"))
        .await?;
    debug!(count = participations.len(), "fetched participations");
    Ok(participations)
}

#[instrument(skip(gateway))]
pub(crate) async fn create_participation(
    gateway: &HttpGateway,
    event_id: EventId,
    payload: &NewParticipation,
) -> Result<Participation> {
    let path = format!("/events/{event_id}/participate");
    let body = gateway.send_json(Method::POST, &path, payload).await?;
    decode(&path, &body)
}

#[instrument(skip(gateway))]
pub(crate) async fn join_team(gateway: &HttpGateway, participation_id: ParticipationId) -> Result<()> {
    gateway
        .send(
            Method::POST,
            &format!("/participations/{participation_id}/join"),
            Body::Empty,
        )
        .await
        .map(drop)
}

#[instrument(skip(gateway))]
pub(crate) async fn delete_participation(
    gateway: &HttpGateway,
    participation_id: ParticipationId,
) -> Result<()> {
    gateway
        .send(
            Method::DELETE,
            &format!("/participations/{participation_id}"),
            Body::Empty,
        )
        .await
        .map(drop)
}

#[instrument(skip(gateway))]
pub(crate) async fn remove_member(
    gateway: &HttpGateway,
    participation_id: ParticipationId,
    user_id: &str,
) -> Result<()> {
    gateway
        .send(
            Method::DELETE,
            &format!("/participations/{participation_id}/members/{user_id}"),
            Body::Empty,
        )
        .await
        .map(drop)
}

#[instrument(skip(gateway))]
pub(crate) async fn transfer_captaincy(
    gateway: &HttpGateway,
    participation_id: ParticipationId,
    user_id: &str,
) -> Result<()> {
    let payload = UserRef {
        user_id: user_id.to_string(),
    };
    gateway
        .send_json(
            Method::POST,
            &format!("/participations/{participation_id}/captain"),
            &payload,
        )
        .await
        .map(drop)
}

#[instrument(skip(gateway, file), fields(file_name = %file.file_name))]
pub(crate) async fn upload_avatar(
    gateway: &HttpGateway,
    participation_id: ParticipationId,
    file: Upload,
) -> Result<Participation> {
    let path = format!("/participations/{participation_id}/avatar");
    let body = gateway
        .send(Method::POST, &path, Body::Multipart(upload_form(file)?))
        .await?;
    decode(&path, &body)
}

#[instrument(skip(gateway))]
pub(crate) async fn my_participations(gateway: &HttpGateway) -> Result<Vec<Participation>> {
    gateway.get("/users/me/participations").await
}
