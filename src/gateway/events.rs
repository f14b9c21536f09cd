use reqwest::Method;
use tracing::{debug, instrument};

use crate::error::{ApiError, Result};
use crate::gateway::{Body, HttpGateway};
use crate::model::*;

#[instrument(skip(gateway))]
pub(crate) async fn list_events(gateway: &HttpGateway) -> Result<Vec<RawEvent>> {
    let events: Vec<RawEvent> = gateway.get("/events").await?;
    debug!(count = events.len(), "fetched event list");
    Ok(events)
}

#[instrument(skip(gateway))]
pub(crate) async fn get_event(gateway: &HttpGateway, id: EventId) -> Result<RawEvent> {
    gateway.get(&format!("/events/{id}")).await
}

#[instrument(skip(gateway, payload), fields(title = %payload.title))]
pub(crate) async fn create_event(gateway: &HttpGateway, payload: &EventPayload) -> Result<EventId> {
    let path = "/events";
    let bytes = serde_json::to_vec(payload)?;
    let reply = gateway
        .send_checked(Method::POST, path, Body::Json(bytes))
        .await?;
    reply.event_id.ok_or(ApiError::MissingField {
        url: path.to_string(),
        field: "event_id",
    })
}

#[instrument(skip(gateway, payload))]
pub(crate) async fn update_event(
    gateway: &HttpGateway,
    id: EventId,
    payload: &EventPayload,
) -> Result<()> {
    let bytes = serde_json::to_vec(payload)?;
    gateway
        .send_checked(Method::PATCH, &format!("/events/{id}"), Body::Json(bytes))
        .await
        .map(drop)
}

#[instrument(skip(gateway))]
pub(crate) async fn delete_event(gateway: &HttpGateway, id: EventId) -> Result<()> {
    gateway
        .send_checked(Method::DELETE, &format!("/events/{id}"), Body::Empty)
        .await
        .map(drop)
}

#[instrument(skip(gateway, payload), fields(url = %payload.url))]
pub(crate) async fn add_media(
    gateway: &HttpGateway,
    event_id: EventId,
    payload: &MediaPayload,
) -> Result<()> {
    let bytes = serde_json::to_vec(payload)?;
    gateway
        .send_checked(
            Method::POST,
            &format!("/events/{event_id}/media"),
            Body::Json(bytes),
        )
        .await
        .map(drop)
}

#[instrument(skip(gateway))]
pub(crate) async fn delete_media(
    gateway: &HttpGateway,
    event_id: EventId,
    media_id: MediaId,
) -> Result<()> {
    gateway
        .send_checked(
            Method::DELETE,
            &format!("/events/{event_id}/media/{media_id}"),
            Body::Empty,
        )
        .await
        .map(drop)
}

#[instrument(skip(gateway, payload), fields(name = %payload.name))]
pub(crate) async fn add_activity(
    gateway: &HttpGateway,
    event_id: EventId,
    payload: &ActivityPayload,
) -> Result<ActivityId> {
    let path = format!("/events/{event_id}/activities");
    let bytes = serde_json::to_vec(payload)?;
    let reply = gateway
        .send_checked(Method::POST, &path, Body::Json(bytes))
        .await?;
    reply.activity_id.ok_or(ApiError::MissingField {
        url: path,
        field: "activity_id",
    })
}

#[instrument(skip(gateway, payload))]
pub(crate) async fn update_activity(
    gateway: &HttpGateway,
    activity_id: ActivityId,
    payload: &ActivityPayload,
) -> Result<()> {
    let bytes = serde_json::to_vec(payload)?;
    gateway
        .send_checked(
            Method::PATCH,
            &format!("/activities/{activity_id}"),
            Body::Json(bytes),
        )
        .await
        .map(drop)
}

#[instrument(skip(gateway))]
pub(crate) async fn delete_activity(gateway: &HttpGateway, activity_id: ActivityId) -> Result<()> {
    gateway
        .send_checked(
            Method::DELETE,
            &format!("/activities/{activity_id}"),
            Body::Empty,
        )
        .await
        .map(drop)
}
