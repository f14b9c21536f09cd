use reqwest::Method;
use tracing::instrument;

use crate::error::Result;
use crate::gateway::{decode, upload_form, Body, HttpGateway};
use crate::model::*;

#[instrument(skip(gateway, request), fields(email = %request.email))]
pub(crate) async fn register(gateway: &HttpGateway, request: &RegisterRequest) -> Result<User> {
    let path = "/auth/register";
    let body = gateway.send_json(Method::POST, path, request).await?;
    decode(path, &body)
}

#[instrument(skip(gateway, request), fields(login = %request.login_identifier))]
pub(crate) async fn login(gateway: &HttpGateway, request: &LoginRequest) -> Result<TokenResponse> {
    let path = "/auth/login";
    let body = gateway.send_json(Method::POST, path, request).await?;
    decode(path, &body)
}

#[instrument(skip(gateway))]
pub(crate) async fn me(gateway: &HttpGateway) -> Result<User> {
    gateway.get("/users/me").await
}

#[instrument(skip(gateway))]
pub(crate) async fn update_me(gateway: &HttpGateway, update: &ProfileUpdate) -> Result<User> {
    let path = "/users/me";
    let body = gateway.send_json(Method::PATCH, path, update).await?;
    decode(path, &body)
}

#[instrument(skip(gateway, update))]
pub(crate) async fn update_password(gateway: &HttpGateway, update: &PasswordUpdate) -> Result<()> {
    gateway
        .send_json(Method::POST, "/users/me/password", update)
        .await
        .map(drop)
}

#[instrument(skip(gateway, file), fields(file_name = %file.file_name))]
pub(crate) async fn upload_avatar(gateway: &HttpGateway, file: Upload) -> Result<User> {
    let path = "/users/me/avatar";
    let body = gateway
        .send(Method::POST, path, Body::Multipart(upload_form(file)?))
        .await?;
    decode(path, &body)
}
