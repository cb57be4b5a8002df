use std::collections::HashMap;
use std::ops::Deref;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query, State},
    http::{header, request::Parts, StatusCode},
    routing::{get, post},
    Json,
};
use droptable_core::SessionData;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    serialized::{LoginResult, LoginUrl, ToSerialized, User},
    Router,
};

/// Wraps [SessionData] so [FromRequestParts] can be implemented for it
pub struct Session(pub SessionData);

impl Deref for Session {
    type Target = SessionData;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization"))?;

        let parts: Vec<_> = token.split_ascii_whitespace().collect();

        if parts.first() != Some(&"Bearer") {
            return Err((StatusCode::BAD_REQUEST, "Authorization must be Bearer"));
        }

        let token = parts.last().cloned().unwrap_or_default();

        let session = context
            .app
            .auth
            .session(token)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Session does not exist"))?;

        Ok(Self(session))
    }
}

/// A [Session] that has passed the admin policy
pub struct Admin(pub SessionData);

impl Deref for Admin {
    type Target = SessionData;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Admin {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let Session(session) = Session::from_request_parts(parts, state).await?;
        let context = ServerContext::from_ref(state);

        if !context.app.auth.is_admin(&session) {
            return Err((StatusCode::FORBIDDEN, "Not an administrator"));
        }

        Ok(Self(session))
    }
}

#[utoipa::path(
    get,
    path = "/v1/auth/login",
    tag = "auth",
    responses(
        (status = 200, body = LoginUrl)
    )
)]
pub(crate) async fn login(State(context): State<ServerContext>) -> ServerResult<Json<LoginUrl>> {
    let url = context.app.auth.login_url().await?;

    Ok(Json(LoginUrl::new(url)))
}

#[utoipa::path(
    get,
    path = "/v1/auth/callback",
    tag = "auth",
    responses(
        (status = 200, body = LoginResult)
    )
)]
pub(crate) async fn callback(
    State(context): State<ServerContext>,
    Query(params): Query<HashMap<String, String>>,
) -> ServerResult<Json<LoginResult>> {
    let session = context.app.auth.login(&params).await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "auth",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The session was ended")
    )
)]
pub(crate) async fn logout(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<()> {
    context.app.auth.logout(&session.token)?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/auth/user",
    tag = "auth",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User)
    )
)]
pub(crate) async fn user(session: Session) -> Json<User> {
    Json(session.user.to_serialized())
}

pub fn router() -> Router {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", post(logout))
        .route("/user", get(user))
}
