use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, PublicUser, RegisterForm},
        extractors::{expired_remember_cookie, remember_cookie, CurrentUser},
    },
    state::AppState,
    users::{User, UserError},
};

type SetCookie = [(HeaderName, String); 1];

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<(StatusCode, SetCookie, Json<PublicUser>), UserError> {
    let mut user = User::new(form.name, form.email, form.password);
    if let Err(e) = state.users.create(&mut user).await {
        warn!(error = %e, "registration rejected");
        return Err(e);
    }

    let token = state.users.sign_in(&mut user).await?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, remember_cookie(&token, state.config.is_prod()))],
        Json(PublicUser::from(&user)),
    ))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<(SetCookie, Json<PublicUser>), UserError> {
    let mut user = match state.users.authenticate(&form.email, &form.password).await {
        Ok(u) => u,
        // Same answer for an unknown email and a wrong password.
        Err(UserError::NotFound) | Err(UserError::InvalidCredentials) => {
            warn!("login failed");
            return Err(UserError::InvalidCredentials);
        }
        Err(e) => return Err(e),
    };

    let token = state.users.sign_in(&mut user).await?;
    info!(user_id = user.id, "user logged in");
    Ok((
        [(header::SET_COOKIE, remember_cookie(&token, state.config.is_prod()))],
        Json(PublicUser::from(&user)),
    ))
}

#[instrument(skip(state, user))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
) -> Result<(StatusCode, SetCookie), UserError> {
    state.users.sign_out(&mut user).await?;
    info!(user_id = user.id, "user logged out");
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, expired_remember_cookie(state.config.is_prod()))],
    ))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}
