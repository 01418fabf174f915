//! Login, logout and profile.

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form as FormBody,
};
use std::collections::HashMap;

use crate::backend::{unverified_subject, Reply};
use crate::error::AppError;
use crate::forms::Form;
use crate::http::middleware::require_auth::LOGIN_PATH;
use crate::http::server::AppState;
use crate::session::REDIRECT_PATH_AFTER_LOGIN;
use crate::views::{PageContext, TemplateData};

/// Shown for every rejected login, whatever the backend's reason.
pub const INVALID_CREDENTIALS: &str = "Email or Password is incorrect";
pub const LOGGED_OUT: &str = "You've been logged out successfully!";

pub async fn login_form(State(state): State<AppState>, ctx: PageContext) -> Response {
    let data = TemplateData {
        form: Some(Form::default()),
        ..Default::default()
    };
    state.finish(state.render(&ctx, "login.page.html", data).await)
}

pub async fn login(
    State(state): State<AppState>,
    ctx: PageContext,
    body: Result<FormBody<HashMap<String, String>>, FormRejection>,
) -> Response {
    let Ok(FormBody(values)) = body else {
        return state.reporter.client_error(StatusCode::BAD_REQUEST);
    };
    state.finish(log_in(&state, &ctx, Form::new(values)).await)
}

async fn log_in(state: &AppState, ctx: &PageContext, mut form: Form) -> Result<Response, AppError> {
    form.required(&["email", "password"]);
    if !form.valid() {
        return login_page(state, ctx, form).await;
    }

    let backend = state.backend_for(ctx).await?;
    let token = match backend.token(form.get("email"), form.get("password")).await? {
        Reply::Ok(response) => response.token,
        Reply::Status(status) => {
            tracing::info!(status = %status, request_id = %ctx.request_id.as_str(), "Login rejected");
            form.errors.add("generic", INVALID_CREDENTIALS);
            return login_page(state, ctx, form).await;
        }
    };

    let user_id = unverified_subject(&token)?;
    ctx.session.log_in(&user_id, &token).await?;
    tracing::info!(user_id = %user_id, "Visitor logged in");

    let target = ctx
        .session
        .pop_string(REDIRECT_PATH_AFTER_LOGIN)
        .await?
        .unwrap_or_else(|| "/".to_string());
    Ok(Redirect::to(&target).into_response())
}

async fn login_page(state: &AppState, ctx: &PageContext, mut form: Form) -> Result<Response, AppError> {
    form.values.remove("password");
    let data = TemplateData {
        form: Some(form),
        ..Default::default()
    };
    state.render(ctx, "login.page.html", data).await
}

pub async fn logout(State(state): State<AppState>, ctx: PageContext) -> Response {
    let result = ctx.session.log_out(LOGGED_OUT).await.map_err(AppError::from);
    state.finish(result.map(|()| Redirect::to("/").into_response()))
}

pub async fn profile(State(state): State<AppState>, ctx: PageContext) -> Response {
    state.finish(profile_page(&state, &ctx).await)
}

async fn profile_page(state: &AppState, ctx: &PageContext) -> Result<Response, AppError> {
    let Some(user_id) = ctx.session.authenticated_user_id().await? else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    let backend = state.backend_for(ctx).await?;
    match backend.user(&user_id).await? {
        Reply::Ok(user) => {
            let data = TemplateData {
                user: Some(user),
                ..Default::default()
            };
            state.render(ctx, "profile.page.html", data).await
        }
        Reply::Status(StatusCode::UNAUTHORIZED) => Ok(Redirect::to(LOGIN_PATH).into_response()),
        Reply::Status(status) => Ok(state.reporter.client_error(status)),
    }
}
