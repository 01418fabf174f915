//! Product pages.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use crate::backend::Reply;
use crate::error::AppError;
use crate::http::middleware::require_auth::LOGIN_PATH;
use crate::http::server::AppState;
use crate::views::{PageContext, TemplateData};

pub async fn home(State(state): State<AppState>, ctx: PageContext) -> Response {
    state.finish(home_page(&state, &ctx).await)
}

async fn home_page(state: &AppState, ctx: &PageContext) -> Result<Response, AppError> {
    let backend = state.backend_for(ctx).await?;
    match backend.products().await? {
        Reply::Ok(products) => {
            let data = TemplateData {
                products,
                ..Default::default()
            };
            state.render(ctx, "home.page.html", data).await
        }
        Reply::Status(StatusCode::UNAUTHORIZED) => Ok(Redirect::to(LOGIN_PATH).into_response()),
        Reply::Status(status) => Ok(state.reporter.client_error(status)),
    }
}

pub async fn about(State(state): State<AppState>, ctx: PageContext) -> Response {
    state.finish(state.render(&ctx, "about.page.html", TemplateData::default()).await)
}

pub async fn show_product(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        tracing::debug!(id = %id, "Malformed product id");
        return state.reporter.client_error(StatusCode::BAD_REQUEST);
    };
    state.finish(product_page(&state, &ctx, &id).await)
}

async fn product_page(state: &AppState, ctx: &PageContext, id: &Uuid) -> Result<Response, AppError> {
    let backend = state.backend_for(ctx).await?;
    match backend.product(id).await? {
        Reply::Ok(product) => {
            let data = TemplateData {
                product: Some(product),
                ..Default::default()
            };
            state.render(ctx, "show.page.html", data).await
        }
        Reply::Status(StatusCode::UNAUTHORIZED) => Ok(Redirect::to(LOGIN_PATH).into_response()),
        Reply::Status(status) => Ok(state.reporter.client_error(status)),
    }
}

/// Fallback for unrouted paths.
pub async fn not_found(State(state): State<AppState>) -> Response {
    state.reporter.client_error(StatusCode::NOT_FOUND)
}
