use crate::{repository_from_request, state::AppState};
use axum::{
    extract::{FromRequest as _, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Json,
};
use cookie::{Cookie, Expiration, SameSite};
use http::{header::CONTENT_TYPE, StatusCode};
use recipes_dal::user::{User, UserRepository};
use recipes_types::claim::ApiClaim;
use time::OffsetDateTime;
use tower_cookies::Cookies;
use tracing::{debug, error, info};

pub mod token;

pub const TOKEN_COOKIE_NAME: &str = "recipes_token";

repository_from_request!(UserRepository);

#[derive(serde::Deserialize)]
struct LoginCredentials {
    email: String,
    password: String,
}

fn issue_token(state: &AppState, cookies: &Cookies, user: &User) -> Result<String, StatusCode> {
    let claim = ApiClaim::new_expired(
        user.id.to_string(),
        user.roles.iter().flat_map(|v| v.iter()).map(String::as_str),
    );
    let signed_token = state.tokens().issue(claim).map_err(|e| {
        error!("Failed to issue token: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let cookie = Cookie::build((TOKEN_COOKIE_NAME, signed_token.clone()))
        .http_only(true)
        .secure(state.config().secure_cookies)
        .path("/")
        .same_site(SameSite::Lax)
        .expires(Expiration::DateTime(
            OffsetDateTime::now_utc() + state.tokens().default_validity(),
        ));
    cookies.add(cookie.into());
    Ok(signed_token)
}

/// Password login, accepts JSON or form body, returns token and sets it as cookie
pub async fn login(
    State(state): State<AppState>,
    user_registry: UserRepository,
    cookies: Cookies,
    request: axum::extract::Request,
) -> Result<impl IntoResponse, StatusCode> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    let credentials = if content_type.starts_with("application/json") {
        let Json(data) = Json::<LoginCredentials>::from_request(request, &())
            .await
            .map_err(|e| {
                error!("Failed to get login credentials: {e}");
                StatusCode::BAD_REQUEST
            })?;
        data
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(data) = Form::<LoginCredentials>::from_request(request, &())
            .await
            .map_err(|e| {
                error!("Failed to get login credentials: {e}");
                StatusCode::BAD_REQUEST
            })?;
        data
    } else {
        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    };

    let user = user_registry
        .check_password(&credentials.email, &credentials.password)
        .await
        .map_err(|e| {
            debug!("User check error: {e}");
            StatusCode::UNAUTHORIZED
        })?;

    let token = issue_token(&state, &cookies, &user)?;
    info!("User {} logged in", user.email);
    Ok(token)
}

pub async fn logout(cookies: Cookies) -> impl IntoResponse {
    cookies.remove(Cookie::build((TOKEN_COOKIE_NAME, "")).path("/").into());
    Redirect::to("/")
}

/// Builds authentication router - must be nested on /auth path!
pub fn auth_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
}
