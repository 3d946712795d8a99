use std::{
    convert::Infallible,
    sync::Arc,
    task::{Context, Poll},
};

use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{FromRequestParts, Request},
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use axum_extra::TypedHeader;
use futures::future::BoxFuture;
use headers::{authorization::Bearer, Authorization};
use http::request::Parts;
use recipes_types::claim::{ApiClaim, Authorization as _, Role};
use tower::{Layer, Service};
use tower_cookies::Cookies;
use tracing::{debug, error, warn};

use super::TOKEN_COOKIE_NAME;

impl FromRequestParts<AppState> for ApiClaim {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claim) = parts.extensions.get::<ApiClaim>() {
            return Ok(claim.clone());
        }

        let mut header_token = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .ok()
            .map(|h| h.0.token().to_string());

        if header_token.is_none() {
            let cookies = parts.extract::<Cookies>().await.map_err(|e| {
                error!("Cannot get cookies: {}", e.1);
                ApiError::Internal("cookies are not available".into())
            })?;
            header_token = cookies.get(TOKEN_COOKIE_NAME).map(|t| t.value().to_string());
        }

        match header_token {
            Some(token) => {
                let claim = state.tokens().validate::<ApiClaim>(&token).map_err(|e| {
                    warn!("Failed to validate token: {e}");
                    ApiError::Unauthorized
                })?;
                Ok(claim)
            }
            None => {
                debug!("No token found");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// Requires valid token, claim from token is available as request extension
#[derive(Clone)]
pub struct TokenLayer {
    state: AppState,
}

impl TokenLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for TokenLayer {
    type Service = TokenService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TokenService<S> {
    inner: S,
    state: AppState,
}

impl<S> Service<Request> for TokenService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let state = self.state.clone();
        // ready service must be used, clone is left in its place
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move {
            let (mut parts, body) = request.into_parts();
            match ApiClaim::from_request_parts(&mut parts, &state).await {
                Ok(claim) => {
                    parts.extensions.insert(claim);
                    inner.call(Request::from_parts(parts, body)).await
                }
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

/// Allows request only if claim has any of the roles, must be used inside [TokenLayer]
#[derive(Clone)]
pub struct RequiredRolesLayer {
    roles: Arc<Vec<Role>>,
}

impl RequiredRolesLayer {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: Arc::new(roles.into_iter().collect()),
        }
    }
}

impl<S> Layer<S> for RequiredRolesLayer {
    type Service = RequiredRolesService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequiredRolesService {
            inner,
            roles: self.roles.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequiredRolesService<S> {
    inner: S,
    roles: Arc<Vec<Role>>,
}

impl<S> Service<Request> for RequiredRolesService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let rejection = match request.extensions().get::<ApiClaim>() {
            None => Some(ApiError::Unauthorized),
            Some(claim) if !claim.has_any_role(self.roles.iter()) => {
                warn!("User {} lacks required roles {:?}", claim.sub, self.roles);
                Some(ApiError::Forbidden)
            }
            Some(_) => None,
        };
        match rejection {
            Some(e) => Box::pin(futures::future::ready(Ok(e.into_response()))),
            None => {
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Box::pin(async move { inner.call(request).await })
            }
        }
    }
}
