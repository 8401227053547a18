use crate::{error::AppError, services::auth::User, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequestParts, OriginalUri, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const AUTH_COOKIE: &str = "auth_token";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 认证中间件
///
/// 有效令牌对应的用户写入请求扩展；无效或缺失的令牌按匿名请求继续处理。
/// 用户记录写入失败时直接返回错误，不降级为匿名请求。
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    if let Some(token) = extract_token(request.headers()) {
        match app_state.auth_service.authenticate(&token) {
            Ok(user) => {
                // 确保用户记录存在，评论需要引用作者
                if let Err(e) = app_state.user_service.ensure_user(&user).await {
                    error!("Failed to ensure user record for {}: {}", user.id, e);
                    return Err(e);
                }
                debug!("Authenticated user: {} ({})", user.id, user.username);
                request.extensions_mut().insert(user);
            }
            Err(e) => {
                debug!("Token rejected, continuing anonymously: {}", e);
            }
        }
    }

    Ok(next.run(request).await)
}

/// 请求日志中间件
pub async fn request_logging_middleware(request: Request<Body>, next: Next<Body>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start_time = std::time::Instant::now();

    debug!("Incoming request: {} {}", method, uri);

    let response = next.run(request).await;

    info!(
        "Request completed: {} {} {} - {}ms",
        method,
        uri,
        response.status().as_u16(),
        start_time.elapsed().as_millis()
    );

    response
}

/// 请求 ID 中间件
pub async fn request_id_middleware(mut request: Request<Body>, next: Next<Body>) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

// 辅助函数

/// Bearer 头优先，其次是 `auth_token` cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
        .unwrap_or(false)
}

// 类型定义

/// 请求 ID 包装器
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Rejects requests that were not sent by the page's script.
pub struct AjaxOnly;

#[async_trait]
impl<S> FromRequestParts<S> for AjaxOnly
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if is_ajax(&parts.headers) {
            Ok(AjaxOnly)
        } else {
            debug!("Rejecting non-AJAX request to {}", parts.uri.path());
            Err(AppError::forbidden("AJAX request required"))
        }
    }
}

/// 可选认证提取器
pub struct OptionalAuth(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().cloned();
        Ok(OptionalAuth(user))
    }
}

/// 必须登录的提取器，匿名请求重定向到登录页并带上 `next`
pub struct RequireAuth(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>() {
            return Ok(RequireAuth(user.clone()));
        }

        let next = original_path(parts);
        debug!("Anonymous request to {}, redirecting to login", next);
        Err(AppError::LoginRequired(state.login_redirect(&next)))
    }
}

/// Path and query as the client sent them, before any router nesting.
pub fn original_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}
