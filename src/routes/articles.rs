use crate::{
    error::{AppError, Result},
    models::{article::*, comment::Owner, response::ApiResponse},
    state::AppState,
    routes::comments::render_section,
    utils::middleware::{AjaxOnly, OptionalAuth, RequireAuth},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::{debug, info};

/// JSON endpoints under `/api`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // 需要管理员权限
        .route("/articles", post(create_article))
        .route("/articles/:id/delete", post(delete_article))
}

/// The HTML article page.
pub fn page_router() -> Router<Arc<AppState>> {
    Router::new().route("/articles/:id", get(article_page))
}

/// 文章页面（含评论区）
/// GET /articles/:id
pub async fn article_page(
    State(app_state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(article_id): Path<i64>,
) -> Result<Html<String>> {
    debug!("Rendering article page {}", article_id);

    let article = app_state
        .article_service
        .get_article(article_id)
        .await?
        .ok_or_else(|| AppError::not_found("Article"))?;

    let page_path = format!("/articles/{}", article.id);
    let comments_section =
        render_section(&app_state, Owner::Article(article.id), user.as_ref(), &page_path).await?;

    let page = ArticlePageView {
        id: article.id,
        title: article.title,
        text: article.text,
        published_on: article.created_at.format("%b %d, %Y").to_string(),
        comments_section,
    };

    Ok(Html(app_state.templates.render_article_page(&page)?))
}

/// 创建文章
/// POST /api/articles
pub async fn create_article(
    State(app_state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateArticleRequest>,
) -> Result<Json<ApiResponse<Article>>> {
    if !user.is_staff {
        return Err(AppError::forbidden("Only staff can publish articles"));
    }

    let article = app_state.article_service.create_article(&user, request).await?;

    Ok(Json(ApiResponse::success_with_message(
        article,
        "Article created".to_string(),
    )))
}

/// 删除文章及其评论
/// POST /api/articles/:id/delete
pub async fn delete_article(
    State(app_state): State<Arc<AppState>>,
    _ajax: AjaxOnly,
    RequireAuth(user): RequireAuth,
    Path(article_id): Path<i64>,
) -> Result<StatusCode> {
    if !user.is_staff {
        return Err(AppError::forbidden("Only staff can delete articles"));
    }

    let removed = app_state.article_service.delete_article(article_id).await?;
    info!(
        "User {} deleted article {} with {} comments",
        user.id, article_id, removed
    );

    Ok(StatusCode::NO_CONTENT)
}
