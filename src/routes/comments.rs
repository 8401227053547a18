use crate::{
    error::{AppError, Result},
    models::comment::*,
    services::auth::User,
    state::AppState,
    utils::{
        middleware::{AjaxOnly, OptionalAuth, RequireAuth},
        pagination::{count_label, replies_label},
    },
};
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use std::sync::Arc;
use tracing::{debug, info};
use validator::{ValidationError, ValidationErrors};

pub const REMAINING_HEADER: &str = "x-comments-remaining";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/owners/:owner_kind/:owner_id/comments",
            get(get_comments_section).post(create_comment),
        )
        .route("/owners/:owner_kind/:owner_id/comments/more", get(load_more_comments))
        .route("/comments/:id/replies", get(list_replies).post(create_reply))
        .route("/comments/:id/edit", post(edit_comment))
        .route("/comments/:id/delete", post(delete_comment))
}

/// 获取评论区（标题、表单、最新的几条评论和加载更多按钮）
/// GET /api/owners/:owner_kind/:owner_id/comments
pub async fn get_comments_section(
    State(app_state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path((owner_kind, owner_id)): Path<(String, i64)>,
    OriginalUri(uri): OriginalUri,
) -> Result<Html<String>> {
    let owner = Owner::from_parts(&owner_kind, owner_id)?;
    let section = render_section(&app_state, owner, user.as_ref(), uri.path()).await?;
    Ok(Html(section))
}

/// 发表评论；owner 为评论时即为回复
/// POST /api/owners/:owner_kind/:owner_id/comments
pub async fn create_comment(
    State(app_state): State<Arc<AppState>>,
    _ajax: AjaxOnly,
    RequireAuth(user): RequireAuth,
    Path((owner_kind, owner_id)): Path<(String, i64)>,
    Form(request): Form<CreateCommentRequest>,
) -> Result<Response> {
    let owner = Owner::from_parts(&owner_kind, owner_id)?;

    match app_state.comment_service.create_comment(owner, &user, request).await {
        Ok(comment) => {
            let html = app_state
                .templates
                .render_comment(&comment_view(&comment, Some(&user)))?;
            Ok(Html(html).into_response())
        }
        Err(e) => form_error_response(&app_state, e),
    }
}

/// 加载更多评论
/// GET /api/owners/:owner_kind/:owner_id/comments/more?last_visible_id=&count=
pub async fn load_more_comments(
    State(app_state): State<Arc<AppState>>,
    _ajax: AjaxOnly,
    OptionalAuth(user): OptionalAuth,
    Path((owner_kind, owner_id)): Path<(String, i64)>,
    Query(query): Query<LoadMoreQuery>,
) -> Result<Response> {
    let owner = Owner::from_parts(&owner_kind, owner_id)?;
    let count = query.count.unwrap_or(app_state.load_more_policy().batch_size);

    debug!(
        "Load more for {}: last_visible_id={}, count={}",
        owner, query.last_visible_id, count
    );

    let page = app_state
        .comment_service
        .load_more(owner, query.last_visible_id, count)
        .await?;

    let views: Vec<CommentView> = page
        .comments
        .iter()
        .map(|comment| comment_view(comment, user.as_ref()))
        .collect();
    let html = app_state.templates.render_comment_list(&views)?;

    let mut response = Html(html).into_response();
    response
        .headers_mut()
        .insert(REMAINING_HEADER, HeaderValue::from(page.remaining));
    Ok(response)
}

/// 获取评论的回复
/// GET /api/comments/:id/replies
pub async fn list_replies(
    State(app_state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(comment_id): Path<i64>,
) -> Result<Html<String>> {
    let replies = app_state.comment_service.list_replies(comment_id).await?;

    let views: Vec<CommentView> = replies
        .iter()
        .map(|reply| comment_view(reply, user.as_ref()))
        .collect();

    Ok(Html(app_state.templates.render_comment_list(&views)?))
}

/// 回复评论
/// POST /api/comments/:id/replies
pub async fn create_reply(
    State(app_state): State<Arc<AppState>>,
    _ajax: AjaxOnly,
    RequireAuth(user): RequireAuth,
    Path(comment_id): Path<i64>,
    Form(request): Form<CreateCommentRequest>,
) -> Result<Response> {
    match app_state.comment_service.create_reply(comment_id, &user, request).await {
        Ok(reply) => {
            let html = app_state
                .templates
                .render_comment(&comment_view(&reply, Some(&user)))?;
            Ok(Html(html).into_response())
        }
        Err(e) => form_error_response(&app_state, e),
    }
}

/// 编辑评论，返回更新后的正文
/// POST /api/comments/:id/edit
pub async fn edit_comment(
    State(app_state): State<Arc<AppState>>,
    _ajax: AjaxOnly,
    RequireAuth(user): RequireAuth,
    Path(comment_id): Path<i64>,
    Form(request): Form<UpdateCommentRequest>,
) -> Result<Response> {
    match app_state
        .comment_service
        .update_comment(comment_id, &user, request)
        .await
    {
        Ok(comment) => Ok(comment.comment.text.into_response()),
        Err(e) => form_error_response(&app_state, e),
    }
}

/// 删除评论及其全部回复
/// POST /api/comments/:id/delete
pub async fn delete_comment(
    State(app_state): State<Arc<AppState>>,
    _ajax: AjaxOnly,
    RequireAuth(user): RequireAuth,
    Path(comment_id): Path<i64>,
) -> Result<StatusCode> {
    let removed = app_state
        .comment_service
        .delete_comment(comment_id, &user)
        .await?;

    info!("User {} deleted comment {} ({} rows)", user.id, comment_id, removed);
    Ok(StatusCode::NO_CONTENT)
}

/// Renders the whole comments block of `owner`: heading, form or login link,
/// the newest comments and the first "load more" button.
pub async fn render_section(
    app_state: &AppState,
    owner: Owner,
    viewer: Option<&User>,
    page_path: &str,
) -> Result<String> {
    let policy = app_state.load_more_policy();
    let total = app_state.comment_service.count_for_owner(owner).await?;
    let recent = app_state
        .comment_service
        .recent_for_owner(owner, policy.initial_visible)
        .await?;

    let section = CommentSectionView {
        owner_kind: owner.kind().to_string(),
        owner_id: owner.id(),
        total,
        count_label: count_label(total),
        comments: recent.iter().map(|c| comment_view(c, viewer)).collect(),
        load_more_label: policy.initial_button_label(total.max(0) as usize),
        login_url: match viewer {
            Some(_) => None,
            None => Some(app_state.login_redirect(page_path)),
        },
    };

    app_state.templates.render_section(&section)
}

pub fn comment_view(comment: &CommentWithAuthor, viewer: Option<&User>) -> CommentView {
    let author_id = &comment.comment.author_id;
    CommentView {
        id: comment.comment.id,
        author_username: comment.author_username.clone(),
        text: comment.comment.text.clone(),
        created_on: comment.comment.created_at.format("%b %d, %Y").to_string(),
        is_reply: comment.comment.is_reply(),
        parent_id: comment.comment.parent_id,
        reply_count: comment.reply_count,
        replies_label: replies_label(comment.reply_count),
        can_edit: viewer.map_or(false, |user| user.can_edit(author_id)),
        can_delete: viewer.map_or(false, |user| user.can_delete(author_id)),
    }
}

/// Form validation failures go back as the re-rendered form so the page can
/// swap it in; every other error keeps its usual response.
fn form_error_response(app_state: &AppState, error: AppError) -> Result<Response> {
    let errors = match error {
        AppError::ValidatorError(errors) => errors,
        AppError::Validation(message) => {
            let mut field_error = ValidationError::new("invalid");
            field_error.message = Some(message.into());
            let mut errors = ValidationErrors::new();
            errors.add("text", field_error);
            errors
        }
        other => return Err(other),
    };

    let html = app_state.templates.render_form_errors(&errors)?;
    Ok((StatusCode::BAD_REQUEST, Html(html)).into_response())
}
