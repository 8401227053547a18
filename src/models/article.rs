use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1))]
    pub text: String,
}

/// Data for the article page template.
#[derive(Debug, Clone, Serialize)]
pub struct ArticlePageView {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub published_on: String,
    pub comments_section: String,
}
