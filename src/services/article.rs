use crate::{
    error::{AppError, Result},
    models::{article::*, comment::Owner},
    services::{auth::User, comment::CommentService, Database},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

#[derive(Clone)]
pub struct ArticleService {
    db: Arc<Database>,
    comment_service: CommentService,
}

impl ArticleService {
    pub fn new(db: Arc<Database>, comment_service: CommentService) -> Self {
        Self { db, comment_service }
    }

    /// 创建新文章
    pub async fn create_article(&self, author: &User, request: CreateArticleRequest) -> Result<Article> {
        debug!("Creating article for user: {}", author.id);

        request.validate()?;

        let result = sqlx::query(
            "INSERT INTO articles (title, text, author_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&request.title)
        .bind(&request.text)
        .bind(&author.id)
        .bind(Utc::now())
        .execute(&self.db.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::conflict("An article with this title already exists"));
            }
            Err(e) => return Err(e.into()),
        };

        let article = self
            .get_article(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::internal("Failed to create article"))?;

        info!("Created article: {} by user: {}", article.id, author.id);
        Ok(article)
    }

    /// 获取文章
    pub async fn get_article(&self, article_id: i64) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(
            "SELECT id, title, text, author_id, created_at FROM articles WHERE id = ?",
        )
        .bind(article_id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(article)
    }

    /// 删除文章，先删除其下所有评论及回复，再删除文章本身
    pub async fn delete_article(&self, article_id: i64) -> Result<u64> {
        if self.get_article(article_id).await?.is_none() {
            return Err(AppError::not_found("Article"));
        }

        let mut tx = self.db.begin_transaction().await?;

        let comments = self
            .comment_service
            .delete_threads_for_owner(&mut tx, Owner::Article(article_id))
            .await?;

        sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(article_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Deleted article {} with {} comments", article_id, comments);
        Ok(comments)
    }
}
