use crate::{
    config::Config,
    error::{AppError, Result},
    models::comment::*,
    services::{auth::User, Database},
    utils::validation::validate_comment_length,
};
use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// Every comment read goes through this projection so rows always carry the
/// author name and the number of direct replies.
const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.author_id, u.username AS author_username, c.text, c.created_at,
           c.owner_type, c.owner_id, c.parent_id,
           (SELECT COUNT(*) FROM comments r WHERE r.parent_id = c.id) AS reply_count
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

const NEWEST_FIRST: &str = " ORDER BY c.created_at DESC, c.id DESC";

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
    max_comment_length: usize,
    enable_comments: bool,
}

impl CommentService {
    pub fn new(db: Arc<Database>, config: &Config) -> Self {
        Self {
            db,
            max_comment_length: config.max_comment_length,
            enable_comments: config.enable_comments,
        }
    }

    /// Creates a top-level comment. A comment owned by another comment is a
    /// reply, so `Owner::Comment` is handed to [`Self::create_reply`].
    pub async fn create_comment(
        &self,
        owner: Owner,
        author: &User,
        request: CreateCommentRequest,
    ) -> Result<CommentWithAuthor> {
        if let Owner::Comment(parent_id) = owner {
            return self.create_reply(parent_id, author, request).await;
        }
        debug!("Creating comment on {} by {}", owner, author.id);

        self.check_enabled()?;
        request.validate()?;
        validate_comment_length(&request.text, self.max_comment_length)?;
        self.ensure_owner_exists(owner).await?;

        let created = self.insert(author, &request.text, owner, None).await?;
        info!("Created comment {} on {}", created.comment.id, owner);
        Ok(created)
    }

    pub async fn create_reply(
        &self,
        parent_id: i64,
        author: &User,
        request: CreateCommentRequest,
    ) -> Result<CommentWithAuthor> {
        debug!("Creating reply to comment {} by {}", parent_id, author.id);

        self.check_enabled()?;
        request.validate()?;
        validate_comment_length(&request.text, self.max_comment_length)?;

        let owner = Owner::Comment(parent_id);
        self.ensure_owner_exists(owner).await?;

        let created = self.insert(author, &request.text, owner, Some(parent_id)).await?;
        info!("Created reply {} to comment {}", created.comment.id, parent_id);
        Ok(created)
    }

    pub async fn get_comment(&self, comment_id: i64) -> Result<Option<CommentWithAuthor>> {
        let query = format!("{} WHERE c.id = ?", COMMENT_SELECT);
        let row: Option<CommentRow> = sqlx::query_as(&query)
            .bind(comment_id)
            .fetch_optional(&self.db.pool)
            .await?;

        row.map(CommentWithAuthor::try_from).transpose()
    }

    /// Comments owned by `owner`, newest first. Matching on the owner type as
    /// well as the id keeps replies to comment #N out of article #N.
    pub async fn list_for_owner(&self, owner: Owner) -> Result<Vec<CommentWithAuthor>> {
        debug!("Listing comments for {}", owner);

        let query = format!(
            "{} WHERE c.owner_type = ? AND c.owner_id = ?{}",
            COMMENT_SELECT, NEWEST_FIRST
        );
        let rows: Vec<CommentRow> = sqlx::query_as(&query)
            .bind(owner.kind())
            .bind(owner.id())
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter().map(CommentWithAuthor::try_from).collect()
    }

    /// The newest `limit` comments of `owner`; what the page shows up front.
    pub async fn recent_for_owner(&self, owner: Owner, limit: usize) -> Result<Vec<CommentWithAuthor>> {
        let query = format!(
            "{} WHERE c.owner_type = ? AND c.owner_id = ?{} LIMIT ?",
            COMMENT_SELECT, NEWEST_FIRST
        );
        let rows: Vec<CommentRow> = sqlx::query_as(&query)
            .bind(owner.kind())
            .bind(owner.id())
            .bind(as_limit(limit))
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter().map(CommentWithAuthor::try_from).collect()
    }

    pub async fn count_for_owner(&self, owner: Owner) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments WHERE owner_type = ? AND owner_id = ?",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .fetch_one(&self.db.pool)
        .await?;

        Ok(count)
    }

    pub async fn list_replies(&self, comment_id: i64) -> Result<Vec<CommentWithAuthor>> {
        self.ensure_owner_exists(Owner::Comment(comment_id)).await?;

        let query = format!("{} WHERE c.parent_id = ?{}", COMMENT_SELECT, NEWEST_FIRST);
        let rows: Vec<CommentRow> = sqlx::query_as(&query)
            .bind(comment_id)
            .fetch_all(&self.db.pool)
            .await?;

        rows.into_iter().map(CommentWithAuthor::try_from).collect()
    }

    /// Replaces the text of a comment; nothing else about it changes.
    pub async fn update_comment(
        &self,
        comment_id: i64,
        editor: &User,
        request: UpdateCommentRequest,
    ) -> Result<CommentWithAuthor> {
        request.validate()?;
        validate_comment_length(&request.text, self.max_comment_length)?;

        let mut tx = self.db.begin_transaction().await?;

        let author_id = Self::author_of(&mut tx, comment_id).await?;
        if !editor.can_edit(&author_id) {
            return Err(AppError::forbidden("You can only edit your own comments"));
        }

        sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(&request.text)
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("Comment {} edited by {}", comment_id, editor.id);

        self.get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))
    }

    /// Deletes a comment together with every reply beneath it. Returns the
    /// number of rows removed.
    pub async fn delete_comment(&self, comment_id: i64, actor: &User) -> Result<u64> {
        // 权限检查与删除在同一事务内
        let mut tx = self.db.begin_transaction().await?;

        let author_id = Self::author_of(&mut tx, comment_id).await?;
        if !actor.can_delete(&author_id) {
            return Err(AppError::forbidden("You can only delete your own comments"));
        }

        let replies = sqlx::query(
            r#"
            WITH RECURSIVE descendants(id) AS (
                SELECT id FROM comments WHERE parent_id = ?
                UNION ALL
                SELECT c.id FROM comments c JOIN descendants d ON c.parent_id = d.id
            )
            DELETE FROM comments WHERE id IN (SELECT id FROM descendants)
            "#,
        )
        .bind(comment_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let removed = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(AppError::not_found("Comment"));
        }

        tx.commit().await?;

        info!("Deleted comment {} and {} replies", comment_id, replies);
        Ok(removed + replies)
    }

    /// Removes every comment in the threads hanging off `owner`, replies
    /// included, inside the caller's transaction.
    pub(crate) async fn delete_threads_for_owner(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        owner: Owner,
    ) -> Result<u64> {
        let removed = sqlx::query(
            r#"
            WITH RECURSIVE thread(id) AS (
                SELECT id FROM comments WHERE owner_type = ? AND owner_id = ?
                UNION ALL
                SELECT c.id FROM comments c JOIN thread t ON c.parent_id = t.id
            )
            DELETE FROM comments WHERE id IN (SELECT id FROM thread)
            "#,
        )
        .bind(owner.kind())
        .bind(owner.id())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(removed)
    }

    /// Next batch of comments older than `last_visible_id`. An exhausted
    /// cursor gives an empty page rather than an error.
    pub async fn load_more(
        &self,
        owner: Owner,
        last_visible_id: i64,
        requested_count: usize,
    ) -> Result<CommentPage> {
        if requested_count == 0 {
            return Err(AppError::validation("Requested comment count must be positive"));
        }
        self.ensure_owner_exists(owner).await?;

        let pool_size = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments WHERE owner_type = ? AND owner_id = ? AND id < ?",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .bind(last_visible_id)
        .fetch_one(&self.db.pool)
        .await?;

        if pool_size == 0 {
            debug!("No comments left for {} before {}", owner, last_visible_id);
            return Ok(CommentPage {
                comments: Vec::new(),
                remaining: 0,
            });
        }

        let query = format!(
            "{} WHERE c.owner_type = ? AND c.owner_id = ? AND c.id < ? ORDER BY c.id DESC LIMIT ?",
            COMMENT_SELECT
        );
        let rows: Vec<CommentRow> = sqlx::query_as(&query)
            .bind(owner.kind())
            .bind(owner.id())
            .bind(last_visible_id)
            .bind(as_limit(requested_count))
            .fetch_all(&self.db.pool)
            .await?;

        let comments = rows
            .into_iter()
            .map(CommentWithAuthor::try_from)
            .collect::<Result<Vec<_>>>()?;
        let remaining = (pool_size as usize).saturating_sub(comments.len());

        debug!(
            "Loaded {} comments for {} before {}, {} remaining",
            comments.len(),
            owner,
            last_visible_id,
            remaining
        );

        Ok(CommentPage { comments, remaining })
    }

    pub async fn ensure_owner_exists(&self, owner: Owner) -> Result<()> {
        let (query, resource) = match owner {
            Owner::Article(_) => ("SELECT COUNT(*) FROM articles WHERE id = ?", "Article"),
            Owner::Comment(_) => ("SELECT COUNT(*) FROM comments WHERE id = ?", "Comment"),
        };

        let found = sqlx::query_scalar::<_, i64>(query)
            .bind(owner.id())
            .fetch_one(&self.db.pool)
            .await?;

        if found == 0 {
            return Err(AppError::not_found(resource));
        }
        Ok(())
    }

    // Helper methods
    async fn insert(
        &self,
        author: &User,
        text: &str,
        owner: Owner,
        parent_id: Option<i64>,
    ) -> Result<CommentWithAuthor> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (author_id, text, created_at, owner_type, owner_id, parent_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&author.id)
        .bind(text)
        .bind(Utc::now())
        .bind(owner.kind())
        .bind(owner.id())
        .bind(parent_id)
        .execute(&self.db.pool)
        .await?;

        self.get_comment(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::internal("Failed to create comment"))
    }

    async fn author_of(tx: &mut Transaction<'static, Sqlite>, comment_id: i64) -> Result<String> {
        sqlx::query_scalar::<_, String>("SELECT author_id FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))
    }

    fn check_enabled(&self) -> Result<()> {
        if !self.enable_comments {
            return Err(AppError::forbidden("Comments are disabled"));
        }
        Ok(())
    }
}

fn as_limit(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::article::CreateArticleRequest,
        services::{article::ArticleService, user::UserService},
    };

    struct Fixture {
        comments: CommentService,
        articles: ArticleService,
        author: User,
        other: User,
        staff: User,
    }

    async fn fixture() -> Fixture {
        fixture_with(Config::default()).await
    }

    async fn fixture_with(config: Config) -> Fixture {
        let db = Arc::new(Database::new_in_memory().await.unwrap());
        let users = UserService::new(db.clone());

        let author = User { id: "u1".to_string(), username: "ana".to_string(), is_staff: false };
        let other = User { id: "u2".to_string(), username: "ivo".to_string(), is_staff: false };
        let staff = User { id: "u3".to_string(), username: "editor".to_string(), is_staff: true };
        for user in [&author, &other, &staff] {
            users.ensure_user(user).await.unwrap();
        }

        let comments = CommentService::new(db.clone(), &config);
        let articles = ArticleService::new(db, comments.clone());
        Fixture { comments, articles, author, other, staff }
    }

    fn text(value: &str) -> CreateCommentRequest {
        CreateCommentRequest { text: value.to_string() }
    }

    async fn article(f: &Fixture, title: &str) -> i64 {
        f.articles
            .create_article(
                &f.staff,
                CreateArticleRequest { title: title.to_string(), text: "body".to_string() },
            )
            .await
            .unwrap()
            .id
    }

    fn ids(comments: &[CommentWithAuthor]) -> Vec<i64> {
        comments.iter().map(|c| c.comment.id).collect()
    }

    #[tokio::test]
    async fn test_scenario_comment_and_reply() {
        let f = fixture().await;
        let a = article(&f, "A").await;

        let x = f.comments.create_comment(Owner::Article(a), &f.author, text("hi")).await.unwrap();
        let y = f.comments.create_reply(x.comment.id, &f.other, text("hello back")).await.unwrap();

        assert_eq!(x.comment.parent_id, None);
        assert_eq!(x.comment.owner, Owner::Article(a));
        assert_eq!(y.comment.parent_id, Some(x.comment.id));
        assert_eq!(y.comment.owner, Owner::Comment(x.comment.id));
        assert_eq!(y.author_username, "ivo");

        let listed = f.comments.list_for_owner(Owner::Article(a)).await.unwrap();
        assert_eq!(ids(&listed), vec![x.comment.id]);
        assert_eq!(listed[0].reply_count, 1);

        let replies = f.comments.list_replies(x.comment.id).await.unwrap();
        assert_eq!(ids(&replies), vec![y.comment.id]);
    }

    #[tokio::test]
    async fn test_comment_owned_by_comment_becomes_reply() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let x = f.comments.create_comment(Owner::Article(a), &f.author, text("hi")).await.unwrap();

        let y = f
            .comments
            .create_comment(Owner::Comment(x.comment.id), &f.author, text("nested"))
            .await
            .unwrap();
        assert!(y.comment.is_reply());
        assert_eq!(y.comment.parent_id, Some(x.comment.id));
    }

    #[tokio::test]
    async fn test_listing_ignores_replies_sharing_an_article_id() {
        let f = fixture().await;
        let first = article(&f, "First").await;
        let second = article(&f, "Second").await;

        // comment ids 1 and 2 collide with the two article ids
        let c1 = f.comments.create_comment(Owner::Article(first), &f.author, text("one")).await.unwrap();
        let c2 = f.comments.create_comment(Owner::Article(first), &f.author, text("two")).await.unwrap();
        assert_eq!(c1.comment.id, first);
        assert_eq!(c2.comment.id, second);

        f.comments.create_reply(c2.comment.id, &f.other, text("reply to two")).await.unwrap();

        let on_second = f.comments.list_for_owner(Owner::Article(second)).await.unwrap();
        assert!(on_second.is_empty());
        assert_eq!(f.comments.count_for_owner(Owner::Article(second)).await.unwrap(), 0);

        let on_first = f.comments.list_for_owner(Owner::Article(first)).await.unwrap();
        assert_eq!(ids(&on_first), vec![c2.comment.id, c1.comment.id]);
        assert!(on_first.iter().all(|c| c.comment.parent_id.is_none()));
    }

    #[tokio::test]
    async fn test_validation_and_missing_owners() {
        let f = fixture().await;
        let a = article(&f, "A").await;

        let empty = f.comments.create_comment(Owner::Article(a), &f.author, text("")).await;
        assert!(matches!(empty, Err(AppError::ValidatorError(_))));

        let blank = f.comments.create_comment(Owner::Article(a), &f.author, text("   ")).await;
        assert!(matches!(blank, Err(AppError::ValidatorError(_))));

        let missing_article = f.comments.create_comment(Owner::Article(99), &f.author, text("hi")).await;
        assert!(matches!(missing_article, Err(AppError::NotFound(_))));

        let missing_parent = f.comments.create_reply(42, &f.author, text("hi")).await;
        assert!(matches!(missing_parent, Err(AppError::NotFound(_))));

        assert!(matches!(f.comments.list_replies(42).await, Err(AppError::NotFound(_))));
        assert_eq!(f.comments.count_for_owner(Owner::Article(a)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_comment_length_limit() {
        let f = fixture_with(Config { max_comment_length: 5, ..Config::default() }).await;
        let a = article(&f, "A").await;

        assert!(f.comments.create_comment(Owner::Article(a), &f.author, text("short")).await.is_ok());
        let long = f.comments.create_comment(Owner::Article(a), &f.author, text("too long")).await;
        assert!(matches!(long, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_disabled_comments() {
        let f = fixture_with(Config { enable_comments: false, ..Config::default() }).await;
        let a = article(&f, "A").await;

        let result = f.comments.create_comment(Owner::Article(a), &f.author, text("hi")).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_edit_changes_only_text() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let before = f.comments.create_comment(Owner::Article(a), &f.author, text("hi")).await.unwrap();

        let after = f
            .comments
            .update_comment(before.comment.id, &f.author, UpdateCommentRequest { text: "edited".to_string() })
            .await
            .unwrap();

        assert_eq!(after.comment.text, "edited");
        assert_eq!(after.comment.id, before.comment.id);
        assert_eq!(after.comment.created_at, before.comment.created_at);
        assert_eq!(after.comment.author_id, before.comment.author_id);
        assert_eq!(after.comment.owner, before.comment.owner);
        assert_eq!(after.comment.parent_id, before.comment.parent_id);
    }

    #[tokio::test]
    async fn test_edit_permissions() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let c = f.comments.create_comment(Owner::Article(a), &f.author, text("hi")).await.unwrap();
        let edit = || UpdateCommentRequest { text: "changed".to_string() };

        let stranger = f.comments.update_comment(c.comment.id, &f.other, edit()).await;
        assert!(matches!(stranger, Err(AppError::Authorization(_))));

        let missing = f.comments.update_comment(999, &f.author, edit()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let blank = f
            .comments
            .update_comment(c.comment.id, &f.author, UpdateCommentRequest { text: " ".to_string() })
            .await;
        assert!(matches!(blank, Err(AppError::ValidatorError(_))));

        let unchanged = f.comments.get_comment(c.comment.id).await.unwrap().unwrap();
        assert_eq!(unchanged.comment.text, "hi");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_replies() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let x = f.comments.create_comment(Owner::Article(a), &f.author, text("x")).await.unwrap();
        let sibling = f.comments.create_comment(Owner::Article(a), &f.other, text("s")).await.unwrap();
        let y = f.comments.create_reply(x.comment.id, &f.other, text("y")).await.unwrap();
        let z = f.comments.create_reply(y.comment.id, &f.author, text("z")).await.unwrap();

        let forbidden = f.comments.delete_comment(x.comment.id, &f.other).await;
        assert!(matches!(forbidden, Err(AppError::Authorization(_))));

        let removed = f.comments.delete_comment(x.comment.id, &f.author).await.unwrap();
        assert_eq!(removed, 3);

        for id in [x.comment.id, y.comment.id, z.comment.id] {
            assert!(f.comments.get_comment(id).await.unwrap().is_none());
        }
        assert!(f.comments.get_comment(sibling.comment.id).await.unwrap().is_some());

        let again = f.comments.delete_comment(x.comment.id, &f.author).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_staff_can_delete_any_comment() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let c = f.comments.create_comment(Owner::Article(a), &f.author, text("x")).await.unwrap();

        assert_eq!(f.comments.delete_comment(c.comment.id, &f.staff).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_deletes_remove_once() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let c = f.comments.create_comment(Owner::Article(a), &f.author, text("x")).await.unwrap();

        let (first, second) = tokio::join!(
            f.comments.delete_comment(c.comment.id, &f.author),
            f.comments.delete_comment(c.comment.id, &f.staff),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| matches!(r, Ok(1))).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(AppError::NotFound(_))))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_edit_after_delete_is_not_found() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let c = f.comments.create_comment(Owner::Article(a), &f.author, text("x")).await.unwrap();
        f.comments.delete_comment(c.comment.id, &f.author).await.unwrap();

        let edited = f
            .comments
            .update_comment(c.comment.id, &f.author, UpdateCommentRequest { text: "y".to_string() })
            .await;
        assert!(matches!(edited, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_load_more_returns_prefix_of_older_comments() {
        let f = fixture().await;
        let a = article(&f, "A").await;

        let mut created = Vec::new();
        for i in 1..=10 {
            let c = f
                .comments
                .create_comment(Owner::Article(a), &f.author, text(&format!("c{}", i)))
                .await
                .unwrap();
            created.push(c.comment.id);
        }
        let c = |n: usize| created[n - 1];

        let page = f.comments.load_more(Owner::Article(a), c(8), 2).await.unwrap();
        assert_eq!(ids(&page.comments), vec![c(7), c(6)]);
        assert_eq!(page.remaining, 5);

        let page = f.comments.load_more(Owner::Article(a), c(8), 6).await.unwrap();
        assert_eq!(ids(&page.comments), vec![c(7), c(6), c(5), c(4), c(3), c(2)]);
        assert_eq!(page.remaining, 1);

        let page = f.comments.load_more(Owner::Article(a), c(8), 50).await.unwrap();
        assert_eq!(page.comments.len(), 7);
        assert_eq!(page.remaining, 0);
    }

    #[tokio::test]
    async fn test_load_more_is_idempotent() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        for i in 0..6 {
            f.comments
                .create_comment(Owner::Article(a), &f.author, text(&format!("c{}", i)))
                .await
                .unwrap();
        }

        let first = f.comments.load_more(Owner::Article(a), 5, 3).await.unwrap();
        let second = f.comments.load_more(Owner::Article(a), 5, 3).await.unwrap();
        assert_eq!(ids(&first.comments), ids(&second.comments));
        assert_eq!(first.remaining, second.remaining);
    }

    #[tokio::test]
    async fn test_load_more_exhausted_and_invalid() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let only = f.comments.create_comment(Owner::Article(a), &f.author, text("c")).await.unwrap();

        let page = f.comments.load_more(Owner::Article(a), only.comment.id, 10).await.unwrap();
        assert!(page.comments.is_empty());
        assert_eq!(page.remaining, 0);

        let zero = f.comments.load_more(Owner::Article(a), only.comment.id, 0).await;
        assert!(matches!(zero, Err(AppError::Validation(_))));

        let missing = f.comments.load_more(Owner::Article(77), 10, 1).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_load_more_skips_replies() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let first = f.comments.create_comment(Owner::Article(a), &f.author, text("1")).await.unwrap();
        let second = f.comments.create_comment(Owner::Article(a), &f.author, text("2")).await.unwrap();
        f.comments.create_reply(first.comment.id, &f.other, text("r")).await.unwrap();
        let third = f.comments.create_comment(Owner::Article(a), &f.author, text("3")).await.unwrap();

        let page = f.comments.load_more(Owner::Article(a), third.comment.id, 10).await.unwrap();
        assert_eq!(ids(&page.comments), vec![second.comment.id, first.comment.id]);
    }

    #[tokio::test]
    async fn test_recent_for_owner_is_newest_first() {
        let f = fixture().await;
        let a = article(&f, "A").await;
        let mut created = Vec::new();
        for i in 0..7 {
            let c = f
                .comments
                .create_comment(Owner::Article(a), &f.author, text(&format!("c{}", i)))
                .await
                .unwrap();
            created.push(c.comment.id);
        }

        let recent = f.comments.recent_for_owner(Owner::Article(a), 5).await.unwrap();
        let expected: Vec<i64> = created.iter().rev().take(5).copied().collect();
        assert_eq!(ids(&recent), expected);
        assert_eq!(f.comments.count_for_owner(Owner::Article(a)).await.unwrap(), 7);
    }
}
