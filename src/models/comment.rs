use crate::error::{AppError, Result};
use crate::utils::validation::validate_not_blank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// The entity a comment hangs off: an article for top-level comments, another
/// comment for replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Owner {
    Article(i64),
    Comment(i64),
}

impl Owner {
    pub const ARTICLE: &'static str = "article";
    pub const COMMENT: &'static str = "comment";

    /// Rebuilds an owner from its stored `(owner_type, owner_id)` pair.
    pub fn from_parts(kind: &str, id: i64) -> Result<Self> {
        match kind {
            Self::ARTICLE => Ok(Owner::Article(id)),
            Self::COMMENT => Ok(Owner::Comment(id)),
            other => Err(AppError::NotFound(format!("Unknown comment owner type: {}", other))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Owner::Article(_) => Self::ARTICLE,
            Owner::Comment(_) => Self::COMMENT,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Owner::Article(id) | Owner::Comment(id) => *id,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub owner: Owner,
    pub parent_id: Option<i64>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_username: String,
    pub reply_count: i64,
}

/// Raw `comments` row joined with the author name and direct reply count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub author_id: String,
    pub author_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub owner_type: String,
    pub owner_id: i64,
    pub parent_id: Option<i64>,
    pub reply_count: i64,
}

impl TryFrom<CommentRow> for CommentWithAuthor {
    type Error = AppError;

    fn try_from(row: CommentRow) -> Result<Self> {
        let owner = Owner::from_parts(&row.owner_type, row.owner_id)
            .map_err(|_| AppError::Internal(format!("Comment {} has owner type {}", row.id, row.owner_type)))?;

        let consistent = match (owner, row.parent_id) {
            (Owner::Article(_), None) => true,
            (Owner::Comment(owner_id), Some(parent_id)) => owner_id == parent_id,
            _ => false,
        };
        if !consistent {
            return Err(AppError::Internal(format!(
                "Comment {} owner {} disagrees with parent {:?}",
                row.id, owner, row.parent_id
            )));
        }

        Ok(CommentWithAuthor {
            comment: Comment {
                id: row.id,
                author_id: row.author_id,
                text: row.text,
                created_at: row.created_at,
                owner,
                parent_id: row.parent_id,
            },
            author_username: row.author_username,
            reply_count: row.reply_count,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(
        length(min = 1, message = "This field is required."),
        custom = "validate_not_blank"
    )]
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(
        length(min = 1, message = "This field is required."),
        custom = "validate_not_blank"
    )]
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadMoreQuery {
    pub last_visible_id: i64,
    pub count: Option<usize>,
}

/// One "load more" batch.
#[derive(Debug, Clone, Serialize)]
pub struct CommentPage {
    pub comments: Vec<CommentWithAuthor>,
    /// Comments still older than the last one in this page.
    pub remaining: usize,
}

/// What the HTML fragments get to see of a comment.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub author_username: String,
    pub text: String,
    pub created_on: String,
    pub is_reply: bool,
    pub parent_id: Option<i64>,
    pub reply_count: i64,
    pub replies_label: String,
    pub can_edit: bool,
    pub can_delete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentSectionView {
    pub owner_kind: String,
    pub owner_id: i64,
    pub total: i64,
    pub count_label: String,
    pub comments: Vec<CommentView>,
    pub load_more_label: Option<String>,
    pub login_url: Option<String>,
}
