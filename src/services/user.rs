use crate::{
    error::Result,
    services::{auth::User, Database},
};
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 确保用户记录存在，并同步用户名和管理员标记
    pub async fn ensure_user(&self, user: &User) -> Result<()> {
        debug!("Ensuring user record for {}", user.id);

        sqlx::query(
            r#"
            INSERT INTO users (id, username, is_staff, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                is_staff = excluded.is_staff
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(user.is_staff)
        .bind(Utc::now())
        .execute(&self.db.pool)
        .await?;

        Ok(())
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, is_staff FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            username: row.get("username"),
            is_staff: row.get("is_staff"),
        }))
    }
}
