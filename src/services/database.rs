use crate::config::Config;
use crate::error::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Sqlite, Transaction,
};
use std::str::FromStr;
use tracing::{debug, error, info};

/// 建表语句，按顺序执行
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        is_staff INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL UNIQUE,
        text TEXT NOT NULL,
        author_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id TEXT NOT NULL REFERENCES users(id),
        text TEXT NOT NULL CHECK (length(trim(text)) > 0),
        created_at TEXT NOT NULL,
        owner_type TEXT NOT NULL CHECK (owner_type IN ('article', 'comment')),
        owner_id INTEGER NOT NULL,
        parent_id INTEGER REFERENCES comments(id),
        CHECK (
            (owner_type = 'article' AND parent_id IS NULL)
            OR (owner_type = 'comment' AND parent_id = owner_id)
        )
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_comments_owner ON comments(owner_type, owner_id, id DESC)",
    "CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_id)",
];

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if is_memory_url(&config.database_url) {
            // 内存数据库只存在于单个连接中，连接池必须固定为一个常驻连接
            memory_pool_options().connect_with(options).await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.database_max_connections.max(1))
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// 创建内存数据库（测试使用）
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = memory_pool_options().connect_with(options).await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(e.into())
            }
        }
    }

    /// 创建表结构
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            debug!("Executing schema statement: {}", statement.trim());
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }

    /// 开始事务
    pub async fn begin_transaction(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn memory_pool_options() -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_connection() {
        let config = Config::default();
        let db = Database::new(&config).await.unwrap();
        assert!(db.verify_connection().await.is_ok());
        assert!(db.migrate().await.is_ok());
    }

    #[tokio::test]
    async fn test_migrate_is_repeatable() {
        let db = Database::new_in_memory().await.unwrap();
        assert!(db.migrate().await.is_ok());
    }

    #[tokio::test]
    async fn test_schema_rejects_inconsistent_reply() {
        let db = Database::new_in_memory().await.unwrap();
        sqlx::query("INSERT INTO users (id, username, is_staff, created_at) VALUES ('u1', 'ana', 0, '2024-01-01')")
            .execute(&db.pool)
            .await
            .unwrap();

        // 回复的 parent_id 与 owner_id 不一致
        let result = sqlx::query(
            "INSERT INTO comments (author_id, text, created_at, owner_type, owner_id, parent_id)
             VALUES ('u1', 'x', '2024-01-01', 'comment', 1, 2)",
        )
        .execute(&db.pool)
        .await;
        assert!(result.is_err());

        // 顶层评论不能带 parent_id
        let result = sqlx::query(
            "INSERT INTO comments (author_id, text, created_at, owner_type, owner_id, parent_id)
             VALUES ('u1', 'x', '2024-01-01', 'article', 1, 1)",
        )
        .execute(&db.pool)
        .await;
        assert!(result.is_err());
    }
}
