pub mod database;
pub mod auth;
pub mod user;
pub mod article;
pub mod comment;

// 重新导出常用类型
pub use database::Database;
pub use auth::AuthService;
pub use user::UserService;
pub use article::ArticleService;
pub use comment::CommentService;
