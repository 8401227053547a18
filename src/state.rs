use crate::{
    config::Config,
    error::Result,
    services::{
        article::ArticleService,
        auth::AuthService,
        comment::CommentService,
        database::Database,
        user::UserService,
    },
    utils::{pagination::LoadMorePolicy, templates::Templates},
};
use std::sync::Arc;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    /// 片段模板
    pub templates: Templates,

    /// 认证服务
    pub auth_service: AuthService,

    /// 用户服务
    pub user_service: UserService,

    /// 文章服务
    pub article_service: ArticleService,

    /// 评论服务
    pub comment_service: CommentService,
}

impl AppState {
    /// 初始化所有服务
    pub fn new(config: Config, db: Arc<Database>) -> Result<Self> {
        let comment_service = CommentService::new(db.clone(), &config);

        Ok(Self {
            templates: Templates::new()?,
            auth_service: AuthService::new(&config),
            user_service: UserService::new(db.clone()),
            article_service: ArticleService::new(db.clone(), comment_service.clone()),
            comment_service,
            db,
            config,
        })
    }

    /// 获取评论分页配置
    pub fn load_more_policy(&self) -> LoadMorePolicy {
        LoadMorePolicy::from_config(&self.config)
    }

    /// 拼接登录跳转地址，`next` 指回原始请求
    pub fn login_redirect(&self, next: &str) -> String {
        let separator = if self.config.login_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}next={}",
            self.config.login_url,
            separator,
            urlencoding::encode(next)
        )
    }
}
