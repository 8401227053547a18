use crate::{
    error::{field_messages, Result},
    models::{
        article::ArticlePageView,
        comment::{CommentSectionView, CommentView},
    },
};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use validator::ValidationErrors;

const COMMENT: &str = r#"<div class="comment{{#if is_reply}} reply{{/if}}" id="{{id}}"{{#if parent_id}} data-parent-id="{{parent_id}}"{{/if}}>
  <div class="comment-meta"><strong>{{author_username}}</strong> <span class="comment-date">{{created_on}}</span></div>
  <p class="comment-text">{{text}}</p>
  {{#if can_edit}}<button class="edit-button" data-url="/api/comments/{{id}}/edit">Edit</button>{{/if}}
  {{#if can_delete}}<button class="delete-button" data-url="/api/comments/{{id}}/delete">Delete</button>{{/if}}
  <a class="show-replies" data-url="/api/comments/{{id}}/replies">{{replies_label}}</a>
</div>
"#;

const COMMENT_LIST: &str = r#"{{#each comments}}{{> comment}}{{/each}}"#;

const COMMENTS_SECTION: &str = r#"<section class="comments" data-owner-kind="{{owner_kind}}" data-owner-id="{{owner_id}}" data-comments-count="{{total}}">
  <h4>Comments</h4>
  {{#if total}}<p><strong>{{count_label}}</strong></p>{{else}}<p>{{count_label}}</p>{{/if}}
  {{#if login_url}}
  <p><a href="{{login_url}}">Login</a> to leave a comment.</p>
  {{else}}
  <form class="comment-form" method="post" action="/api/owners/{{owner_kind}}/{{owner_id}}/comments">
    <textarea name="text" rows="2" placeholder="Your comment..." required></textarea>
    <button type="submit" class="button white btn-sm">Comment</button>
  </form>
  {{/if}}
  <div class="comment-list">{{#each comments}}{{> comment}}{{/each}}</div>
  {{#if load_more_label}}
  <div id="load-more-button-container">
    <button class="load-more-comments" data-url="/api/owners/{{owner_kind}}/{{owner_id}}/comments/more">{{load_more_label}}</button>
  </div>
  {{/if}}
</section>
"#;

const FORM_ERRORS: &str = r#"<form class="comment-form has-errors">
  <ul class="errorlist">{{#each errors}}<li data-field="{{field}}">{{message}}</li>{{/each}}</ul>
  <textarea name="text" rows="2"></textarea>
  <button type="submit" class="button white btn-sm">Comment</button>
</form>
"#;

const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{{title}}</title></head>
<body>
  <article id="article-{{id}}">
    <h1>{{title}}</h1>
    <p class="article-date">{{published_on}}</p>
    <div class="article-text">{{text}}</div>
  </article>
  {{{comments_section}}}
</body>
</html>
"#;

const TEMPLATES: &[(&str, &str)] = &[
    ("comment", COMMENT),
    ("comment_list", COMMENT_LIST),
    ("comments_section", COMMENTS_SECTION),
    ("form_errors", FORM_ERRORS),
    ("article_page", ARTICLE_PAGE),
];

#[derive(Debug, Serialize)]
struct FieldErrorView {
    field: String,
    message: String,
}

/// HTML fragments answered to the AJAX front-end. Values are escaped by
/// handlebars; only the pre-rendered comments section is inserted raw.
#[derive(Clone)]
pub struct Templates {
    registry: Arc<Handlebars<'static>>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        for (name, source) in TEMPLATES.iter() {
            registry.register_template_string(name, *source)?;
        }
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        Ok(self.registry.render(name, data)?)
    }

    pub fn render_comment(&self, comment: &CommentView) -> Result<String> {
        self.render("comment", comment)
    }

    pub fn render_comment_list(&self, comments: &[CommentView]) -> Result<String> {
        self.render("comment_list", &json!({ "comments": comments }))
    }

    pub fn render_section(&self, section: &CommentSectionView) -> Result<String> {
        self.render("comments_section", section)
    }

    pub fn render_form_errors(&self, errors: &ValidationErrors) -> Result<String> {
        let errors: Vec<FieldErrorView> = field_messages(errors)
            .into_iter()
            .flat_map(|(field, messages)| {
                messages.into_iter().map(move |message| FieldErrorView {
                    field: field.clone(),
                    message,
                })
            })
            .collect();
        self.render("form_errors", &json!({ "errors": errors }))
    }

    pub fn render_article_page(&self, page: &ArticlePageView) -> Result<String> {
        self.render("article_page", page)
    }
}
