//! HTML pages, rendered from the askama templates under `templates/`.

use askama::Template;
use axum::response::{Html, IntoResponse, Response};

use crate::error::ApiError;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub error: Option<&'a str>,
}

impl LoginTemplate<'_> {
    pub fn blank() -> Self {
        LoginTemplate { error: None }
    }

    pub fn rejected() -> Self {
        LoginTemplate {
            error: Some(INVALID_CREDENTIALS),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub principal: &'a str,
}

fn render_html(template: &impl Template) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            ApiError::Internal(format!("template rendering failed: {error}")).into_response()
        }
    }
}

impl IntoResponse for LoginTemplate<'_> {
    fn into_response(self) -> Response {
        render_html(&self)
    }
}

impl IntoResponse for IndexTemplate<'_> {
    fn into_response(self) -> Response {
        render_html(&self)
    }
}
