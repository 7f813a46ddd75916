//! Server-rendered pages.
//!
//! Templates are compiled into the binary and registered once at startup.
//! Every page shares the `layout` partial, which draws the header from the
//! `header` context key.

pub mod handlers;

use axum::response::Html;
use handlebars::{Handlebars, TemplateError};
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::SessionIdentity;
use crate::errors::AppError;

const LAYOUT: &str = include_str!("../../templates/layout.hbs");

const TEMPLATES: &[(&str, &str)] = &[
    ("scanner", include_str!("../../templates/scanner.hbs")),
    ("login", include_str!("../../templates/login.hbs")),
    ("signup", include_str!("../../templates/signup.hbs")),
    ("forgot_password", include_str!("../../templates/forgot_password.hbs")),
    ("reset_password", include_str!("../../templates/reset_password.hbs")),
    ("profile", include_str!("../../templates/profile.hbs")),
];

/// Header state: signed-in controls with the profile popover, or a sign-in link.
#[derive(Debug, Clone, Serialize)]
pub struct HeaderView {
    pub signed_in: bool,
    pub display_name: String,
    pub email: String,
    pub short_id: String,
}

impl HeaderView {
    pub fn new(session: Option<&SessionIdentity>) -> Self {
        match session {
            Some(identity) => Self {
                signed_in: true,
                display_name: identity.display_name().to_string(),
                email: identity.email_or_unknown().to_string(),
                short_id: identity.short_id(),
            },
            None => Self {
                signed_in: false,
                display_name: "Guest User".to_string(),
                email: "N/A".to_string(),
                short_id: "N/A".to_string(),
            },
        }
    }
}

pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_partial("layout", LAYOUT)?;
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, *source)?;
        }
        Ok(Self { registry })
    }

    /// Renders `name` with `data` merged over the shared header context.
    pub fn render(
        &self,
        name: &str,
        session: Option<&SessionIdentity>,
        data: Value,
    ) -> Result<Html<String>, AppError> {
        let mut context = json!({ "header": HeaderView::new(session) });
        if let (Some(target), Value::Object(extra)) = (context.as_object_mut(), data) {
            target.extend(extra);
        }
        Ok(Html(self.registry.render(name, &context)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jo() -> SessionIdentity {
        SessionIdentity::new(
            "0123456789abcdef",
            Some("jo@x.com".to_string()),
            Some("Jo".to_string()),
        )
    }

    #[test]
    fn test_all_templates_register() {
        assert!(Pages::new().is_ok());
    }

    #[test]
    fn test_header_for_signed_in_user() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render("login", Some(&jo()), json!({ "email": "" }))
            .unwrap()
            .0;
        assert!(html.contains("Sign Out"));
        assert!(html.contains("01234567"));
        assert!(!html.contains("0123456789abcdef"));
    }

    #[test]
    fn test_header_for_guest() {
        let pages = Pages::new().unwrap();
        let html = pages.render("login", None, json!({})).unwrap().0;
        assert!(html.contains("Sign In"));
        assert!(!html.contains("Sign Out"));
    }

    #[test]
    fn test_header_falls_back_when_claims_missing() {
        let header = HeaderView::new(Some(&SessionIdentity::new("x", None, None)));
        assert_eq!(header.display_name, "Guest User");
        assert_eq!(header.email, "N/A");
    }

    #[test]
    fn test_values_are_html_escaped() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render("login", None, json!({ "error": "<script>alert(1)</script>" }))
            .unwrap()
            .0;
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
