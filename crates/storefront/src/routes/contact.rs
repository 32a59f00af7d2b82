//! Contact form route handlers.
//!
//! Messages are relayed to the backend, which notifies the support team.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use eyewear_core::Email;
use serde::Deserialize;
use tracing::instrument;

use crate::api::ContactMessage;
use crate::filters;
use crate::services::PageContext;
use crate::state::AppState;

/// Longest message accepted.
const MAX_MESSAGE_CHARS: usize = 5_000;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub message: String,
}

/// Query parameters for the result notice.
#[derive(Debug, Deserialize)]
pub struct ContactQuery {
    pub sent: Option<bool>,
    pub error: Option<String>,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub page: PageContext,
    pub sent: bool,
    pub error: Option<String>,
}

fn validate(form: &ContactForm) -> Result<Email, &'static str> {
    if form.name.trim().is_empty() || form.message.trim().is_empty() {
        return Err("Name and message are required.");
    }
    if form.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err("Message is too long.");
    }
    Email::parse(&form.email).map_err(|_| "Please enter a valid email address.")
}

fn back_with_error(message: &str) -> Response {
    Redirect::to(&format!("/contact?error={}", urlencoding::encode(message))).into_response()
}

/// Display the contact page.
pub async fn page(page: PageContext, Query(query): Query<ContactQuery>) -> impl IntoResponse {
    ContactTemplate {
        page,
        sent: query.sent.unwrap_or(false),
        error: query.error,
    }
}

/// Submit the contact form.
#[instrument(skip(state, form))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Response {
    let email = match validate(&form) {
        Ok(email) => email,
        Err(message) => return back_with_error(message),
    };

    let subject = match form.subject.trim() {
        "" => "General enquiry",
        s => s,
    };

    let message = ContactMessage {
        name: form.name.trim(),
        email: email.as_str(),
        subject,
        message: form.message.trim(),
    };

    match state.api().send_contact(&message).await {
        Ok(()) => {
            tracing::info!(email = %email.as_str(), "Contact message sent");
            Redirect::to("/contact?sent=true").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to send contact message");
            back_with_error(&e.user_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            subject: String::new(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_validate_contact_form() {
        assert!(validate(&form("Ada", "ada@example.com", "Hello")).is_ok());
        assert!(validate(&form("", "ada@example.com", "Hello")).is_err());
        assert!(validate(&form("Ada", "not-an-email", "Hello")).is_err());
        assert!(validate(&form("Ada", "ada@example.com", &"x".repeat(6_000))).is_err());
    }
}
