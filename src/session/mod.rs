//! Session-based authentication
//!
//! Login works against a credential form rather than an API: fetch the login
//! page, locate the first input-bearing form, lift the anti-forgery token
//! and field names out of it, submit a form-encoded POST, then verify by
//! fetching an authenticated-only page and checking for a signed-in marker.
//!
//! Auth failures are not self-healing within one run, so every failure mode
//! is an explicit value the caller must treat as "abort the authenticated
//! workflow" — never retried.

use crate::config::AuthConfig;
use reqwest::header::{ORIGIN, REFERER};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Field names the anti-forgery token may be declared under.
pub const TOKEN_FIELD_ALIASES: [&str; 2] = ["post_key", "csrf_token"];

const DEFAULT_USERNAME_FIELD: &str = "login_id";
const DEFAULT_PASSWORD_FIELD: &str = "password";

/// Login failure modes
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login page unreachable: {reason}")]
    PageUnreachable { reason: String },

    #[error("no input-bearing form found on the login page")]
    FormNotFound,

    #[error("login submission rejected: {reason}")]
    SubmissionRejected { reason: String },

    #[error("login verification failed: no signed-in marker present")]
    VerificationFailed,
}

/// Account credentials for the authenticated workflow.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// An authenticated session: a cookie-jar-owning client plus the username
/// used to establish it.
///
/// The session lives for one crawl run and is discarded at process exit.
/// Responses may update the cookie jar as a side effect; nothing else
/// mutates session state.
pub struct Session {
    client: Client,
    username: String,
}

impl Session {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Performs the credential login flow.
///
/// The client must have been built with a cookie store; the session cookies
/// set during login are what authenticate every later request.
pub async fn login(
    client: Client,
    auth: &AuthConfig,
    credentials: &Credentials,
) -> Result<Session, AuthError> {
    // Step 1: fetch the login page
    tracing::info!("Fetching login page {}", auth.login_url);
    let response = client
        .get(&auth.login_url)
        .send()
        .await
        .map_err(|e| AuthError::PageUnreachable {
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(AuthError::PageUnreachable {
            reason: format!("status {}", response.status()),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| AuthError::PageUnreachable {
            reason: e.to_string(),
        })?;

    // Step 2: locate the form and its metadata
    let form = parse_login_form(&body).ok_or(AuthError::FormNotFound)?;

    let action = form
        .action
        .as_deref()
        .and_then(|action| resolve_action(action, &auth.login_url))
        .unwrap_or_else(|| auth.fallback_action.clone());
    tracing::debug!("Submitting login form to {}", action);

    // Step 3: compose the payload
    let (username_field, password_field) = match &form.fields {
        FieldNames::Declared { username, password } => (username.clone(), password.clone()),
        FieldNames::Defaults => (
            DEFAULT_USERNAME_FIELD.to_string(),
            DEFAULT_PASSWORD_FIELD.to_string(),
        ),
    };

    let mut payload: Vec<(String, String)> = vec![
        (username_field, credentials.username.clone()),
        (password_field, credentials.password.clone()),
    ];
    for (name, value) in &auth.extra_fields {
        payload.push((name.clone(), value.clone()));
    }
    if let Some((name, value)) = form.token {
        payload.push((name, value));
    } else {
        tracing::warn!("No anti-forgery token found on the login form");
    }

    // Step 4: submit
    let mut request = client
        .post(&action)
        .form(&payload)
        .header(REFERER, auth.login_url.clone());
    if let Some(origin) = origin_of(&auth.login_url) {
        request = request.header(ORIGIN, origin);
    }

    let response = request
        .send()
        .await
        .map_err(|e| AuthError::SubmissionRejected {
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(AuthError::SubmissionRejected {
            reason: format!("status {}", response.status()),
        });
    }

    // Step 5: verify against an authenticated-only page
    verify(&client, auth, &credentials.username).await?;

    tracing::info!("Signed in as {}", credentials.username);
    Ok(Session {
        client,
        username: credentials.username.clone(),
    })
}

async fn verify(client: &Client, auth: &AuthConfig, username: &str) -> Result<(), AuthError> {
    let response = client
        .get(&auth.verify_url)
        .send()
        .await
        .map_err(|_| AuthError::VerificationFailed)?;

    let body = response
        .text()
        .await
        .map_err(|_| AuthError::VerificationFailed)?;

    if is_signed_in(&body, &auth.logout_marker, username) {
        Ok(())
    } else {
        Err(AuthError::VerificationFailed)
    }
}

/// Checks a page body for evidence of a signed-in state: a logout affordance
/// or the username, case-insensitively.
fn is_signed_in(body: &str, logout_marker: &str, username: &str) -> bool {
    let body = body.to_lowercase();
    body.contains(&logout_marker.to_lowercase()) || body.contains(&username.to_lowercase())
}

/// Username/password field resolution strategy: structured lookup from form
/// metadata when it is declared, a fixed default mapping otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldNames {
    Declared { username: String, password: String },
    Defaults,
}

/// What the login form declares.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub action: Option<String>,
    /// Anti-forgery token as (field name, value), kept under the alias it
    /// was discovered as
    pub token: Option<(String, String)>,
    pub fields: FieldNames,
}

/// Locates the first input-bearing form and lifts out its metadata.
pub fn parse_login_form(body: &str) -> Option<LoginForm> {
    let document = Html::parse_document(body);
    let form_sel = Selector::parse("form").ok()?;
    let input_sel = Selector::parse("input").ok()?;

    let form = document
        .select(&form_sel)
        .find(|form| form.select(&input_sel).next().is_some())?;

    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let mut token = None;
    for input in form.select(&input_sel) {
        if let (Some(name), Some(value)) = (input.value().attr("name"), input.value().attr("value"))
        {
            if TOKEN_FIELD_ALIASES.contains(&name) {
                token = Some((name.to_string(), value.to_string()));
                break;
            }
        }
    }

    let fields = resolve_field_names(&form, &input_sel);

    Some(LoginForm {
        action,
        token,
        fields,
    })
}

fn resolve_field_names(form: &ElementRef, input_sel: &Selector) -> FieldNames {
    let mut username = None;
    let mut password = None;

    for input in form.select(input_sel) {
        let autocomplete = input.value().attr("autocomplete").unwrap_or("");
        let name = input.value().attr("name");

        if autocomplete.contains("username") && username.is_none() {
            username = name.map(str::to_string);
        }
        if autocomplete.contains("password") && password.is_none() {
            password = name.map(str::to_string);
        }
    }

    match (username, password) {
        (Some(username), Some(password)) => FieldNames::Declared { username, password },
        _ => FieldNames::Defaults,
    }
}

/// Resolves a form action to an absolute URL against the login page.
fn resolve_action(action: &str, login_url: &str) -> Option<String> {
    let base = Url::parse(login_url).ok()?;
    base.join(action).ok().map(|url| url.to_string())
}

fn origin_of(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    Some(url.origin().ascii_serialization())
}
