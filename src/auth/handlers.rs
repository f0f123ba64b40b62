//! Authentication handlers for login, register, and logout.

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::middleware::{removal_cookie, session_cookie, SESSION_COOKIE_NAME};
use super::password;
use crate::config::MIN_PASSWORD_LEN;
use crate::db::{self, NewUser};
use crate::progression;
use crate::state::AppState;

/// Login and registration share one page
#[derive(Template)]
#[template(path = "login.html")]
pub struct AuthTemplate {
    pub is_register: bool,
    pub error: Option<String>,
}

impl AuthTemplate {
    fn page(is_register: bool, error: Option<&str>) -> Html<String> {
        let template = AuthTemplate {
            is_register,
            error: error.map(String::from),
        };
        Html(template.render().unwrap_or_default())
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

const INVALID_LOGIN: &str = "Invalid username or password";

/// GET /login - Show login page
pub async fn login_page() -> Html<String> {
    AuthTemplate::page(false, None)
}

/// POST /login - Process login
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let credentials = {
        let conn = match db::try_lock(&state.db) {
            Ok(conn) => conn,
            Err(_) => return AuthTemplate::page(false, Some("Database error")).into_response(),
        };
        db::get_credentials(&conn, form.username.trim())
    };

    let (user_id, password_hash) = match credentials {
        Ok(Some(found)) => found,
        Ok(None) => return AuthTemplate::page(false, Some(INVALID_LOGIN)).into_response(),
        Err(e) => {
            tracing::error!("Login lookup failed: {}", e);
            return AuthTemplate::page(false, Some("Database error")).into_response();
        }
    };

    if !password::verify_password(&form.password, &password_hash) {
        return AuthTemplate::page(false, Some(INVALID_LOGIN)).into_response();
    }

    start_session(&state, jar, user_id)
}

/// GET /register - Show registration page
pub async fn register_page() -> Html<String> {
    AuthTemplate::page(true, None)
}

/// POST /register - Create the account, seed progress, log in
pub async fn register_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Err(message) = validate_registration(&form) {
        return AuthTemplate::page(true, Some(message)).into_response();
    }

    // Hash before taking the lock; Argon2 is deliberately slow
    let password_hash = match password::hash_password(&form.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
        }
    };

    let created = {
        let conn = match db::try_lock(&state.db) {
            Ok(conn) => conn,
            Err(_) => return AuthTemplate::page(true, Some("Database error")).into_response(),
        };
        create_account(&conn, &state, &form, &password_hash)
    };

    match created {
        Ok(user_id) => {
            tracing::info!("Registered user {} ({})", form.username.trim(), user_id);
            start_session(&state, jar, user_id)
        }
        Err(AccountError::Taken) => {
            AuthTemplate::page(true, Some("Username or email already taken")).into_response()
        }
        Err(AccountError::Storage(e)) => {
            tracing::error!("Registration failed: {}", e);
            AuthTemplate::page(true, Some("Database error")).into_response()
        }
    }
}

/// POST /logout - Revoke the session and clear the cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state.sessions.delete(cookie.value());
    }
    (jar.remove(removal_cookie()), Redirect::to("/"))
}

enum AccountError {
    Taken,
    Storage(String),
}

fn create_account(
    conn: &rusqlite::Connection,
    state: &AppState,
    form: &RegisterForm,
    password_hash: &str,
) -> Result<i64, AccountError> {
    let username = form.username.trim();
    let email = form.email.trim();

    match db::user_exists(conn, username, email) {
        Ok(true) => return Err(AccountError::Taken),
        Ok(false) => {}
        Err(e) => return Err(AccountError::Storage(e.to_string())),
    }

    let user_id = db::create_user(
        conn,
        &NewUser {
            username,
            email,
            display_name: form.display_name.trim(),
            password_hash,
        },
    )
    .map_err(|e| {
        if db::is_unique_violation(&e) {
            AccountError::Taken
        } else {
            AccountError::Storage(e.to_string())
        }
    })?;

    progression::initialize_user(conn, &state.catalog, user_id)
        .map_err(|e| AccountError::Storage(e.to_string()))?;

    Ok(user_id)
}

fn start_session(state: &AppState, jar: CookieJar, user_id: i64) -> Response {
    match state.sessions.create(user_id) {
        Ok(token) => (jar.add(session_cookie(token)), Redirect::to("/")).into_response(),
        Err(e) => {
            tracing::error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

/// All fields present, password long enough
fn validate_registration(form: &RegisterForm) -> Result<(), &'static str> {
    if [&form.display_name, &form.username, &form.email]
        .iter()
        .any(|field| field.trim().is_empty())
        || form.password.is_empty()
    {
        return Err("All fields are required");
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(display_name: &str, username: &str, email: &str, password: &str) -> RegisterForm {
        RegisterForm {
            display_name: display_name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_registration(&form("Ana", "ana", "ana@example.com", "secret")).is_ok());
        assert!(validate_registration(&form("Ana", "ana", "ana@example.com", "dugačka lozinka")).is_ok());
    }

    #[test]
    fn test_invalid_registration() {
        assert_eq!(
            validate_registration(&form("", "ana", "ana@example.com", "secret")),
            Err("All fields are required")
        );
        assert_eq!(
            validate_registration(&form("Ana", "   ", "ana@example.com", "secret")),
            Err("All fields are required")
        );
        assert_eq!(
            validate_registration(&form("Ana", "ana", "ana@example.com", "")),
            Err("All fields are required")
        );
        assert_eq!(
            validate_registration(&form("Ana", "ana", "ana@example.com", "12345")),
            Err("Password must be at least 6 characters")
        );
    }
}
