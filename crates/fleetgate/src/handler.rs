//! HTTP routes: the edge middleware, protected pages, and login/logout.
//!
//! Every request first passes the edge filter. Protected pages then run
//! the access gate with the page's capability key:
//!   1. Allow     → render the page
//!   2. Login     → 303 to the login page with `next` set
//!   3. Forbidden → 303 to the forbidden page
//!
//! Handlers never surface internal error detail to the browser.

use axum::extract::{Query, Request, State};
use axum::http::{StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use fleetgate_access::{EdgeVerdict, login_location};
use fleetgate_protocol::{AccessOutcome, CapabilityKey};
use fleetgate_session::Authenticator;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Builds every route, wrapped in the edge filter and request tracing.
pub(crate) fn routes(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout))
        .route("/forbidden", get(forbidden))
        .route("/api/public/health", get(health));

    for key in CapabilityKey::ALL {
        let handler = move |State(state): State<AppState>, jar: CookieJar, uri: Uri| {
            protected_page(state, jar, uri, key)
        };
        router = router
            .route(key.as_str(), get(handler.clone()))
            .route(&format!("{}/*rest", key.as_str()), get(handler));
    }

    router
        .layer(middleware::from_fn_with_state(state.clone(), edge_filter))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Edge middleware
// ---------------------------------------------------------------------------

async fn edge_filter(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let cookie = jar.get(&state.config.access.session_cookie);
    match state
        .edge
        .check(request.uri().path(), cookie.as_ref().map(|c| c.value()))
    {
        EdgeVerdict::Continue => next.run(request).await,
        EdgeVerdict::RedirectLogin { location } => Redirect::to(&location).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Protected pages
// ---------------------------------------------------------------------------

async fn protected_page(state: AppState, jar: CookieJar, uri: Uri, key: CapabilityKey) -> Response {
    let access = &state.config.access;
    let ctx = state.request_context(
        uri.path(),
        cookie_value(&jar, &access.session_cookie),
        cookie_value(&jar, &access.scope_cookie),
    );

    match state.gate.check(&state.store, &ctx, key.as_str()).await {
        AccessOutcome::Allow => Html(page(key.as_str(), &format!("<h1>{key}</h1>"))).into_response(),
        AccessOutcome::Login { next } => {
            Redirect::to(&login_location(&access.login_path, &next)).into_response()
        }
        AccessOutcome::Forbidden => Redirect::to(&access.forbidden_path).into_response(),
    }
}

async fn root(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.config.home_path)
}

async fn forbidden() -> (StatusCode, Html<String>) {
    (
        StatusCode::FORBIDDEN,
        Html(page(
            "Forbidden",
            "<h1>Forbidden</h1><p>Your account does not have access to this area.</p>",
        )),
    )
}

async fn health() -> &'static str {
    "ok"
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginQuery {
    next: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: Option<String>,
}

async fn login_page(State(state): State<AppState>, Query(query): Query<LoginQuery>) -> Html<String> {
    Html(login_form(&state, query.next.as_deref().unwrap_or_default(), None))
}

async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = form.next.unwrap_or_default();

    let user_id = match state.store.authenticate(&form.username, &form.password).await {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::info!(username = %form.username, error = %e, "login rejected");
            return (
                StatusCode::UNAUTHORIZED,
                Html(login_form(&state, &next, Some("Invalid username or password"))),
            )
                .into_response();
        }
    };

    let created = state.store.write().await.create_session(user_id, Utc::now());
    let session = match created {
        Ok(session) => session,
        Err(e) => {
            // The user was removed between authenticate and here.
            tracing::warn!(%user_id, error = %e, "could not create session");
            return (
                StatusCode::UNAUTHORIZED,
                Html(login_form(&state, &next, Some("Invalid username or password"))),
            )
                .into_response();
        }
    };

    let cookie = Cookie::build((state.config.access.session_cookie.clone(), session.token))
        .path("/")
        .http_only(true)
        .secure(state.config.access.cookie_secure)
        .same_site(SameSite::Lax);

    let target = if is_local_path(&next) {
        next
    } else {
        state.config.home_path.clone()
    };
    (jar.add(cookie), Redirect::to(&target)).into_response()
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let access = &state.config.access;
    if let Some(token) = cookie_value(&jar, &access.session_cookie) {
        if let Err(e) = state.store.write().await.destroy_session(&token) {
            tracing::debug!(error = %e, "logout with no matching session");
        }
    }

    let jar = jar
        .remove(Cookie::build((access.session_cookie.clone(), "")).path("/"))
        .remove(Cookie::build((access.scope_cookie.clone(), "")).path("/"));
    (jar, Redirect::to(&access.login_path)).into_response()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|cookie| cookie.value().to_string())
}

/// Only same-origin absolute paths are followed after login. Anything
/// else (`//host`, `https://…`, backslash tricks, whitespace or control
/// characters that browsers strip) falls back to home.
fn is_local_path(next: &str) -> bool {
    if !next.bytes().all(|b| b.is_ascii_graphic()) {
        return false;
    }
    if !next.starts_with('/') || next.starts_with("//") || next.contains('\\') {
        return false;
    }
    match next.parse::<Uri>() {
        Ok(uri) => uri.scheme().is_none() && uri.authority().is_none(),
        Err(_) => false,
    }
}

fn login_form(state: &AppState, next: &str, error: Option<&str>) -> String {
    let error = error
        .map(|msg| format!("<p class=\"error\">{}</p>", escape_html(msg)))
        .unwrap_or_default();
    let body = format!(
        "<h1>Sign in</h1>{error}\
         <form method=\"post\" action=\"{action}\">\
         <input type=\"hidden\" name=\"next\" value=\"{next}\">\
         <label>Username <input name=\"username\" autocomplete=\"username\"></label>\
         <label>Password <input name=\"password\" type=\"password\" autocomplete=\"current-password\"></label>\
         <button type=\"submit\">Sign in</button>\
         </form>",
        action = escape_html(&state.config.access.login_path),
        next = escape_html(next),
    );
    page("Sign in", &body)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body>{body}</body></html>",
        escape_html(title)
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
