//! Shared-password login and the session cookie

use crate::config::AuthConfig;
use crate::errors::{DashboardError, Result};
use crate::metrics::LOGIN_ATTEMPTS_TOTAL;
use crate::state::AppState;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

/// Cookie value marking an authenticated browser
pub const SESSION_VALUE: &str = "authenticated";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

/// Check a submitted password against the configured one
pub fn verify_password(auth: &AuthConfig, submitted: &str) -> Result<()> {
    let expected = auth
        .admin_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| DashboardError::Misconfigured("ADMIN_PASSWORD not configured".to_string()))?;

    if constant_time_eq(expected.as_bytes(), submitted.as_bytes()) {
        Ok(())
    } else {
        Err(DashboardError::Unauthorized("Invalid password".to_string()))
    }
}

pub fn session_cookie(auth: &AuthConfig) -> Cookie<'static> {
    Cookie::build(auth.cookie_name.clone(), SESSION_VALUE)
        .http_only(true)
        .secure(auth.secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(auth.max_age_days))
        .path("/")
        .finish()
}

pub fn removal_cookie(auth: &AuthConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(auth.cookie_name.clone(), "")
        .http_only(true)
        .secure(auth.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .finish();
    cookie.make_removal();
    cookie
}

// ===== Login =====
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let auth = &state.config.auth;
    match verify_password(auth, &req.password) {
        Ok(()) => {
            LOGIN_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
            info!("Admin login succeeded");
            Ok(HttpResponse::Ok()
                .cookie(session_cookie(auth))
                .json(json!({"success": true})))
        }
        Err(e) => {
            let outcome = match e {
                DashboardError::Misconfigured(_) => "misconfigured",
                _ => "rejected",
            };
            LOGIN_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
            warn!(outcome, "Admin login failed");
            Err(e)
        }
    }
}

// ===== Logout =====
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(&state.config.auth))
        .json(json!({"success": true}))
}

// ===== Login page =====
pub async fn login_page() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(LOGIN_HTML)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>TePrestamos Admin</title>
<style>
body{margin:0;min-height:100vh;display:flex;align-items:center;justify-content:center;background:#06090D;font-family:system-ui,sans-serif;color:#E2E8F0}
form{width:320px;padding:40px 32px;background:#111821;border:1px solid #1A2332;border-radius:16px}
input,button{width:100%;box-sizing:border-box;padding:12px;border-radius:10px;font-size:14px}
input{background:#0C1017;border:1px solid #1A2332;color:#E2E8F0;margin:8px 0 16px}
button{background:#34D399;border:0;font-weight:700;cursor:pointer}
#error{color:#F87171;font-size:13px;min-height:18px}
</style>
</head>
<body>
<form id="login">
<h2>TePrestamos Admin</h2>
<label for="password">Password</label>
<input id="password" type="password" placeholder="Enter admin password" autofocus>
<div id="error"></div>
<button type="submit">Sign in</button>
</form>
<script>
document.getElementById("login").addEventListener("submit", async (e) => {
  e.preventDefault();
  const error = document.getElementById("error");
  error.textContent = "";
  try {
    const res = await fetch("/api/auth", {
      method: "POST",
      headers: {"Content-Type": "application/json"},
      body: JSON.stringify({password: document.getElementById("password").value})
    });
    if (res.ok) { window.location.href = "/"; } else { error.textContent = "Wrong password"; }
  } catch (_) {
    error.textContent = "Connection error";
  }
});
</script>
</body>
</html>
"#;
