use crate::config::JwtConfig;

/// Cookie holding the access token for browser clients
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Attributes of the access token cookie. The cookie is always `HttpOnly`.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Adds `Secure`; enable behind HTTPS.
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: false,
            same_site: SameSite::Lax,
            path: "/".to_string(),
        }
    }
}

impl From<&JwtConfig> for CookieConfig {
    fn from(jwt: &JwtConfig) -> Self {
        Self {
            secure: jwt.cookie_secure,
            ..Self::default()
        }
    }
}

fn token_cookie(value: &str, max_age_seconds: i64, config: &CookieConfig) -> String {
    let mut cookie = format!("{}={}; HttpOnly", ACCESS_TOKEN_COOKIE, value);
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie.push_str(&format!(
        "; SameSite={}; Path={}; Max-Age={}",
        config.same_site.as_str(),
        config.path,
        max_age_seconds.max(0)
    ));
    cookie
}

/// `Set-Cookie` value carrying a freshly issued access token
///
/// # Example
/// ```rust
/// use odonto::services::cookies::{build_access_token_cookie, CookieConfig};
///
/// let cookie = build_access_token_cookie("abc", 3600, &CookieConfig::default());
/// assert_eq!(cookie, "access_token=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600");
/// ```
pub fn build_access_token_cookie(token: &str, max_age_seconds: i64, config: &CookieConfig) -> String {
    token_cookie(token, max_age_seconds, config)
}

/// `Set-Cookie` value that makes the browser drop the access token.
pub fn build_clear_token_cookie(config: &CookieConfig) -> String {
    token_cookie("", 0, config)
}
