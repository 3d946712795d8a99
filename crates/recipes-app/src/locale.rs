//! Per request display culture
//!
//! Resolution order is explicit `lang` query parameter (remembered in cookie),
//! then `lang` cookie, then coarse guess from client IP address.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Query, Request},
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, Expiration, SameSite};
use http::{request::Parts, HeaderMap, HeaderValue};
use recipes_types::Culture;
use serde::Deserialize;
use time::OffsetDateTime;
use tower_cookies::Cookies;
use tracing::debug;

use crate::state::AppState;

pub const LANG_COOKIE_NAME: &str = "lang";
pub const CULTURE_HEADER: &str = "x-culture";
const LANG_COOKIE_DAYS: i64 = 365;

const PRIVATE_PREFIXES: &[&str] = &["127.", "10.", "192.168.", "172.16."];

/// First octets of major address blocks allocated to China
const CHINA_PREFIXES: &[&str] = &[
    "1.0.", "1.1.", "1.2.", "1.3.", "1.4.", "1.5.", "1.6.", "1.7.", "1.8.", "14.", "27.", "36.",
    "39.", "42.", "49.", "58.", "59.", "60.", "61.", "101.", "103.", "106.", "110.", "111.",
    "112.", "113.", "114.", "115.", "116.", "117.", "118.", "119.", "120.", "121.", "122.",
    "123.", "124.", "125.", "139.", "140.", "144.", "150.", "153.", "157.", "159.", "163.",
    "166.", "167.", "171.", "175.", "180.", "182.", "183.", "202.", "203.", "210.", "211.",
    "218.", "219.", "220.", "221.", "222.", "223.",
];

pub fn is_chinese_ip(ip: &str) -> bool {
    if ip == "::1" || PRIVATE_PREFIXES.iter().any(|p| ip.starts_with(p)) {
        return false;
    }
    CHINA_PREFIXES.iter().any(|p| ip.starts_with(p))
}

/// Result of culture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub culture: Culture,
    /// culture was chosen explicitly and should be remembered
    pub remember: bool,
}

pub fn resolve_culture(
    query_lang: Option<&str>,
    cookie_lang: Option<&str>,
    client_ip: Option<&str>,
) -> Resolved {
    if let Some(lang) = query_lang {
        return Resolved {
            culture: Culture::from_lang_param(lang),
            remember: true,
        };
    }
    let culture = match (cookie_lang, client_ip) {
        (Some(lang), _) => Culture::from_cookie(&lang.to_lowercase()),
        (None, Some(ip)) if is_chinese_ip(ip) => {
            debug!("Chinese IP detected: {ip}");
            Culture::Zh
        }
        _ => Culture::En,
    };
    Resolved {
        culture,
        remember: false,
    }
}

fn non_empty_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client address, as seen by proxies or from the connection itself
pub fn client_ip(headers: &HeaderMap, connection: Option<SocketAddr>) -> Option<String> {
    if let Some(forwarded) = non_empty_header(headers, "x-forwarded-for") {
        return forwarded.split(',').next().map(|ip| ip.trim().to_string());
    }
    if let Some(ip) = non_empty_header(headers, "cf-connecting-ip") {
        return Some(ip.to_string());
    }
    connection.map(|addr| addr.ip().to_string())
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

pub async fn resolve_locale(cookies: Cookies, mut request: Request, next: Next) -> Response {
    let query_lang = Query::<LangQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|q| q.0.lang);
    let cookie_lang = cookies
        .get(LANG_COOKIE_NAME)
        .map(|c| c.value().to_string());
    let connection = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|c| c.0);
    let ip = client_ip(request.headers(), connection);

    let resolved = resolve_culture(query_lang.as_deref(), cookie_lang.as_deref(), ip.as_deref());
    if resolved.remember {
        let cookie = Cookie::build((LANG_COOKIE_NAME, resolved.culture.as_str()))
            .path("/")
            .same_site(SameSite::Lax)
            .expires(Expiration::DateTime(
                OffsetDateTime::now_utc() + time::Duration::days(LANG_COOKIE_DAYS),
            ));
        cookies.add(cookie.into());
    }

    request.extensions_mut().insert(resolved.culture);
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        CULTURE_HEADER,
        HeaderValue::from_static(resolved.culture.as_str()),
    );
    response
}

impl FromRequestParts<AppState> for Culture {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Culture>().copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_wins() {
        let res = resolve_culture(Some("CN"), Some("en"), Some("127.0.0.1"));
        assert_eq!(res.culture, Culture::Zh);
        assert!(res.remember);

        let res = resolve_culture(Some("fr"), Some("zh"), Some("36.1.1.1"));
        assert_eq!(res.culture, Culture::En);
        assert!(res.remember);
    }

    #[test]
    fn test_cookie_before_ip() {
        let res = resolve_culture(None, Some("zh"), Some("127.0.0.1"));
        assert_eq!(res.culture, Culture::Zh);
        assert!(!res.remember);

        let res = resolve_culture(None, Some("en"), Some("36.1.1.1"));
        assert_eq!(res.culture, Culture::En);
    }

    #[test]
    fn test_ip() {
        assert_eq!(resolve_culture(None, None, Some("36.1.1.1")).culture, Culture::Zh);
        assert_eq!(resolve_culture(None, None, Some("8.8.8.8")).culture, Culture::En);
        assert_eq!(resolve_culture(None, None, None).culture, Culture::En);
        for ip in ["127.0.0.1", "10.1.2.3", "192.168.1.1", "172.16.0.5", "::1"] {
            assert!(!is_chinese_ip(ip), "{ip} is private");
        }
        assert!(is_chinese_ip("1.2.3.4"));
        assert!(!is_chinese_ip("1.9.3.4"));
    }

    #[test]
    fn test_client_ip() {
        let mut headers = HeaderMap::new();
        let conn: SocketAddr = "192.168.1.10:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(conn)).as_deref(), Some("192.168.1.10"));

        headers.insert("cf-connecting-ip", HeaderValue::from_static("58.1.1.1"));
        assert_eq!(client_ip(&headers, Some(conn)).as_deref(), Some("58.1.1.1"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("223.5.5.5, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, Some(conn)).as_deref(), Some("223.5.5.5"));
    }
}
