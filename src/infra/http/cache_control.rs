use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, header::CACHE_CONTROL},
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Shared-cache lifetimes advertised on read-only API responses.
#[derive(Debug, Clone)]
pub struct ApiCachePolicy {
    pub path_prefix: String,
    pub max_age_secs: u64,
    pub s_maxage_secs: u64,
    pub stale_while_revalidate_secs: u64,
}

impl Default for ApiCachePolicy {
    fn default() -> Self {
        Self {
            path_prefix: "/api/".to_string(),
            max_age_secs: 300,
            s_maxage_secs: 600,
            stale_while_revalidate_secs: 3_600,
        }
    }
}

impl ApiCachePolicy {
    pub fn header_value(&self) -> String {
        self.directives().join(", ")
    }

    fn directives(&self) -> [String; 4] {
        [
            "public".to_string(),
            format!("max-age={}", self.max_age_secs),
            format!("s-maxage={}", self.s_maxage_secs),
            format!("stale-while-revalidate={}", self.stale_while_revalidate_secs),
        ]
    }

    /// Folds the policy into a `Cache-Control` value the handler already set.
    ///
    /// Directives from the handler win. Responses the handler marked `no-store` or
    /// `private` are left alone.
    fn merge_into(&self, existing: &str) -> Option<String> {
        let present: Vec<String> = existing
            .split(',')
            .map(|directive| directive_name(directive).to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        if present.iter().any(|name| name == "no-store" || name == "private") {
            return None;
        }

        let mut merged: Vec<String> = existing
            .split(',')
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .map(str::to_string)
            .collect();
        merged.extend(
            self.directives()
                .into_iter()
                .filter(|directive| !present.iter().any(|name| name == directive_name(directive))),
        );
        Some(merged.join(", "))
    }

    fn applies_to(&self, method: &Method, path: &str) -> bool {
        method == Method::GET && path.starts_with(&self.path_prefix)
    }
}

fn directive_name(directive: &str) -> &str {
    directive.split('=').next().unwrap_or_default().trim()
}

/// Marks `GET` responses under the API prefix as publicly cacheable, keeping any
/// directives the handler set itself.
pub async fn api_cache_headers(
    State(policy): State<ApiCachePolicy>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let applies = policy.applies_to(request.method(), request.uri().path());
    let mut response = next.run(request).await;
    if !applies {
        return response;
    }

    let existing = response
        .headers()
        .get(CACHE_CONTROL)
        .map(|value| value.to_str().map(str::to_string));
    let header = match existing {
        None => policy.header_value(),
        Some(Ok(existing)) => match policy.merge_into(&existing) {
            Some(merged) => merged,
            None => return response,
        },
        // Opaque bytes from the handler are kept as they are.
        Some(Err(_)) => return response,
    };

    match HeaderValue::from_str(&header) {
        Ok(value) => {
            response.headers_mut().insert(CACHE_CONTROL, value);
        }
        Err(err) => warn!(
            target = "rostergate::http::cache_control",
            error = %err,
            "cache-control value rejected"
        ),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_header_matches_published_lifetimes() {
        assert_eq!(
            ApiCachePolicy::default().header_value(),
            "public, max-age=300, s-maxage=600, stale-while-revalidate=3600"
        );
    }

    #[test]
    fn handler_directives_win_over_the_policy() {
        let policy = ApiCachePolicy::default();
        assert_eq!(
            policy.merge_into("max-age=30, must-revalidate").as_deref(),
            Some("max-age=30, must-revalidate, public, s-maxage=600, stale-while-revalidate=3600")
        );
        assert_eq!(policy.merge_into("no-store"), None);
        assert_eq!(policy.merge_into("Private, max-age=0"), None);
    }

    #[test]
    fn only_api_reads_are_covered() {
        let policy = ApiCachePolicy::default();
        assert!(policy.applies_to(&Method::GET, "/api/v2/artists/"));
        assert!(!policy.applies_to(&Method::POST, "/api/v2/booking/"));
        assert!(!policy.applies_to(&Method::GET, "/admin/"));
        assert!(!policy.applies_to(&Method::GET, "/api"));
    }
}
