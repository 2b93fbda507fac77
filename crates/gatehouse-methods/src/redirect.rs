//! Client redirect targets.

use crate::errors::*;
use url::{Origin, Url};

/// Query parameter appended to the redirect target on any callback failure
pub const ERROR_PARAM: &str = "error";

/// Generic callback failure marker
pub const OAUTH_FAILED: &str = "oauth_failed";

/// Which client redirect targets the service will send a user-agent to.
///
/// A target is allowed when it is an absolute `http`/`https` URL whose
/// origin is the default target's origin or one of the configured origins.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    default_redirect: Url,
    allowed_origins: Vec<Origin>,
}

impl RedirectPolicy {
    pub fn new(default_redirect: &str, allowed_origins: &[String]) -> Result<Self> {
        let default_redirect = parse_web_url(default_redirect).ok_or_else(|| {
            AuthMethodsError::OAuthConfigInvalid(format!(
                "Default redirect must be an absolute http(s) URL: {}",
                default_redirect
            ))
        })?;

        let mut origins = vec![default_redirect.origin()];
        for entry in allowed_origins {
            let origin = parse_web_url(entry)
                .map(|url| url.origin())
                .ok_or_else(|| {
                    AuthMethodsError::OAuthConfigInvalid(format!(
                        "Allowed redirect origin must be an absolute http(s) URL: {}",
                        entry
                    ))
                })?;
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }

        Ok(Self {
            default_redirect,
            allowed_origins: origins,
        })
    }

    pub fn default_redirect(&self) -> &Url {
        &self.default_redirect
    }

    /// Resolve a client-supplied target, defaulting when absent
    pub fn resolve(&self, requested: Option<&str>) -> Result<Url> {
        match requested.map(str::trim).filter(|r| !r.is_empty()) {
            None => Ok(self.default_redirect.clone()),
            Some(requested) => parse_web_url(requested)
                .filter(|url| self.is_allowed(url))
                .ok_or_else(|| AuthMethodsError::RedirectNotAllowed(requested.to_string())),
        }
    }

    /// Resolve a target for a failure redirect; never fails
    pub fn resolve_or_default(&self, requested: Option<&str>) -> Url {
        self.resolve(requested)
            .unwrap_or_else(|_| self.default_redirect.clone())
    }

    pub fn is_allowed(&self, url: &Url) -> bool {
        self.allowed_origins.contains(&url.origin())
    }
}

fn parse_web_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

/// Append query parameters, keeping any the target already carries
pub fn append_query(target: &Url, pairs: &[(&str, &str)]) -> String {
    let mut url = target.clone();
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    url.to_string()
}

/// Target with the generic failure marker appended
pub fn error_redirect(target: &Url) -> String {
    append_query(target, &[(ERROR_PARAM, OAUTH_FAILED)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RedirectPolicy {
        RedirectPolicy::new(
            "http://localhost:3000/auth/done",
            &["https://admin.example.com".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_missing_redirect_uses_default() {
        let policy = policy();

        assert_eq!(
            policy.resolve(None).unwrap().as_str(),
            "http://localhost:3000/auth/done"
        );
        assert_eq!(
            policy.resolve(Some("  ")).unwrap().as_str(),
            "http://localhost:3000/auth/done"
        );
    }

    #[test]
    fn test_allowed_origins() {
        let policy = policy();

        assert!(policy.resolve(Some("http://localhost:3000/other")).is_ok());
        assert!(policy
            .resolve(Some("https://admin.example.com/welcome?x=1"))
            .is_ok());
    }

    #[test]
    fn test_disallowed_targets() {
        let policy = policy();

        for target in [
            "https://evil.example.com/",
            "http://admin.example.com/",
            "http://localhost:3001/",
            "javascript:alert(1)",
            "/relative/path",
            "//evil.example.com",
        ] {
            assert!(
                matches!(
                    policy.resolve(Some(target)),
                    Err(AuthMethodsError::RedirectNotAllowed(_))
                ),
                "{} should be rejected",
                target
            );
        }
    }

    #[test]
    fn test_resolve_or_default() {
        let policy = policy();

        assert_eq!(
            policy
                .resolve_or_default(Some("https://evil.example.com"))
                .as_str(),
            "http://localhost:3000/auth/done"
        );
    }

    #[test]
    fn test_invalid_policy_configuration() {
        assert!(RedirectPolicy::new("not a url", &[]).is_err());
        assert!(RedirectPolicy::new("http://localhost:3000", &["ftp://x".to_string()]).is_err());
    }

    #[test]
    fn test_error_redirect_preserves_query() {
        let target = Url::parse("https://admin.example.com/done?tab=settings#top").unwrap();

        assert_eq!(
            error_redirect(&target),
            "https://admin.example.com/done?tab=settings&error=oauth_failed#top"
        );
    }

    #[test]
    fn test_append_query_encodes_values() {
        let target = Url::parse("http://localhost:3000/cb").unwrap();
        let url = append_query(&target, &[("token", "a+b/c=")]);

        assert_eq!(url, "http://localhost:3000/cb?token=a%2Bb%2Fc%3D");
    }
}
