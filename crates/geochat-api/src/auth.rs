use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::ToSchema;

pub const USER_HEADER: &str = "x-forwarded-user";
pub const USERNAME_HEADER: &str = "x-forwarded-preferred-username";
pub const EMAIL_HEADER: &str = "x-forwarded-email";
pub const GROUPS_HEADER: &str = "x-forwarded-groups";

const ANONYMOUS: &str = "anonymous";
const ANONYMOUS_EMAIL: &str = "anonymous@localhost";

/// Identity asserted by the authenticating reverse proxy.
///
/// The headers are trusted as-is: the proxy in front of the service must
/// strip any client-supplied copy of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub groups: Vec<String>,
}

impl User {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str, default: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string())
        };

        let groups = headers
            .get(GROUPS_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: header(USER_HEADER, ANONYMOUS),
            username: header(USERNAME_HEADER, ANONYMOUS),
            email: header(EMAIL_HEADER, ANONYMOUS_EMAIL),
            groups,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id == ANONYMOUS
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_defaults_without_headers() {
        let user = User::from_headers(&HeaderMap::new());
        assert_eq!(user.id, "anonymous");
        assert_eq!(user.username, "anonymous");
        assert_eq!(user.email, "anonymous@localhost");
        assert!(user.groups.is_empty());
        assert!(user.is_anonymous());
    }

    #[test]
    fn test_forwarded_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("u-42"));
        headers.insert(USERNAME_HEADER, HeaderValue::from_static("jdoe"));
        headers.insert(EMAIL_HEADER, HeaderValue::from_static("jdoe@example.org"));
        headers.insert(GROUPS_HEADER, HeaderValue::from_static("admins, geo,,"));

        let user = User::from_headers(&headers);
        assert_eq!(user.id, "u-42");
        assert_eq!(user.username, "jdoe");
        assert_eq!(user.email, "jdoe@example.org");
        assert_eq!(user.groups, vec!["admins", "geo"]);
        assert!(!user.is_anonymous());
    }
}
