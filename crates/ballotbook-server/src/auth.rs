//! Caller identity.
//!
//! Login happens in the gateway in front of this server. It forwards the
//! authenticated account id and the auth-provider key as headers; requests
//! without both are anonymous.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ballotbook_shared::IdentityAnchor;

use crate::error::ServerError;

pub const USER_ACCOUNT_HEADER: &str = "x-user-account-id";
pub const PROVIDER_KEY_HEADER: &str = "x-auth-provider-key";

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct Voter {
    pub user_account_id: i64,
    pub identity_anchor: IdentityAnchor,
}

#[async_trait]
impl<S> FromRequestParts<S> for Voter
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let user_account_id = header(USER_ACCOUNT_HEADER)
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or(ServerError::Unauthorized)?;
        let provider_key = header(PROVIDER_KEY_HEADER).ok_or(ServerError::Unauthorized)?;

        Ok(Voter {
            user_account_id,
            identity_anchor: IdentityAnchor::from_provider_key(provider_key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(builder: axum::http::request::Builder) -> Result<Voter, ServerError> {
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Voter::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_both_headers_required() {
        let voter = extract(
            Request::builder()
                .header(USER_ACCOUNT_HEADER, "100")
                .header(PROVIDER_KEY_HEADER, "google:1001"),
        )
        .await
        .unwrap();
        assert_eq!(voter.user_account_id, 100);
        assert_eq!(
            voter.identity_anchor,
            IdentityAnchor::from_provider_key("google:1001")
        );

        let missing_key = extract(Request::builder().header(USER_ACCOUNT_HEADER, "100")).await;
        assert!(matches!(missing_key, Err(ServerError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_bad_account_id_rejected() {
        for bad in ["", "abc", "0", "-4"] {
            let result = extract(
                Request::builder()
                    .header(USER_ACCOUNT_HEADER, bad)
                    .header(PROVIDER_KEY_HEADER, "google:1001"),
            )
            .await;
            assert!(matches!(result, Err(ServerError::Unauthorized)), "{bad}");
        }
    }
}
