//! HTTP digest authentication (RFC 7616) for device endpoints.

use digest_auth::{AuthContext, WwwAuthenticateHeader};
use http::HeaderValue;
use http::header::WWW_AUTHENTICATE;
use url::Url;

use super::error::CgiError;
use super::http::HttpResponse;
use super::target::Credentials;

/// Extracts a digest challenge from a `401` response.
///
/// Returns `None` when the response carries no `Digest` challenge, or one
/// that cannot be parsed.
#[must_use]
pub fn challenge(response: &HttpResponse) -> Option<WwwAuthenticateHeader> {
    response
        .headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.trim_start().starts_with("Digest"))
        .and_then(|value| digest_auth::parse(value).ok())
}

/// Answers `challenge` for a GET of `url`.
///
/// Each answer advances the challenge's nonce count, so a cached challenge
/// can be reused for later requests.
///
/// # Errors
///
/// Returns [`CgiError::Digest`] if the challenge uses an unsupported
/// algorithm or quality of protection.
pub fn authorization(
    challenge: &mut WwwAuthenticateHeader,
    credentials: &Credentials,
    url: &Url,
) -> Result<HeaderValue, CgiError> {
    let uri = &url[url::Position::BeforePath..];
    let context = AuthContext::new(credentials.user.as_str(), credentials.token.as_str(), uri);
    let answer = challenge
        .respond(&context)
        .map_err(|e| CgiError::Digest(e.to_string()))?;
    HeaderValue::from_str(&answer.to_header_string()).map_err(|e| CgiError::Digest(e.to_string()))
}
