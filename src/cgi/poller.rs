//! Scheduled calls to one CGI endpoint.

use std::convert::Infallible;
use std::sync::Arc;

use digest_auth::WwwAuthenticateHeader;
use http::StatusCode;
use http::header::AUTHORIZATION;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::digest;
use super::error::CgiError;
use super::http::{HttpClient, HttpRequest, HttpResponse};
use super::target::CgiTarget;
use crate::events::{LogEvent, Module, SharedSink};

/// Longest response body copied into an event, in characters.
pub const BODY_LIMIT: usize = 512;

/// Connection state shared by every endpoint on one host.
///
/// Holds the host's client (and with it the cookie jar) and the last digest
/// challenge the host issued. Calls to one host are serialised through the
/// surrounding mutex, so nonce counts are never reused.
pub struct HostSession<C> {
    client: C,
    challenge: Option<WwwAuthenticateHeader>,
}

/// Shared handle to a host session.
pub type SharedSession<C> = Arc<Mutex<HostSession<C>>>;

impl<C: HttpClient> HostSession<C> {
    /// Wraps `client` in a new shared session.
    #[must_use]
    pub fn shared(client: C) -> SharedSession<C> {
        Arc::new(Mutex::new(Self {
            client,
            challenge: None,
        }))
    }
}

/// Polls one endpoint at a fixed interval.
pub struct CgiPoller<C> {
    target: CgiTarget,
    url: Url,
    session: SharedSession<C>,
    sink: SharedSink,
}

impl<C: HttpClient> CgiPoller<C> {
    /// Creates a poller for `target` using the host's `session`.
    ///
    /// # Errors
    ///
    /// Returns [`CgiError::InvalidUrl`] if the target does not form a URL.
    pub fn new(target: CgiTarget, session: SharedSession<C>, sink: SharedSink) -> Result<Self, CgiError> {
        let url = target.url()?;
        Ok(Self {
            target,
            url,
            session,
            sink,
        })
    }

    /// The endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Name under which the poller runs.
    #[must_use]
    pub fn task_name(&self) -> String {
        format!("cgi {} {}", self.target.device.name, self.url.path())
    }

    /// Makes one authenticated call.
    ///
    /// A cached challenge is answered up front. A `401` with a fresh digest
    /// challenge is answered once and the challenge kept for later calls. A
    /// `401` without one is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`CgiError`] if the request fails or the challenge cannot be
    /// answered.
    pub async fn call(&self) -> Result<HttpResponse, CgiError> {
        let mut session = self.session.lock().await;

        let mut request = HttpRequest::get(self.url.clone());
        if let Some(challenge) = session.challenge.as_mut() {
            let answer = digest::authorization(challenge, &self.target.credentials, &self.url)?;
            request = request.with_header(AUTHORIZATION, answer);
        }
        let response = session.client.get(request).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(mut challenge) = digest::challenge(&response) else {
            return Ok(response);
        };
        let answer = digest::authorization(&mut challenge, &self.target.credentials, &self.url)?;
        tracing::debug!(module = "cgi", url = %self.url, "Answering digest challenge");
        let retry = HttpRequest::get(self.url.clone()).with_header(AUTHORIZATION, answer);
        let response = session.client.get(retry).await?;
        session.challenge = Some(challenge);
        Ok(response)
    }

    /// Makes one call under the target's deadline and reports the result.
    pub async fn poll_once(&self) {
        let name = self.target.device.name.as_str();
        match tokio::time::timeout(self.target.timeout, self.call()).await {
            Ok(Ok(response)) => self.sink.emit(
                LogEvent::info(Module::Cgi, "ok")
                    .with("name", name)
                    .with("url", &self.url)
                    .with("status", response.status.as_u16())
                    .with("body", truncate(&response.body_text(), BODY_LIMIT)),
            ),
            Ok(Err(error)) => self.sink.emit(
                LogEvent::warn(Module::Cgi, "call failed")
                    .with("name", name)
                    .with("url", &self.url)
                    .with("error", error),
            ),
            Err(_) => self.sink.emit(
                LogEvent::info(Module::Cgi, "timeout")
                    .with("name", name)
                    .with("url", &self.url)
                    .with("timeout", format_args!("{:?}", self.target.timeout)),
            ),
        }
    }

    /// Polls until cancelled, or once for a once-only target.
    ///
    /// Failures are reported as events and never end the loop.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), Infallible> {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                () = self.poll_once() => {}
            }
            if self.target.once_only {
                return Ok(());
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                () = tokio::time::sleep(self.target.interval) => {}
            }
        }
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
