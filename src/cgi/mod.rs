//! Scheduled polling of device CGI endpoints.
//!
//! This module provides types and functions for:
//! - Describing endpoints and their credentials ([`CgiTarget`])
//! - Issuing requests through a per-host client ([`HttpClient`], [`ReqwestClient`])
//! - Answering digest challenges ([`digest`])
//! - Periodic per-endpoint calls ([`CgiPoller`])
//! - Starting it all under a [`Supervisor`](crate::supervisor::Supervisor) ([`CgiMonitor`])

mod client;
pub mod digest;
mod error;
mod http;
mod monitor;
mod poller;
mod target;

pub use client::ReqwestClient;
pub use error::{CgiError, HttpError};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use monitor::CgiMonitor;
pub use poller::{BODY_LIMIT, CgiPoller, HostSession, SharedSession};
pub use target::{CgiTarget, Credentials, Scheme};
