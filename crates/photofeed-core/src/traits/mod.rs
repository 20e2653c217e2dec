//! Core traits for the photo feed
//!
//! This module defines the interfaces of the collaborators the core consumes.
//!
//! - [`HttpRequester`]: Sends one HTTP request and returns status and body
//! - [`TokenProvider`]: Supplies the bearer token on demand

pub mod http_requester;
pub mod token_provider;

pub use http_requester::{HttpRequest, HttpRequester, HttpResponse, Method};
pub use token_provider::{StaticTokenProvider, TokenProvider};
