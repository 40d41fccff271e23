//! Search Console API client and authentication.
//!
//! [`SearchAnalyticsApi`] is the seam the fetcher depends on;
//! [`SearchConsoleClient`] implements it over HTTP.

mod api;
mod auth;
mod search_console;

pub use api::SearchAnalyticsApi;
pub use auth::{Auth, AuthMethod, READONLY_SCOPE, ServiceAccountKey};
pub use search_console::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT, SearchConsoleClient};
