//! Typed clients for the category service and the widgets built on them.

pub mod actions;
pub mod auth;
pub mod categories;
pub mod form;
pub mod http;
pub mod messages;

pub use crate::client::actions::{ActionOutcome, ActionState, CategoryActions, FailureMessages};
pub use crate::client::auth::AuthApiClient;
pub use crate::client::categories::CategoryApiClient;
pub use crate::client::form::{CategoryForm, FormErrors};
pub use crate::client::http::{ClientError, ClientResult, Credentials, HttpClient, TokenProvider};
