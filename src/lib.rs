#[macro_use]
extern crate lazy_static;

extern crate url;

extern crate serde;
extern crate serde_json;

mod api;
pub mod cache;
mod compact;
mod context;
mod creation;
pub mod error;
mod expand;
pub mod helper;
pub mod loader;
mod validate;

pub use api::*;
pub use context::*;
pub use error::{ContextError, ErrorCode};

use futures::future::BoxFuture;

/// This trait is implemented by consumers of the API, to provide remote contexts.
pub trait DocumentLoader: Send + Sync {
    /// Loads the JSON document behind `url`.
    ///
    /// Failures should carry `ErrorCode::LoadingDocumentFailed` (or a more
    /// specific loading code); they are passed on to the caller unchanged.
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<serde_json::Value, ContextError>>;
}
