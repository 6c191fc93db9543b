//! # Annotation Parser
//!
//! Turns `@box:` comment annotations on Go handler functions into
//! [`Handler`](crate::model::Handler) records.
//!
//! ```go
//! // CreateAccount creates a new account.
//! // @box:container service=accounts
//! // @box:path POST /accounts
//! // @box:auth required
//! // @box:ratelimit 100/minute
//! func CreateAccount(w http.ResponseWriter, r *http.Request) {}
//! ```
//!
//! Only the contiguous comment block directly above a declaration is
//! attributed to it. Malformed lines become [`ParseError`](crate::model::ParseError)s
//! and scanning carries on; a block with no `@box:function` or
//! `@box:container` produces no handler.

mod builder;
mod parser;
pub mod scanner;

pub use builder::{
    parse_cors, parse_rate_limit, parse_route, parse_timeout, AnnotationKey, HandlerBuilder,
};
pub use parser::Parser;

#[cfg(test)]
mod tests;
