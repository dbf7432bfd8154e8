//! Core HTTP protocol value objects.
//!
//! - [`RequestHead`] / [`Request`]: a parsed request and what handlers receive
//! - [`Response`] / [`Body`]: what handlers produce and how it is serialized
//! - [`Collaborators`]: optional services reachable from a request
//! - errors: [`HttpError`], [`ParseError`], [`SendError`], [`HandlerError`],
//!   [`CollaboratorError`]
//!
//! None of these types perform network I/O.

mod request;
pub use request::parse_method;
pub use request::Request;
pub use request::RequestHead;
pub use request::SUPPORTED_METHODS;

mod response;
pub use response::Body;
pub use response::HeadResponse;
pub use response::Response;

mod collaborator;
#[cfg(test)]
pub(crate) use collaborator::MockTemplateEngine;
pub use collaborator::Collaborators;
pub use collaborator::TaskSubmitter;
pub use collaborator::TemplateEngine;
pub use collaborator::TokioTaskSubmitter;

mod error;
pub use error::CollaboratorError;
pub use error::HandlerError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
pub use error::TimeoutPhase;
