//! # Thinview client
//!
//! Turns server replies into content-store updates: decodes the response
//! envelopes, routes each one to the matching store operation, and runs the
//! request session (timeouts, cancellation, replay cache, queued jobs).
//!
//! ## Example
//! ```ignore
//! use thinview_client::{ClientConfig, RecordedTransport, Request, Session};
//!
//! let transport = RecordedTransport::new([reply]);
//! let mut session = Session::new(transport, ClientConfig::from_env());
//! session.request(Request::new("api/startup", body).cacheable()).await?;
//! let head = session.store().screens().head();
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod replay;
pub mod response;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use dispatch::{dispatch, DispatchReport};
pub use error::{ClientError, ClientResult};
pub use replay::ReplayCache;
pub use response::Response;
pub use session::{Job, Session};
pub use transport::{RecordedTransport, Request, Transport};
