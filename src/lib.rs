//! `demand-http` builds outbound HTTP calls as immutable descriptors and
//! executes them under a timeout and a fixed retry schedule.
//!
//! - [`Descriptor::create`] and its chain methods describe the call;
//!   invalid input is accumulated, never raised mid-chain.
//! - [`Engine::send_json`], [`Engine::send_form`], [`Engine::send`] and
//!   [`Engine::send_query`] execute it and return an [`Exchange`].
//!
//! ```no_run
//! use std::time::Duration;
//! use demand_http::{Descriptor, Engine};
//!
//! # async fn run() {
//! let engine = Engine::new(Duration::from_secs(10), [Duration::ZERO, Duration::from_secs(1)]);
//! let descriptor = Descriptor::create("GET", "https://api.example.com", "/v1/items", [("q", "x")])
//!     .authorization_bearer("token");
//!
//! let (response, properties, success) = engine.send(descriptor).await.into_parts();
//! println!("{success} {} after {} attempts", response.status_code, properties.retries);
//! # }
//! ```

mod descriptor;
mod engine;
mod error;
mod options;
mod params;
mod transport;
mod types;

pub use descriptor::{Descriptor, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE};
pub use engine::Engine;
pub use error::{DescriptorError, InvalidDescriptor, OptionsError, TransportError};
pub use options::{EngineOptions, MAX_TIMEOUT};
pub use params::{Params, QueryValues};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use types::{Exchange, Properties, Response};
