//! Tower middleware layers for [`HyperTransport`](crate::HyperTransport).
//!
//! Layers wrap the service that performs prepared [`Request`](crate::Request)s.
//! The first layer added is the outermost one.
//!
//! ```ignore
//! use apiv7::HyperTransport;
//!
//! let transport = HyperTransport::builder(base_url)
//!     .with_logging()
//!     .build();
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::{Layer, Service, ServiceBuilder};
