//! Entry point tying a transport to the dialect translators.

use std::sync::Arc;

use crate::dialect::Translators;
use crate::endpoint::{Endpoint, EndpointBuilder, EndpointDeclaration};
use crate::Result;

/// Shared handle owning a transport and the translator table.
///
/// Endpoints built from one client share its transport (and its connection
/// pool and middleware).
///
/// # Example
///
/// ```ignore
/// use apiv7::{ApiClient, HyperTransport};
///
/// let client = ApiClient::new(HyperTransport::new("https://eu.api.example.com/1.0")?);
/// let servers = client
///     .endpoint("/dedicated/server/:serverName")
///     .dialect(Dialect::Iceberg)
///     .build()?;
/// ```
#[derive(Debug)]
pub struct ApiClient<T> {
    transport: Arc<T>,
    translators: Translators,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            translators: self.translators.clone(),
        }
    }
}

impl<T> ApiClient<T> {
    /// Create a client with the standard translators.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_translators(transport, Translators::standard())
    }

    /// Create a client with a custom translator table.
    #[must_use]
    pub fn with_translators(transport: T, translators: Translators) -> Self {
        Self::from_shared(Arc::new(transport), translators)
    }

    /// Create a client around an already shared transport.
    #[must_use]
    pub fn from_shared(transport: Arc<T>, translators: Translators) -> Self {
        Self {
            transport,
            translators,
        }
    }

    /// Get a reference to the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the translator table.
    #[must_use]
    pub fn translators(&self) -> &Translators {
        &self.translators
    }

    /// Start declaring an endpoint.
    #[must_use]
    pub fn endpoint(&self, url_template: impl Into<String>) -> EndpointBuilder<T> {
        EndpointBuilder::new(
            Arc::clone(&self.transport),
            self.translators.clone(),
            url_template,
        )
    }

    /// Build an endpoint from a declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if an action uses a dialect with no translator.
    pub fn endpoint_from(&self, declaration: EndpointDeclaration) -> Result<Endpoint<T>> {
        EndpointBuilder::from_declaration(
            Arc::clone(&self.transport),
            self.translators.clone(),
            declaration,
        )
        .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dialect;
    use crate::dialect::V7Translator;

    #[test]
    fn clones_share_transport() {
        let client = ApiClient::new(String::from("transport"));
        let clone = client.clone();
        assert!(std::ptr::eq(client.transport(), clone.transport()));
        assert_eq!(client.translators().dialects().count(), 2);
    }

    #[test]
    fn custom_translators() {
        let client =
            ApiClient::with_translators((), Translators::empty().with(Dialect::V7, V7Translator));
        assert!(client.endpoint("/item").build().is_ok());
        assert!(
            client
                .endpoint("/item")
                .dialect(Dialect::Iceberg)
                .build()
                .is_err()
        );
    }
}
