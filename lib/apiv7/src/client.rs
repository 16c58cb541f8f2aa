//! HTTP transport implementation using hyper-util.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;
use url::Url;

use crate::middleware::LoggingLayer;
use crate::{
    Error, Invocation, Request, Resource, Response, Result, Transport, UrlTemplate,
    config::{TransportConfig, millis},
    connector::https_connector,
};

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased service for middleware composition.
pub type BoxedService = BoxCloneService<Request, Response, Error>;

/// Call returned by [`HyperTransport`]: resolves to the checked response.
///
/// Nothing is sent until the future is polled; dropping it cancels the call.
pub type ResourceCall = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Thread-safe wrapper for `BoxedService`.
///
/// The Mutex makes the service Sync, which [`Transport`] requires.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request) -> ResourceCall {
        // Lock, clone the service, and release the lock immediately
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

// ============================================================================
// Raw Client
// ============================================================================

/// Raw HTTP client using hyper-util.
#[derive(Clone)]
struct RawHyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: TransportConfig,
}

impl RawHyperClient {
    fn new(config: TransportConfig) -> Self {
        let connector = https_connector(config.connect_timeout());

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout())
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    fn build_hyper_request(&self, request: Request) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, mut headers, body) = request.into_parts();
        self.config.apply_defaults(&mut headers);

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = body.map_or_else(Full::default, Full::new);
        builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    fn extract_headers(headers: &http::HeaderMap) -> BTreeMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let hyper_request = self.build_hyper_request(request)?;

        let response = tokio::time::timeout(self.config.timeout(), self.inner.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(Response::new(status, response_headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Service<Request> for RawHyperClient {
    type Response = Response;
    type Error = Error;
    type Future = ResourceCall;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

// ============================================================================
// Response checks
// ============================================================================

/// How the payload of an action call is read.
#[derive(Debug, Clone, Default)]
struct ResponseReading {
    action: String,
    envelope: Option<String>,
    expects_array: bool,
    aggregated_from: Option<String>,
}

impl ResponseReading {
    fn of(request: &Request) -> Self {
        Self {
            action: request.action().to_string(),
            envelope: request.envelope().map(str::to_string),
            expects_array: request.expects_array(),
            aggregated_from: request.aggregated_from().map(str::to_string),
        }
    }
}

/// Turn a raw response into the result of an action call.
///
/// Non-2xx statuses become [`Error::Http`]; the payload is unwrapped from the
/// envelope key. Aggregated calls are flattened to their values, other
/// array actions have their shape checked.
fn read_response(reading: &ResponseReading, response: Response) -> Result<Response> {
    if !response.is_success() {
        let status = response.status();
        return Err(Error::http(
            status,
            error_message(&response),
            Some(response.body().clone()),
        ));
    }

    let response = match &reading.envelope {
        Some(key) => response.unwrap_envelope(key)?,
        None => response,
    };
    if let Some(template) = &reading.aggregated_from {
        return response.aggregated(&UrlTemplate::parse(template));
    }
    response.check_shape(&reading.action, reading.expects_array)?;
    Ok(response)
}

/// `message` field of a JSON error body, or the status reason.
fn error_message(response: &Response) -> String {
    serde_json::from_slice::<serde_json::Value>(response.body())
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            http::StatusCode::from_u16(response.status())
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("unexpected status")
                .to_string()
        })
}

// ============================================================================
// Public Transport
// ============================================================================

/// Transport executor using hyper-util with connection pooling, TLS, and
/// middleware support.
///
/// Relative URL templates are resolved against the base URL.
///
/// # Example
///
/// ```ignore
/// use apiv7::HyperTransport;
/// use std::time::Duration;
///
/// let transport = HyperTransport::builder(Url::parse("https://eu.api.example.com/1.0")?)
///     .timeout(Duration::from_secs(10))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: SyncService,
    config: TransportConfig,
    base_url: Url,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self::with_url(Url::parse(base_url.as_ref())?))
    }

    /// Create a transport with default configuration and a pre-parsed URL.
    #[must_use]
    pub fn with_url(base_url: Url) -> Self {
        Self::builder(base_url).build()
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder(base_url: Url) -> HyperTransportBuilder {
        HyperTransportBuilder {
            base_url,
            config: TransportConfig::default(),
            layers: Vec::new(),
        }
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Base URL relative templates are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a prepared request through the middleware stack.
    ///
    /// The raw response is returned, whatever its status.
    pub fn send(&self, request: Request) -> ResourceCall {
        self.service.call(request)
    }
}

impl Transport for HyperTransport {
    type Call = ResourceCall;

    fn invoke(&self, resource: &Resource, invocation: Invocation) -> Self::Call {
        let request = match resource.prepare(&self.base_url, &invocation) {
            Ok(request) => request,
            Err(err) => return Box::pin(std::future::ready(Err(err))),
        };

        let reading = ResponseReading::of(&request);
        let call = self.send(request);

        Box::pin(async move {
            let response = call.await?;
            read_response(&reading, response)
        })
    }
}

// ============================================================================
// Tower Service Implementation
// ============================================================================

impl Service<Request> for HyperTransport {
    type Response = Response;
    type Error = Error;
    type Future = ResourceCall;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        // SyncService is always ready (the underlying service is polled when called)
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.service.call(request)
    }
}

/// Builder for [`HyperTransport`].
pub struct HyperTransportBuilder {
    base_url: Url,
    config: TransportConfig,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperTransportBuilder {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = millis(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = millis(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config.pool_idle_per_host = count;
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout_ms = millis(timeout);
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent on every request that does not set it.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(name.into(), value.into());
        self
    }

    // ========================================================================
    // Middleware
    // ========================================================================

    /// Add a Tower layer to the transport.
    ///
    /// Layers are applied in order: first added = outermost (processes requests first).
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes headers).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the transport with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        let config = self.config;
        let mut service: BoxedService = BoxCloneService::new(RawHyperClient::new(config.clone()));

        // Reverse so the first layer added ends up outermost
        for layer_fn in self.layers.into_iter().rev() {
            service = layer_fn(service);
        }

        HyperTransport {
            service: SyncService::new(service),
            config,
            base_url: self.base_url,
        }
    }
}
