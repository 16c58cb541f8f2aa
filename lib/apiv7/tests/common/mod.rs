//! Recording doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use apiv7::{
    ActionOptions, ApiClient, Dialect, Invocation, Params, QueryOptions, Resource, Result,
    Transport, Translation, Translator, dialect::Translators,
};
use serde_json::json;

/// One call seen by [`RecordingTransport`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub resource: Resource,
    pub invocation: Invocation,
}

/// Transport that only records what it is asked to do.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Recorded>>,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().expect("lock").clone()
    }
}

impl Transport for RecordingTransport {
    type Call = Invocation;

    fn invoke(&self, resource: &Resource, invocation: Invocation) -> Self::Call {
        self.calls.lock().expect("lock").push(Recorded {
            resource: resource.clone(),
            invocation: invocation.clone(),
        });
        invocation
    }
}

/// Arguments of one [`RecordingTranslator`] call.
#[derive(Debug, Clone)]
pub struct Translated {
    pub url_params: Params,
    pub action: ActionOptions,
    pub query: QueryOptions,
    pub clean_cache: bool,
}

/// Translator that records its inputs and adds a `translated` marker param.
#[derive(Debug, Default)]
pub struct RecordingTranslator {
    calls: Mutex<Vec<Translated>>,
}

impl RecordingTranslator {
    pub fn calls(&self) -> Vec<Translated> {
        self.calls.lock().expect("lock").clone()
    }
}

impl Translator for RecordingTranslator {
    fn translate(
        &self,
        url_params: &Params,
        action: &ActionOptions,
        query: &QueryOptions,
        clean_cache: bool,
    ) -> Result<Translation> {
        self.calls.lock().expect("lock").push(Translated {
            url_params: url_params.clone(),
            action: action.clone(),
            query: query.clone(),
            clean_cache,
        });

        let mut transport_params = url_params.clone();
        transport_params.insert("translated".to_string(), json!(true));
        Ok(Translation {
            transport_options: action.clone(),
            transport_params,
        })
    }
}

/// Client wired to recording doubles for the v7 dialect.
pub fn recording_client() -> (
    ApiClient<RecordingTransport>,
    Arc<RecordingTransport>,
    Arc<RecordingTranslator>,
) {
    let transport = Arc::new(RecordingTransport::default());
    let translator = Arc::new(RecordingTranslator::default());
    let translators = Translators::empty().with_shared(
        Dialect::V7,
        Arc::clone(&translator) as Arc<dyn Translator>,
    );
    let client = ApiClient::from_shared(Arc::clone(&transport), translators);
    (client, transport, translator)
}
