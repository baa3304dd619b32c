//! Remote intent classifier.
//!
//! Sends `{"query_text": ...}` to `POST {base_url}/classify` and expects an
//! [`IntentClassification`] back.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use tally_core::{IntentClassification, IntentClassifier};

use crate::Result;
use crate::client::{DEFAULT_TIMEOUT, JsonClient};

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    query_text: &'a str,
}

/// [`IntentClassifier`] backed by an HTTP model service.
#[derive(Debug, Clone)]
pub struct RemoteIntentClassifier {
    client: JsonClient,
}

impl RemoteIntentClassifier {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: JsonClient::new(base_url, timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl IntentClassifier for RemoteIntentClassifier {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self, query_text))]
    async fn classify(&self, query_text: &str) -> tally_core::Result<IntentClassification> {
        self.client
            .post("classify", &ClassifyRequest { query_text })
            .await
            .map_err(|e| tally_core::Error::Classifier(e.to_string()))
    }
}
