//! Builds the attribution stack from loaded configuration.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tally_core::{
    AttributionManager, HeuristicScorer, IntentClassifier, RuleBasedClassifier, TouchpointScorer,
};
use tally_models::{RemoteIntentClassifier, RemoteScorer};
use tally_store::TursoTouchpointStore;
use tracing::info;

use crate::config::{ModelSection, StoreSection, TallyConfig};

const MEMORY_PATH: &str = ":memory:";

/// Everything a command needs to talk to touchpoint data
pub struct Runtime {
    pub manager: AttributionManager,
    pub store: Arc<TursoTouchpointStore>,
}

impl Runtime {
    pub async fn build(config: &TallyConfig) -> Result<Self> {
        let store = Arc::new(open_store(&config.store).await?);
        let classifier = build_classifier(&config.classifier)?;
        let scorer = build_scorer(&config.scorer)?;

        let manager = AttributionManager::with_write_back(
            store.clone(),
            classifier,
            scorer,
            config.attribution.write_back,
        );
        Ok(Self { manager, store })
    }
}

async fn open_store(section: &StoreSection) -> Result<TursoTouchpointStore> {
    if let Some(url) = &section.url {
        info!("connecting to remote store at {}", url);
        let token = section.auth_token.as_deref().unwrap_or_default();
        return TursoTouchpointStore::new_remote(url, token)
            .await
            .with_context(|| format!("failed to connect to {url}"));
    }

    if section.path == MEMORY_PATH {
        info!("using in-memory store");
        return TursoTouchpointStore::new_memory()
            .await
            .context("failed to open in-memory store");
    }

    let path = Path::new(&section.path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    info!("opening store at {}", path.display());
    TursoTouchpointStore::new_local(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))
}

fn build_classifier(section: &ModelSection) -> Result<Arc<dyn IntentClassifier>> {
    match &section.url {
        Some(url) => {
            info!("using remote intent classifier at {}", url);
            let classifier =
                RemoteIntentClassifier::with_timeout(url, Duration::from_secs(section.timeout_secs))?;
            Ok(Arc::new(classifier))
        }
        None => Ok(Arc::new(RuleBasedClassifier::new())),
    }
}

fn build_scorer(section: &ModelSection) -> Result<Arc<dyn TouchpointScorer>> {
    match &section.url {
        Some(url) => {
            info!("using remote scorer at {}", url);
            let scorer = RemoteScorer::with_timeout(url, Duration::from_secs(section.timeout_secs))?;
            Ok(Arc::new(scorer))
        }
        None => Ok(Arc::new(HeuristicScorer::new())),
    }
}
