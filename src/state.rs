use crate::config::{CredentialSource, Settings, StoreCredentials};
use crate::errors::AppError;
use crate::mileage::UnresolvedPolicy;
use crate::service::LoadService;
use crate::store::{LoadStore, MemoryLoadStore, RemoteLoadStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// A ready store client waiting to be installed into [`AppState`].
pub struct Connection {
    service: Arc<LoadService>,
    source: CredentialSource,
    url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStatus {
    pub configured: bool,
    pub source: Option<CredentialSource>,
    pub url: Option<String>,
    pub mileage_policy: UnresolvedPolicy,
}

/// Shared handle to the settings and the live store connection. The
/// connection is swapped in place when credentials change.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    connection: Arc<RwLock<Option<Connection>>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            connection: Arc::new(RwLock::new(None)),
        }
    }

    /// Builds the service over an arbitrary store, bypassing credentials.
    pub async fn attach_store(&self, store: Arc<dyn LoadStore>, source: CredentialSource) {
        let service = LoadService::new(store, self.settings.mileage_policy);
        *self.connection.write().await = Some(Connection {
            service: Arc::new(service),
            source,
            url: None,
        });
    }

    /// Builds a remote store client without touching the live connection.
    pub fn open(
        &self,
        credentials: &StoreCredentials,
        source: CredentialSource,
    ) -> Result<Connection, StoreError> {
        let store = RemoteLoadStore::new(
            &credentials.url,
            &credentials.api_key,
            &self.settings.table,
            self.settings.timeout,
        )?;
        let service = LoadService::new(Arc::new(store), self.settings.mileage_policy);
        Ok(Connection {
            service: Arc::new(service),
            source,
            url: Some(credentials.url.clone()),
        })
    }

    pub async fn install(&self, connection: Connection) {
        info!(url = ?connection.url, source = ?connection.source, "store connected");
        *self.connection.write().await = Some(connection);
    }

    pub async fn connect(
        &self,
        credentials: &StoreCredentials,
        source: CredentialSource,
    ) -> Result<(), StoreError> {
        let connection = self.open(credentials, source)?;
        self.install(connection).await;
        Ok(())
    }

    pub async fn connect_demo(&self) {
        self.attach_store(Arc::new(MemoryLoadStore::new()), CredentialSource::Demo)
            .await;
        if let Ok(service) = self.service().await {
            crate::demo::seed(&service).await;
        }
        info!("running with in-memory demo store");
    }

    pub async fn disconnect(&self) {
        *self.connection.write().await = None;
        info!("store disconnected");
    }

    pub async fn service(&self) -> Result<Arc<LoadService>, AppError> {
        self.connection
            .read()
            .await
            .as_ref()
            .map(|connection| Arc::clone(&connection.service))
            .ok_or_else(AppError::not_configured)
    }

    pub async fn status(&self) -> ConnectionStatus {
        let connection = self.connection.read().await;
        ConnectionStatus {
            configured: connection.is_some(),
            source: connection.as_ref().map(|c| c.source),
            url: connection.as_ref().and_then(|c| c.url.clone()),
            mileage_policy: self.settings.mileage_policy,
        }
    }
}
