//! Connection manager for the session lifecycle.
//!
//! `Disconnected -> Connected(descriptor) -> Disconnected`. Connecting while
//! connected closes the previous session first. A connect either completes
//! (connection open and bindings loaded) or leaves no session behind.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::binding::SchemaBindingRegistry;
use crate::config::{Adapter, ConfigurationStore, ConnectionDescriptor, ProjectLayout};
use crate::db::{Connector, DatabaseClient};
use crate::error::{Result, TrainerError};

/// The single active connection with its bound entities.
pub struct Session {
    descriptor: ConnectionDescriptor,
    client: Box<dyn DatabaseClient>,
    registry: SchemaBindingRegistry,
    /// Catalog table list, computed once per session.
    tables: OnceCell<Vec<String>>,
}

impl Session {
    pub fn new(
        descriptor: ConnectionDescriptor,
        client: Box<dyn DatabaseClient>,
        registry: SchemaBindingRegistry,
    ) -> Self {
        Self {
            descriptor,
            client,
            registry,
            tables: OnceCell::new(),
        }
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn client(&self) -> &dyn DatabaseClient {
        self.client.as_ref()
    }

    pub fn registry(&self) -> &SchemaBindingRegistry {
        &self.registry
    }

    pub fn adapter(&self) -> Adapter {
        self.descriptor.adapter
    }

    pub(crate) fn table_cache(&self) -> &OnceCell<Vec<String>> {
        &self.tables
    }

    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            name: self.descriptor.name.clone(),
            domain: self.descriptor.domain(),
            adapter: self.descriptor.adapter,
            database: self.descriptor.database.clone(),
        }
    }
}

/// What `connection` reports about the open session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub name: String,
    pub domain: String,
    #[serde(serialize_with = "serialize_adapter")]
    pub adapter: Adapter,
    pub database: String,
}

fn serialize_adapter<S: serde::Serializer>(
    adapter: &Adapter,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(adapter.as_str())
}

/// Owns at most one session.
pub struct ConnectionManager {
    store: Arc<ConfigurationStore>,
    layout: ProjectLayout,
    connector: Box<dyn Connector>,
    session: Option<Session>,
}

impl ConnectionManager {
    /// Creates a disconnected manager.
    pub fn new(
        store: Arc<ConfigurationStore>,
        layout: ProjectLayout,
        connector: Box<dyn Connector>,
    ) -> Self {
        Self {
            store,
            layout,
            connector,
            session: None,
        }
    }

    pub fn store(&self) -> &ConfigurationStore {
        &self.store
    }

    /// Opens a session for the named descriptor.
    pub async fn connect(&mut self, name: &str) -> Result<ConnectionInfo> {
        let descriptor = self.store.get(name)?.clone();

        if self.session.is_some() {
            self.disconnect().await;
        }

        let client = self.connector.open(&descriptor).await?;

        let domain = descriptor.domain();
        let registry =
            match SchemaBindingRegistry::load(&self.layout.models_dir(&domain), &domain) {
                Ok(registry) => registry,
                Err(e) => {
                    if let Err(close_err) = client.close().await {
                        warn!("Failed to close connection after binding error: {close_err}");
                    }
                    return Err(e);
                }
            };

        info!(
            "Connected to {} ({} entity bindings)",
            descriptor.display_string(),
            registry.len()
        );

        let session = Session::new(descriptor, client, registry);
        let info = session.info();
        self.session = Some(session);
        Ok(info)
    }

    /// Closes the session. Returns `false` when there was none.
    pub async fn disconnect(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };

        if let Err(e) = session.client.close().await {
            warn!("Error while closing {}: {e}", session.descriptor.name);
        }
        info!("Disconnected from {}", session.descriptor.display_string());
        true
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Session details, or `None` when disconnected.
    pub fn connection_info(&self) -> Option<ConnectionInfo> {
        self.session.as_ref().map(Session::info)
    }

    /// The open session, or a connection error.
    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_else(TrainerError::no_connection)
    }

    #[cfg(test)]
    pub(crate) fn attach(&mut self, session: Session) {
        self.session = Some(session);
    }
}
