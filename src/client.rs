use std::sync::Arc;

use tracing::instrument;

use crate::config::ClientConfig;
use crate::draft::EventDraft;
use crate::error::{ApiError, Result};
use crate::gateway::HttpGateway;
use crate::model::EventId;
use crate::session::Session;
use crate::store::EventStore;

/// The main entry point for talking to an EventHub backend.
///
/// `EventHubClient` owns one [`HttpGateway`] and shares it between the
/// [`EventStore`] cache and the [`Session`], so signing in or out applies to
/// every request the store makes.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> eventhub_client::Result<()> {
/// use eventhub_client::EventHubClient;
///
/// let client = EventHubClient::from_env();
/// client.session().login("ivan@example.com", "secret").await?;
/// client.store().fetch_list(false).await?;
/// println!("Found {} events", client.store().cards().await.len());
/// # Ok(())
/// # }
/// ```
pub struct EventHubClient {
    gateway: Arc<HttpGateway>,
    store: Arc<EventStore<HttpGateway>>,
    session: Session<HttpGateway>,
}

impl EventHubClient {
    /// Create a client for `config` with a default [`reqwest::Client`].
    pub fn new(config: ClientConfig) -> Self {
        Self::from_gateway(HttpGateway::new(config))
    }

    /// Create a client for the backend named by `EVENTHUB_API_URL`.
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    /// Create a client using the provided [`reqwest::Client`].
    ///
    /// Use this when you need to configure timeouts, proxies, headers, etc.
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self::from_gateway(HttpGateway::with_client(client, config))
    }

    fn from_gateway(gateway: HttpGateway) -> Self {
        let gateway = Arc::new(gateway);
        let store = Arc::new(EventStore::new(gateway.clone()));
        let session = Session::new(gateway.clone(), store.clone());
        Self {
            gateway,
            store,
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.gateway.config()
    }

    pub fn store(&self) -> &EventStore<HttpGateway> {
        &self.store
    }

    pub fn session(&self) -> &Session<HttpGateway> {
        &self.session
    }

    /// Absolute URL of an uploaded asset, or of the default avatar.
    pub fn asset_url(&self, path: Option<&str>) -> String {
        self.config().resolve_asset_url(path)
    }

    /// Fetch event `id` and open an editable copy of it.
    #[instrument(skip(self))]
    pub async fn edit_event(&self, id: EventId) -> Result<EventDraft> {
        self.store.fetch_detail(id, false).await?;
        self.store
            .detail(id)
            .await
            .map(|detail| EventDraft::from_detail(&detail))
            .ok_or(ApiError::EventUnavailable { id })
    }

    /// Save `draft` and return the id of the stored event. The draft is
    /// updated to what the backend now holds.
    pub async fn save_draft(&self, draft: &mut EventDraft) -> Result<EventId> {
        draft.save(&self.store).await
    }
}

impl Default for EventHubClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}
