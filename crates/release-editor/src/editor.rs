//! Release editing actions
//!
//! [`ReleaseEditor`] wires the store, the schema, the validation scheduler
//! and the remote resources together. Remote failures are returned to the
//! caller and never modify the store; file slices are only ever replaced by
//! a successful listing.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use release_gateway::{FileCategory, FileListingResource, MediaResource, ReleaseResource};
use serde_json::Value;
use tracing::{trace, Instrument};

use crate::config::EditorConfig;
use crate::domain::{EditorError, ReleaseIdentity, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::path::Path;
use crate::scheduler::{ErrorSink, ValidationScheduler};
use crate::schema::{release_schema, Schema};
use crate::store::ReleaseStore;

/// Log a remote failure and lift it into an [`EditorError`].
fn remote(operation: &'static str) -> impl Fn(release_gateway::GatewayError) -> EditorError {
    move |err| {
        obs::emit_remote_failure(operation, &err);
        EditorError::Remote(err)
    }
}

pub struct ReleaseEditor {
    config: EditorConfig,
    store: Arc<ReleaseStore>,
    releases: Arc<dyn ReleaseResource>,
    files: Arc<dyn FileListingResource>,
    media: Arc<dyn MediaResource>,
    schema: Schema,
    scheduler: ValidationScheduler,
}

impl std::fmt::Debug for ReleaseEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseEditor")
            .field("config", &self.config)
            .field("identity", &self.store.identity())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl ReleaseEditor {
    pub fn new(
        config: EditorConfig,
        releases: Arc<dyn ReleaseResource>,
        files: Arc<dyn FileListingResource>,
        media: Arc<dyn MediaResource>,
    ) -> Self {
        let store = Arc::new(ReleaseStore::new());
        let sink: Arc<dyn ErrorSink> = store.clone();
        let scheduler = ValidationScheduler::new(config.quiet_period, sink);
        Self {
            config,
            store,
            releases,
            files,
            media,
            schema: release_schema(),
            scheduler,
        }
    }

    /// Editor backed by one object serving every resource.
    pub fn with_gateway<G>(config: EditorConfig, gateway: Arc<G>) -> Self
    where
        G: ReleaseResource + FileListingResource + MediaResource + 'static,
    {
        Self::new(config, gateway.clone(), gateway.clone(), gateway)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ReleaseStore> {
        &self.store
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn scheduler(&self) -> &ValidationScheduler {
        &self.scheduler
    }

    fn loaded_identity(&self) -> Result<ReleaseIdentity> {
        let identity = self.store.identity();
        if identity.identifier.is_empty() {
            return Err(EditorError::NotLoaded("codebase identifier"));
        }
        if identity.version_number.is_empty() {
            return Err(EditorError::NotLoaded("version number"));
        }
        Ok(identity)
    }

    /// Load a release and the file listings it exposes.
    ///
    /// A live release only exposes media. Otherwise every original category
    /// and the media listing are fetched concurrently; this resolves once
    /// all of them have settled and reports the first failure in category
    /// order. Listings that succeeded stay in the store either way.
    pub async fn initialize(&self, identifier: &str, version_number: &str) -> Result<()> {
        let started = Instant::now();
        let payload = self
            .releases
            .retrieve(identifier, version_number)
            .await
            .map_err(remote("retrieve"))?;
        self.store.replace_release(&payload)?;

        let identity = self.loaded_identity()?;
        let live = self.store.is_live();
        self.load_files(live)
            .instrument(obs::release_span(&identity))
            .await?;

        obs::emit_release_initialized(&identity, live, started.elapsed().as_millis() as u64);
        Ok(())
    }

    async fn load_files(&self, live: bool) -> Result<()> {
        if live {
            return self.fetch_media().await;
        }
        let originals = join_all(FileCategory::ALL.map(|category| self.fetch_category(category)));
        let (originals, media) = futures::join!(originals, self.fetch_media());
        originals.into_iter().chain(std::iter::once(media)).collect()
    }

    /// Refresh one original category from the server.
    ///
    /// Concurrent fetches of the same category are not fenced: whichever
    /// response arrives last is the one kept.
    pub async fn fetch_category(&self, category: FileCategory) -> Result<()> {
        let identity = self.loaded_identity()?;
        let listing = self
            .files
            .list(&identity.identifier, &identity.version_number, category)
            .await
            .map_err(remote("list files"))?;
        let count = listing.len();
        self.store.set_files(category, listing);
        METRICS.inc_category_fetches();
        obs::emit_category_fetched(&identity, category, count);
        Ok(())
    }

    /// Refresh the media listing of the codebase.
    pub async fn fetch_media(&self) -> Result<()> {
        let identifier = self.store.identity().identifier;
        if identifier.is_empty() {
            return Err(EditorError::NotLoaded("codebase identifier"));
        }
        let media = self
            .media
            .list(&identifier)
            .await
            .map_err(remote("list media"))?;
        let count = media.len();
        self.store.set_media_files(media);
        METRICS.inc_category_fetches();
        obs::emit_media_fetched(&identifier, count);
        Ok(())
    }

    /// Delete one file, then reload its category.
    pub async fn delete_file(&self, category: FileCategory, path: &str) -> Result<()> {
        let identity = self.loaded_identity()?;
        self.files
            .delete(path)
            .await
            .map_err(remote("delete file"))?;
        obs::emit_files_removed(&identity, category, path);
        self.fetch_category(category).await
    }

    /// Remove every file of a category, then reload it.
    pub async fn clear_category(&self, category: FileCategory) -> Result<()> {
        let identity = self.loaded_identity()?;
        self.files
            .clear_category(&identity.identifier, &identity.version_number, category)
            .await
            .map_err(remote("clear category"))?;
        obs::emit_files_removed(&identity, category, "*");
        self.fetch_category(category).await
    }

    /// Write `value` at `path` and arm validation for it.
    ///
    /// Paths the schema does not constrain are written without validation.
    pub fn set_at_path(&self, path: &Path, value: Value) -> Result<()> {
        self.store.write_at(path, value.clone());
        match self.schema.rule_at(path) {
            Some(rule) => self.scheduler.schedule(path.clone(), rule.clone(), value),
            None => {
                trace!(path = %path, "no rule for path, skipping validation");
                Ok(())
            }
        }
    }

    /// Validate the whole release, replacing the error tree with the result.
    /// Returns whether the release is valid.
    pub fn validate_all(&self) -> bool {
        let tree = self.schema.validate_whole(&self.store.release_value());
        let errors = tree.error_count();
        self.store.replace_errors(tree);
        obs::emit_record_validated(errors);
        errors == 0
    }

    /// Wait for every armed field validation to settle.
    pub async fn settle(&self) {
        self.scheduler.settle().await;
    }
}
