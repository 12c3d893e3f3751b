//! Member profile editing
//!
//! Shares the path accessor, the rule evaluator and the debounced scheduler
//! with the release editor, over its own document and error tree.

use std::sync::{Arc, PoisonError, RwLock};

use release_gateway::ProfileImageUpload;
use serde_json::Value;

use crate::config::EditorConfig;
use crate::domain::{EditorError, Result};
use crate::error_tree::ErrorTree;
use crate::obs;
use crate::path::{self, Path};
use crate::scheduler::{ErrorSink, ValidationScheduler};
use crate::schema::{profile_schema, Schema};

/// Document key that holds the uploaded picture reference.
pub const AVATAR_KEY: &str = "avatar";

#[derive(Debug, Default)]
struct ProfileState {
    profile: Value,
    errors: ErrorTree,
}

/// Profile document plus its validation errors.
#[derive(Debug, Default)]
pub struct ProfileStore {
    state: RwLock<ProfileState>,
}

impl ProfileStore {
    pub fn new(profile: Value) -> Self {
        Self {
            state: RwLock::new(ProfileState {
                profile,
                errors: ErrorTree::new(),
            }),
        }
    }

    pub fn profile(&self) -> Value {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .profile
            .clone()
    }

    pub fn read(&self, path: &Path) -> Option<Value> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        path::read(&state.profile, path).cloned()
    }

    pub fn write_at(&self, path: &Path, value: Value) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        path::write(&mut state.profile, path, value);
    }

    pub fn errors(&self) -> ErrorTree {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .errors
            .clone()
    }

    pub fn errors_at(&self, path: &Path) -> Option<Vec<String>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.errors.get(path).map(<[String]>::to_vec)
    }

    fn replace_errors(&self, tree: ErrorTree) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .errors = tree;
    }
}

impl ErrorSink for ProfileStore {
    fn record(&self, path: &Path, outcome: std::result::Result<(), Vec<String>>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            Ok(()) => state.errors.clear(path.clone()),
            Err(messages) => state.errors.set(path.clone(), messages),
        }
    }
}

/// Editor for one member's profile.
pub struct ProfileEditor {
    user_key: String,
    store: Arc<ProfileStore>,
    uploads: Arc<dyn ProfileImageUpload>,
    schema: Schema,
    scheduler: ValidationScheduler,
}

impl ProfileEditor {
    pub fn new(
        config: &EditorConfig,
        user_key: impl Into<String>,
        profile: Value,
        uploads: Arc<dyn ProfileImageUpload>,
    ) -> Self {
        let store = Arc::new(ProfileStore::new(profile));
        let sink: Arc<dyn ErrorSink> = store.clone();
        Self {
            user_key: user_key.into(),
            scheduler: ValidationScheduler::new(config.quiet_period, sink),
            store,
            uploads,
            schema: profile_schema(),
        }
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &ValidationScheduler {
        &self.scheduler
    }

    /// Write `value` at `path` and arm validation for it.
    pub fn set_at_path(&self, path: &Path, value: Value) -> Result<()> {
        self.store.write_at(path, value.clone());
        match self.schema.rule_at(path) {
            Some(rule) => self.scheduler.schedule(path.clone(), rule.clone(), value),
            None => Ok(()),
        }
    }

    /// Validate the whole profile, replacing the error tree.
    pub fn validate_all(&self) -> bool {
        let tree = self.schema.validate_whole(&self.store.profile());
        let errors = tree.error_count();
        self.store.replace_errors(tree);
        obs::emit_record_validated(errors);
        errors == 0
    }

    /// Upload a new picture and keep the returned reference at `avatar`.
    pub async fn upload_image(&self, image: Vec<u8>) -> Result<String> {
        let reference = self
            .uploads
            .upload(&self.user_key, image)
            .await
            .map_err(|err| {
                obs::emit_remote_failure("upload picture", &err);
                EditorError::Remote(err)
            })?;
        self.store
            .write_at(&Path::from_iter([AVATAR_KEY]), Value::String(reference.clone()));
        Ok(reference)
    }

    pub async fn settle(&self) {
        self.scheduler.settle().await;
    }
}
