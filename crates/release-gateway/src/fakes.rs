//! In-memory fakes for gateway traits (testing only)
//!
//! `MemoryGateway` implements every resource contract over plain maps. Tests
//! can script per-call latency and failures, and inspect the call log and the
//! peak number of concurrently running calls.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GatewayError;
use crate::resources::*;

/// A recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Retrieve {
        identifier: String,
        version_number: String,
    },
    ListFiles {
        identifier: String,
        version_number: String,
        category: FileCategory,
    },
    DeleteFile {
        path: String,
    },
    ClearCategory {
        identifier: String,
        version_number: String,
        category: FileCategory,
    },
    ListMedia {
        identifier: String,
    },
    Upload {
        user_key: String,
        bytes: usize,
    },
}

/// Operation selector used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    Retrieve,
    ListFiles(FileCategory),
    DeleteFile,
    ClearCategory(FileCategory),
    ListMedia,
    Upload,
}

/// A one-shot scripted listing response.
#[derive(Debug, Clone)]
struct ScriptedListing {
    delay: Duration,
    response: GatewayResult<Vec<FileDescriptor>>,
}

#[derive(Debug, Default)]
struct GatewayState {
    releases: HashMap<(String, String), Value>,
    files: HashMap<(String, String, FileCategory), Vec<FileDescriptor>>,
    media: HashMap<String, Vec<MediaDescriptor>>,
    scripted_listings: HashMap<FileCategory, VecDeque<ScriptedListing>>,
    failures: HashMap<FakeOp, VecDeque<GatewayError>>,
    calls: Vec<GatewayCall>,
    uploads: HashMap<String, Vec<u8>>,
}

/// In-memory implementation of every gateway contract.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<GatewayState>,
    latency: Mutex<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Decrements the in-flight counter when a call finishes.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to every call that has no scripted delay.
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock().unwrap() = latency;
        self
    }

    /// Register the payload returned by `retrieve(identifier, version_number)`.
    pub fn insert_release(&self, identifier: &str, version_number: &str, payload: Value) {
        let mut state = self.state.lock().unwrap();
        state
            .releases
            .insert((identifier.to_string(), version_number.to_string()), payload);
    }

    /// Replace the server-side listing of one category.
    pub fn insert_files(
        &self,
        identifier: &str,
        version_number: &str,
        category: FileCategory,
        files: Vec<FileDescriptor>,
    ) {
        let mut state = self.state.lock().unwrap();
        state.files.insert(
            (identifier.to_string(), version_number.to_string(), category),
            files,
        );
    }

    /// Replace the server-side media listing of a codebase.
    pub fn insert_media(&self, identifier: &str, media: Vec<MediaDescriptor>) {
        let mut state = self.state.lock().unwrap();
        state.media.insert(identifier.to_string(), media);
    }

    /// Queue a one-shot response for the next `list` of `category`.
    ///
    /// Queued responses are consumed in issue order, each with its own delay.
    pub fn script_listing(
        &self,
        category: FileCategory,
        delay: Duration,
        response: GatewayResult<Vec<FileDescriptor>>,
    ) {
        let mut state = self.state.lock().unwrap();
        state
            .scripted_listings
            .entry(category)
            .or_default()
            .push_back(ScriptedListing { delay, response });
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: FakeOp, error: GatewayError) {
        let mut state = self.state.lock().unwrap();
        state.failures.entry(op).or_default().push_back(error);
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&GatewayCall) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| predicate(c))
            .count()
    }

    /// Highest number of calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Bytes stored by the last upload for `user_key`.
    pub fn uploaded(&self, user_key: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().uploads.get(user_key).cloned()
    }

    fn enter(&self, call: GatewayCall) -> InFlight<'_> {
        self.state.lock().unwrap().calls.push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    fn take_failure(&self, op: FakeOp) -> Option<GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.failures.get_mut(&op).and_then(|q| q.pop_front())
    }

    fn default_latency(&self) -> Duration {
        *self.latency.lock().unwrap()
    }

    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ReleaseResource for MemoryGateway {
    async fn retrieve(&self, identifier: &str, version_number: &str) -> GatewayResult<Value> {
        let _guard = self.enter(GatewayCall::Retrieve {
            identifier: identifier.to_string(),
            version_number: version_number.to_string(),
        });
        Self::pause(self.default_latency()).await;
        if let Some(err) = self.take_failure(FakeOp::Retrieve) {
            return Err(err);
        }
        let state = self.state.lock().unwrap();
        state
            .releases
            .get(&(identifier.to_string(), version_number.to_string()))
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("{}@{}", identifier, version_number)))
    }
}

#[async_trait]
impl FileListingResource for MemoryGateway {
    async fn list(
        &self,
        identifier: &str,
        version_number: &str,
        category: FileCategory,
    ) -> GatewayResult<Vec<FileDescriptor>> {
        let _guard = self.enter(GatewayCall::ListFiles {
            identifier: identifier.to_string(),
            version_number: version_number.to_string(),
            category,
        });
        let scripted = {
            let mut state = self.state.lock().unwrap();
            state
                .scripted_listings
                .get_mut(&category)
                .and_then(|q| q.pop_front())
        };
        if let Some(script) = scripted {
            Self::pause(script.delay).await;
            return script.response;
        }

        Self::pause(self.default_latency()).await;
        if let Some(err) = self.take_failure(FakeOp::ListFiles(category)) {
            return Err(err);
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .files
            .get(&(identifier.to_string(), version_number.to_string(), category))
            .cloned()
            .unwrap_or_default())
    }

    async fn delete(&self, path: &str) -> GatewayResult<()> {
        let _guard = self.enter(GatewayCall::DeleteFile {
            path: path.to_string(),
        });
        Self::pause(self.default_latency()).await;
        if let Some(err) = self.take_failure(FakeOp::DeleteFile) {
            return Err(err);
        }
        let mut state = self.state.lock().unwrap();
        let mut found = false;
        for listing in state.files.values_mut() {
            let before = listing.len();
            listing.retain(|f| f.path != path);
            found |= listing.len() != before;
        }
        if found {
            Ok(())
        } else {
            Err(GatewayError::NotFound(path.to_string()))
        }
    }

    async fn clear_category(
        &self,
        identifier: &str,
        version_number: &str,
        category: FileCategory,
    ) -> GatewayResult<()> {
        let _guard = self.enter(GatewayCall::ClearCategory {
            identifier: identifier.to_string(),
            version_number: version_number.to_string(),
            category,
        });
        Self::pause(self.default_latency()).await;
        if let Some(err) = self.take_failure(FakeOp::ClearCategory(category)) {
            return Err(err);
        }
        let mut state = self.state.lock().unwrap();
        state.files.remove(&(
            identifier.to_string(),
            version_number.to_string(),
            category,
        ));
        Ok(())
    }
}

#[async_trait]
impl MediaResource for MemoryGateway {
    async fn list(&self, identifier: &str) -> GatewayResult<Vec<MediaDescriptor>> {
        let _guard = self.enter(GatewayCall::ListMedia {
            identifier: identifier.to_string(),
        });
        Self::pause(self.default_latency()).await;
        if let Some(err) = self.take_failure(FakeOp::ListMedia) {
            return Err(err);
        }
        let state = self.state.lock().unwrap();
        Ok(state.media.get(identifier).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ProfileImageUpload for MemoryGateway {
    async fn upload(&self, user_key: &str, image: Vec<u8>) -> GatewayResult<String> {
        let _guard = self.enter(GatewayCall::Upload {
            user_key: user_key.to_string(),
            bytes: image.len(),
        });
        Self::pause(self.default_latency()).await;
        if let Some(err) = self.take_failure(FakeOp::Upload) {
            return Err(err);
        }
        let mut state = self.state.lock().unwrap();
        state.uploads.insert(user_key.to_string(), image);
        Ok(format!("/media/profiles/{}/picture.png", user_key))
    }
}
