//! Canonical in-memory release state
//!
//! [`ReleaseStore`] owns the release document, the file listings of each
//! category and the validation error tree. The document is kept as a
//! `serde_json::Value` so that any path can be written; typed views are
//! projected on demand and never fail, whatever the document holds.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use release_gateway::{FileCategory, FileDescriptor, MediaDescriptor};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::domain::{
    Codebase, Contributor, ContributorKey, EditorError, FileSet, Release, ReleaseDetail,
    ReleaseIdentity, Result, ReviewStatus, ReviewUrls,
};
use crate::error_tree::ErrorTree;
use crate::path::{self, Path};
use crate::scheduler::ErrorSink;

const CONTRIBUTORS_KEY: &str = "release_contributors";
const CONTRIBUTOR_ID_KEY: &str = "_id";

#[derive(Debug)]
struct StoreState {
    release: Value,
    files: FileSet,
    errors: ErrorTree,
}

/// Thread-safe holder of the release being edited.
#[derive(Debug)]
pub struct ReleaseStore {
    state: RwLock<StoreState>,
}

impl Default for ReleaseStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed view of `value`. Field decoders tolerate any shape, so only a
/// root of the wrong kind falls back to the empty view.
fn project<T: DeserializeOwned + Default>(value: &Value, what: &'static str) -> T {
    T::deserialize(value).unwrap_or_else(|err| {
        debug!(what, error = %err, "projection fell back to empty view");
        T::default()
    })
}

/// Give every object in `entries` a fresh contributor id.
fn stamp_contributors(entries: &mut Value) {
    if let Value::Array(items) = entries {
        for item in items.iter_mut() {
            if let Value::Object(map) = item {
                map.insert(
                    CONTRIBUTOR_ID_KEY.to_string(),
                    Value::String(ContributorKey::new().0),
                );
            }
        }
    }
}

impl ReleaseStore {
    /// Store holding an empty release.
    pub fn new() -> Self {
        let release = serde_json::to_value(Release::default()).unwrap_or(Value::Null);
        Self {
            state: RwLock::new(StoreState {
                release,
                files: FileSet::default(),
                errors: ErrorTree::new(),
            }),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Editable metadata subset.
    pub fn detail(&self) -> ReleaseDetail {
        project(&self.read_state().release, "release detail")
    }

    /// Codebase identifier and version number. Missing or non-string values
    /// read as empty.
    pub fn identity(&self) -> ReleaseIdentity {
        let state = self.read_state();
        let text = |p: &[&str]| {
            let path: Path = p.iter().copied().collect();
            path::read(&state.release, &path)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        ReleaseIdentity::new(text(&["codebase", "identifier"]), text(&["version_number"]))
    }

    /// Contributors including their synthetic ids, one per list entry.
    pub fn contributors(&self) -> Vec<Contributor> {
        match self.read_state().release.get(CONTRIBUTORS_KEY) {
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| project(entry, "release contributor"))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Typed snapshot of the whole release.
    pub fn release(&self) -> Release {
        project(&self.read_state().release, "release")
    }

    /// Raw release document.
    pub fn release_value(&self) -> Value {
        self.read_state().release.clone()
    }

    /// Value at `path` in the release document.
    pub fn read(&self, path: &Path) -> Option<Value> {
        path::read(&self.read_state().release, path).cloned()
    }

    pub fn files(&self) -> FileSet {
        self.read_state().files.clone()
    }

    pub fn category(&self, category: FileCategory) -> Vec<FileDescriptor> {
        self.read_state().files.category(category).to_vec()
    }

    pub fn media(&self) -> Vec<MediaDescriptor> {
        self.read_state().files.media.clone()
    }

    pub fn errors(&self) -> ErrorTree {
        self.read_state().errors.clone()
    }

    /// Messages at `path`; `None` means the path was never validated.
    pub fn errors_at(&self, path: &Path) -> Option<Vec<String>> {
        self.read_state().errors.get(path).map(<[String]>::to_vec)
    }

    /// `None` when unset or not a known status.
    pub fn review_status(&self) -> Option<ReviewStatus> {
        let state = self.read_state();
        state
            .release
            .get("review_status")
            .and_then(|value| project(value, "review status"))
    }

    pub fn urls(&self) -> ReviewUrls {
        let state = self.read_state();
        match state.release.get("urls") {
            Some(value) => project(value, "review urls"),
            None => ReviewUrls::default(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.read_state()
            .release
            .get("live")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Release document as sent to the server: contributor ids removed.
    pub fn payload(&self) -> Value {
        let mut release = self.release_value();
        let count = release
            .get(CONTRIBUTORS_KEY)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        for index in 0..count {
            let id = Path::from_iter([CONTRIBUTORS_KEY])
                .child(index)
                .child(CONTRIBUTOR_ID_KEY);
            path::remove(&mut release, &id);
        }
        release
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Replace the whole codebase.
    pub fn set_codebase(&self, codebase: &Codebase) -> Result<()> {
        let value = serde_json::to_value(codebase)?;
        path::write(&mut self.write_state().release, &Path::from_iter(["codebase"]), value);
        Ok(())
    }

    /// Overwrite the keys of the current release that `payload` also
    /// carries. Keys unknown to the release are ignored and keys missing
    /// from the payload keep their value. A replaced contributor list is
    /// restamped with fresh ids.
    pub fn replace_release(&self, payload: &Value) -> Result<()> {
        let incoming = payload.as_object().ok_or(EditorError::PayloadNotObject)?;
        let mut state = self.write_state();
        let Value::Object(release) = &mut state.release else {
            return Err(EditorError::PayloadNotObject);
        };

        let mut replaced = 0usize;
        for (key, slot) in release.iter_mut() {
            if let Some(value) = incoming.get(key) {
                *slot = value.clone();
                replaced += 1;
            }
        }
        if incoming.contains_key(CONTRIBUTORS_KEY) {
            if let Some(entries) = release.get_mut(CONTRIBUTORS_KEY) {
                stamp_contributors(entries);
            }
        }
        trace!(replaced, ignored = incoming.len() - replaced, "release replaced");
        Ok(())
    }

    pub fn set_review_status(&self, status: Option<ReviewStatus>) -> Result<()> {
        let value = serde_json::to_value(status)?;
        path::write(
            &mut self.write_state().release,
            &Path::from_iter(["review_status"]),
            value,
        );
        Ok(())
    }

    /// Set the `review` and `notify_reviewers_of_changes` links.
    /// `request_peer_review` is left as it was.
    pub fn set_urls(&self, urls: &ReviewUrls) {
        let mut state = self.write_state();
        for (key, value) in [
            ("review", &urls.review),
            ("notify_reviewers_of_changes", &urls.notify_reviewers_of_changes),
        ] {
            let target = Path::from_iter(["urls", key]);
            let value = value.clone().map(Value::String).unwrap_or(Value::Null);
            path::write(&mut state.release, &target, value);
        }
    }

    pub fn set_media_files(&self, media: Vec<MediaDescriptor>) {
        self.write_state().files.media = media;
    }

    /// Replace the contributor list, giving every entry a fresh id.
    pub fn set_contributors(&self, contributors: &[Contributor]) -> Result<()> {
        let mut entries = serde_json::to_value(contributors)?;
        stamp_contributors(&mut entries);
        path::write(
            &mut self.write_state().release,
            &Path::from_iter([CONTRIBUTORS_KEY]),
            entries,
        );
        Ok(())
    }

    pub fn set_files(&self, category: FileCategory, files: Vec<FileDescriptor>) {
        self.write_state().files.set_category(category, files);
    }

    /// Path-addressed write into the release document.
    pub fn write_at(&self, path: &Path, value: Value) {
        path::write(&mut self.write_state().release, path, value);
    }

    pub fn set_errors_at(&self, path: Path, errors: Vec<String>) {
        self.write_state().errors.set(path, errors);
    }

    /// Mark `path` as validated without errors.
    pub fn clear_errors_at(&self, path: Path) {
        self.write_state().errors.clear(path);
    }

    /// Merge a whole-record validation result into the error tree.
    pub fn set_validation_errors(&self, tree: ErrorTree) {
        self.write_state().errors.merge(tree);
    }

    /// Replace the error tree.
    pub fn replace_errors(&self, tree: ErrorTree) {
        self.write_state().errors = tree;
    }
}

impl ErrorSink for ReleaseStore {
    fn record(&self, path: &Path, outcome: std::result::Result<(), Vec<String>>) {
        match outcome {
            Ok(()) => self.clear_errors_at(path.clone()),
            Err(messages) => self.set_errors_at(path.clone(), messages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContributorKind;
    use serde_json::json;

    fn p(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn new_store_is_empty_release() {
        let store = ReleaseStore::new();
        assert_eq!(store.identity(), ReleaseIdentity::default());
        assert!(store.contributors().is_empty());
        assert!(store.errors().is_empty());
        assert!(store.files().originals_empty());
        assert!(!store.is_live());
        assert_eq!(store.review_status(), None);
    }

    #[test]
    fn partial_replace_leaves_absent_keys_unchanged() {
        let store = ReleaseStore::new();
        store.write_at(&p("license"), json!("GPL-3.0"));
        store.write_at(&p("os"), json!("linux"));

        store
            .replace_release(&json!({"os": "macos", "not_a_release_key": 1}))
            .unwrap();

        let release = store.release_value();
        assert_eq!(release["os"], "macos");
        assert_eq!(release["license"], "GPL-3.0");
        assert!(release.get("not_a_release_key").is_none());
    }

    #[test]
    fn replace_release_rejects_non_objects() {
        let store = ReleaseStore::new();
        let err = store.replace_release(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, EditorError::PayloadNotObject));
    }

    #[test]
    fn replace_release_sets_identity_and_detail() {
        let store = ReleaseStore::new();
        store
            .replace_release(&json!({
                "codebase": {"identifier": "cb-1", "title": "Flocking"},
                "version_number": "1.2.0",
                "platforms": ["netlogo"],
                "embargo_end_date": "2031-01-15"
            }))
            .unwrap();

        assert_eq!(store.identity(), ReleaseIdentity::new("cb-1", "1.2.0"));
        let detail = store.detail();
        assert_eq!(detail.platforms, vec!["netlogo".to_string()]);
        assert_eq!(detail.embargo_end().unwrap().to_string(), "2031-01-15");
    }

    #[test]
    fn contributors_get_fresh_distinct_ids() {
        let store = ReleaseStore::new();
        let people = [
            Contributor::person("Ada", "Lovelace"),
            Contributor::person("Alan", "Turing"),
        ];
        store.set_contributors(&people).unwrap();
        let first: Vec<_> = store
            .contributors()
            .into_iter()
            .map(|c| c.key.unwrap())
            .collect();
        assert_eq!(first.len(), 2);
        assert_ne!(first[0], first[1]);

        store.set_contributors(&people).unwrap();
        let second: Vec<_> = store
            .contributors()
            .into_iter()
            .map(|c| c.key.unwrap())
            .collect();
        assert!(second.iter().all(|k| !first.contains(k)));
    }

    #[test]
    fn replaced_contributors_are_restamped() {
        let store = ReleaseStore::new();
        store
            .replace_release(&json!({
                "release_contributors": [
                    {"_id": "stale", "given_name": "Ada", "family_name": "Lovelace"}
                ]
            }))
            .unwrap();
        let key = store.contributors()[0].key.clone().unwrap();
        assert_ne!(key.0, "stale");
    }

    #[test]
    fn payload_strips_contributor_ids() {
        let store = ReleaseStore::new();
        store
            .set_contributors(&[Contributor::person("Ada", "Lovelace")])
            .unwrap();
        assert!(store.release_value()["release_contributors"][0]
            .get("_id")
            .is_some());

        let payload = store.payload();
        assert!(payload["release_contributors"][0].get("_id").is_none());
        assert_eq!(payload["release_contributors"][0]["given_name"], "Ada");
        assert!(store.release_value()["release_contributors"][0]
            .get("_id")
            .is_some());
    }

    #[test]
    fn path_write_preserves_siblings() {
        let store = ReleaseStore::new();
        store
            .replace_release(&json!({"codebase": {"title": "A", "description": "B"}}))
            .unwrap();
        store.write_at(&p("codebase.title"), json!("C"));
        assert_eq!(store.read(&p("codebase.title")), Some(json!("C")));
        assert_eq!(store.read(&p("codebase.description")), Some(json!("B")));
    }

    #[test]
    fn set_urls_keeps_peer_review_request_link() {
        let store = ReleaseStore::new();
        store.write_at(&p("urls.request_peer_review"), json!("/request/"));
        store.set_urls(&ReviewUrls {
            request_peer_review: Some("/ignored/".to_string()),
            review: Some("/review/".to_string()),
            notify_reviewers_of_changes: None,
        });
        let urls = store.urls();
        assert_eq!(urls.request_peer_review.as_deref(), Some("/request/"));
        assert_eq!(urls.review.as_deref(), Some("/review/"));
        assert_eq!(urls.notify_reviewers_of_changes, None);
    }

    #[test]
    fn set_codebase_replaces_whole_record() {
        let store = ReleaseStore::new();
        store.write_at(&p("codebase.summary"), json!("old summary"));
        let codebase = Codebase {
            title: "New".to_string(),
            ..Codebase::default()
        };
        store.set_codebase(&codebase).unwrap();
        assert_eq!(store.read(&p("codebase.title")), Some(json!("New")));
        assert_eq!(store.read(&p("codebase.summary")), Some(json!("")));
    }

    #[test]
    fn error_sink_clears_and_sets() {
        let store = ReleaseStore::new();
        store.record(&p("os"), Err(vec!["os is a required field".to_string()]));
        assert_eq!(
            store.errors_at(&p("os")),
            Some(vec!["os is a required field".to_string()])
        );
        store.record(&p("os"), Ok(()));
        assert_eq!(store.errors_at(&p("os")), Some(Vec::new()));
        assert_eq!(store.errors_at(&p("license")), None);
    }

    #[test]
    fn wrong_typed_write_reads_as_empty_view() {
        let store = ReleaseStore::new();
        store.write_at(&p("platforms"), json!("not a list"));
        assert!(store.detail().platforms.is_empty());
        assert_eq!(store.read(&p("platforms")), Some(json!("not a list")));
    }

    #[test]
    fn unparseable_embargo_date_is_kept_as_entered() {
        let store = ReleaseStore::new();
        store.write_at(&p("embargo_end_date"), json!("next tuesday"));
        let detail = store.detail();
        assert_eq!(detail.embargo_end_date.as_deref(), Some("next tuesday"));
        assert_eq!(detail.embargo_end(), None);
        assert_eq!(store.release().embargo_end_date.as_deref(), Some("next tuesday"));
    }

    #[test]
    fn unknown_contributor_type_survives_projection() {
        let store = ReleaseStore::new();
        store
            .set_contributors(&[Contributor::person("Ada", "Lovelace")])
            .unwrap();
        store.write_at(&p("release_contributors[0].type"), json!("robot"));

        let contributors = store.contributors();
        assert_eq!(contributors[0].kind, ContributorKind::Other("robot".to_string()));
        assert_eq!(contributors[0].given_name, "Ada");
        assert_eq!(store.payload()["release_contributors"][0]["type"], "robot");
    }

    #[test]
    fn null_contributor_fields_from_server_read_as_empty() {
        let store = ReleaseStore::new();
        store
            .replace_release(&json!({
                "release_contributors": [
                    {"given_name": "Ada", "middle_name": null, "family_name": "Lovelace"}
                ]
            }))
            .unwrap();

        let contributors = store.contributors();
        assert_eq!(contributors.len(), 1);
        assert_eq!(contributors[0].middle_name, "");
        assert_eq!(store.release().release_contributors, contributors);
    }

    #[test]
    fn sparse_contributor_list_keeps_positions() {
        let store = ReleaseStore::new();
        store.write_at(&p("release_contributors[1].given_name"), json!("Alan"));
        let contributors = store.contributors();
        assert_eq!(contributors.len(), 2);
        assert_eq!(contributors[0], Contributor::default());
        assert_eq!(contributors[1].given_name, "Alan");
    }

    #[test]
    fn review_status_set_and_cleared() {
        let store = ReleaseStore::new();
        store
            .set_review_status(Some(ReviewStatus::AwaitingAuthorChanges))
            .unwrap();
        assert_eq!(store.review_status(), Some(ReviewStatus::AwaitingAuthorChanges));
        assert_eq!(
            store.read(&p("review_status")),
            Some(json!("awaiting_author_changes"))
        );

        store.set_review_status(None).unwrap();
        assert_eq!(store.review_status(), None);
        assert_eq!(store.read(&p("review_status")), Some(Value::Null));
    }

    #[test]
    fn unknown_review_status_reads_as_none() {
        let store = ReleaseStore::new();
        store.write_at(&p("review_status"), json!("lost_in_review"));
        assert_eq!(store.review_status(), None);
    }

    #[test]
    fn validation_errors_merge_into_existing_tree() {
        let store = ReleaseStore::new();
        store.set_errors_at(p("os"), vec!["os is a required field".to_string()]);
        store.set_errors_at(p("license"), vec!["license is a required field".to_string()]);

        let mut whole = ErrorTree::new();
        whole.clear(p("os"));
        whole.set(p("platforms"), vec!["platforms is a required field".to_string()]);
        store.set_validation_errors(whole);

        assert_eq!(store.errors_at(&p("os")), Some(Vec::new()));
        assert_eq!(
            store.errors_at(&p("license")),
            Some(vec!["license is a required field".to_string()])
        );
        assert_eq!(
            store.errors_at(&p("platforms")),
            Some(vec!["platforms is a required field".to_string()])
        );
    }

    #[test]
    fn category_slices_are_independent() {
        let store = ReleaseStore::new();
        store.set_files(
            FileCategory::Code,
            vec![FileDescriptor::new("model.nlogo", "/code/model.nlogo")],
        );
        store.set_files(FileCategory::Docs, vec![]);
        assert_eq!(store.category(FileCategory::Code).len(), 1);
        assert!(store.category(FileCategory::Data).is_empty());
    }
}
