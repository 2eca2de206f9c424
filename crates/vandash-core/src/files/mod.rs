// ── File manager ──
//
// Path-based navigation over per-folder listings. Each folder is its own
// query key, so navigating swaps the active subscription. A locked folder
// answers with `{locked: true}`, which the listing view turns into a
// password prompt; after a successful `authenticate` the folder is simply
// re-navigated. The backend alone decides what is unlocked.

mod slideshow;
mod util;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info};
use url::Url;

use vandash_api::{ApiClient, FileItem, FileKind, FolderResponse, UploadFile};

use crate::command::{Command, CommandResult};
use crate::error::CoreError;
use crate::mutation::MutationHandle;
use crate::query::{
    QueryCache, QueryKey, QueryState, QuerySubscription, QueryView, StalePolicy,
    SubscribeOptions, fetcher,
};
use crate::toast::Toaster;

pub use slideshow::Slideshow;
pub use util::{
    Breadcrumb, MAX_UPLOAD_BYTES, breadcrumbs, format_file_size, is_image_file, leaf_name,
    normalize_path, parent_path,
};

/// What the listing area should show.
#[derive(Debug, Clone)]
pub enum ListingView {
    Loading,
    /// The folder needs a password before it can be listed.
    Locked { folder: FileItem },
    Error(CoreError),
    Empty,
    Items {
        items: Arc<Vec<FileItem>>,
        stale: bool,
    },
}

/// Outcome of opening an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened {
    /// Navigated into this folder.
    Folder(String),
    /// A file; its contents are served at this URL.
    File(Url),
}

pub struct FileManager {
    client: ApiClient,
    toaster: Toaster,
    cache: Arc<QueryCache<Vec<FileItem>>>,
    policy: StalePolicy,
    slideshow_period: Duration,
    current_path: watch::Sender<String>,
    listing: Mutex<QuerySubscription<Vec<FileItem>>>,
}

pub(crate) fn listing_key(path: &str) -> QueryKey {
    let key = QueryKey::new("/files/list");
    if path.is_empty() {
        key
    } else {
        key.with_param("path", path)
    }
}

fn subscribe_listing(
    cache: &QueryCache<Vec<FileItem>>,
    client: &ApiClient,
    path: &str,
) -> QuerySubscription<Vec<FileItem>> {
    let client = client.clone();
    let owned = path.to_owned();
    cache.subscribe(
        listing_key(path),
        fetcher(move || {
            let client = client.clone();
            let path = owned.clone();
            async move { client.list_files(&path).await.map_err(CoreError::from) }
        }),
        SubscribeOptions::default().refetch_on_subscribe(),
    )
}

impl FileManager {
    /// Mount at the root folder.
    pub fn mount(
        client: ApiClient,
        toaster: Toaster,
        cache: Arc<QueryCache<Vec<FileItem>>>,
        policy: StalePolicy,
        slideshow_period: Duration,
    ) -> Self {
        let listing = subscribe_listing(&cache, &client, "");
        let (current_path, _) = watch::channel(String::new());
        Self {
            client,
            toaster,
            cache,
            policy,
            slideshow_period,
            current_path,
            listing: Mutex::new(listing),
        }
    }

    fn listing(&self) -> MutexGuard<'_, QuerySubscription<Vec<FileItem>>> {
        self.listing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Navigation ───────────────────────────────────────────────────

    pub fn current_path(&self) -> String {
        self.current_path.borrow().clone()
    }

    pub fn subscribe_path(&self) -> watch::Receiver<String> {
        self.current_path.subscribe()
    }

    /// Show `path` and fetch its listing.
    pub fn navigate(&self, path: &str) {
        let path = normalize_path(path);
        debug!(path, "navigating");
        let next = subscribe_listing(&self.cache, &self.client, &path);
        let previous = std::mem::replace(&mut *self.listing(), next);
        drop(previous);
        self.current_path.send_replace(path);
    }

    pub fn navigate_up(&self) {
        let parent = parent_path(&self.current_path());
        self.navigate(&parent);
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        breadcrumbs(&self.current_path())
    }

    /// Jump to crumb `index` (0 is the root). `false` if out of range.
    pub fn navigate_breadcrumb(&self, index: usize) -> bool {
        let Some(crumb) = self.breadcrumbs().into_iter().nth(index) else {
            return false;
        };
        self.navigate(&crumb.path);
        true
    }

    /// Folders are entered; files resolve to their view URL.
    pub fn open(&self, item: &FileItem) -> Result<Opened, CoreError> {
        if item.is_folder() {
            self.navigate(&item.path);
            Ok(Opened::Folder(normalize_path(&item.path)))
        } else {
            Ok(Opened::File(self.client.file_view_url(&item.path)?))
        }
    }

    pub fn file_url(&self, path: &str) -> Result<Url, CoreError> {
        Ok(self.client.file_view_url(path)?)
    }

    pub fn refetch(&self) {
        self.listing().refetch();
    }

    // ── Listing ──────────────────────────────────────────────────────

    pub fn listing_state(&self) -> QueryState<Vec<FileItem>> {
        self.listing().current()
    }

    pub fn watch_listing(&self) -> watch::Receiver<QueryState<Vec<FileItem>>> {
        self.listing().watch()
    }

    pub fn listing_view(&self) -> ListingView {
        listing_view(&self.listing_state(), &self.current_path(), self.policy)
    }

    /// Wait for the current listing's in-flight fetch, then resolve the view.
    pub async fn load(&self) -> ListingView {
        let path = self.current_path();
        let mut rx = self.watch_listing();
        if let Ok(state) = rx.wait_for(|s| !s.is_fetching()).await {
            return listing_view(&state, &path, self.policy);
        }
        listing_view(&rx.borrow(), &path, self.policy)
    }

    /// Image files of the current listing, in listing order.
    pub fn images(&self) -> Vec<FileItem> {
        self.listing()
            .data()
            .map(|items| {
                items
                    .iter()
                    .filter(|i| !i.is_folder() && is_image_file(&i.name))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Start a slideshow of the current folder's images, at `start` if it
    /// is one of them.
    pub fn slideshow(&self, start: Option<&FileItem>) -> Option<Slideshow> {
        let images = self.images();
        let index = start
            .and_then(|s| images.iter().position(|i| i.path == s.path))
            .unwrap_or(0);
        Slideshow::open(images, index, self.slideshow_period)
    }

    // ── Operations ───────────────────────────────────────────────────

    async fn run(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        MutationHandle::spawn(self.client.clone(), cmd)
            .settled()
            .await
            .into_result()
    }

    fn folder_arg(&self) -> Option<String> {
        Some(self.current_path()).filter(|p| !p.is_empty())
    }

    /// Upload `files` one after another into the current folder. Stops at
    /// the first failure.
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<usize, CoreError> {
        if let Some(big) = files
            .iter()
            .find(|f| u64::try_from(f.bytes.len()).unwrap_or(u64::MAX) > MAX_UPLOAD_BYTES)
        {
            let err = CoreError::ValidationFailed {
                message: format!("{} exceeds the 50 MB upload limit", big.file_name),
            };
            self.toaster.error(err.user_message());
            return Err(err);
        }

        let count = files.len();
        for file in files {
            let cmd = Command::UploadFile {
                file,
                folder: self.folder_arg(),
            };
            if let Err(err) = self.run(cmd).await {
                self.toaster.error(err.message_or("Failed to upload files"));
                return Err(err);
            }
        }

        info!(count, path = %self.current_path(), "files uploaded");
        self.toaster.success("Files uploaded successfully");
        self.refetch();
        Ok(count)
    }

    /// Create a folder in the current folder. Blank names are rejected
    /// without a request.
    pub async fn create_folder(&self, name: &str) -> Result<FolderResponse, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            let err = CoreError::ValidationFailed {
                message: "Folder name cannot be empty".into(),
            };
            self.toaster.error(err.user_message());
            return Err(err);
        }

        let cmd = Command::CreateFolder {
            name: name.to_owned(),
            path: self.folder_arg(),
        };
        match self.run(cmd).await {
            Ok(CommandResult::FolderCreated(resp)) => {
                self.toaster.success("Folder created successfully");
                self.refetch();
                Ok(resp)
            }
            Ok(other) => Err(unexpected(&other)),
            Err(err) => {
                self.toaster.error(err.message_or("Failed to create folder"));
                Err(err)
            }
        }
    }

    pub async fn delete(&self, item: &FileItem) -> Result<(), CoreError> {
        let cmd = Command::DeleteFile {
            path: item.path.clone(),
        };
        match self.run(cmd).await {
            Ok(_) => {
                let noun = if item.is_folder() { "Folder" } else { "File" };
                self.toaster.success(format!("{noun} deleted successfully"));
                self.refetch();
                Ok(())
            }
            Err(err) => {
                self.toaster.error(err.message_or("Failed to delete"));
                Err(err)
            }
        }
    }

    /// Lock or unlock a folder.
    pub async fn set_locked(&self, item: &FileItem, lock: bool) -> Result<(), CoreError> {
        let path = item.path.clone();
        let cmd = if lock {
            Command::LockFolder { path }
        } else {
            Command::UnlockFolder { path }
        };
        match self.run(cmd).await {
            Ok(_) => {
                self.toaster
                    .success(if lock { "Folder locked" } else { "Folder unlocked" });
                self.refetch();
                Ok(())
            }
            Err(err) => {
                let fallback = if lock {
                    "Failed to lock folder"
                } else {
                    "Failed to unlock folder"
                };
                self.toaster.error(err.message_or(fallback));
                Err(err)
            }
        }
    }

    /// Send the folder password, then re-enter the folder.
    pub async fn authenticate(&self, folder: &str, password: SecretString) -> Result<(), CoreError> {
        let path = normalize_path(folder);
        let cmd = Command::AuthenticateFolder {
            path: path.clone(),
            password,
        };
        match self.run(cmd).await {
            Ok(_) => {
                self.toaster.success("Password accepted");
                self.navigate(&path);
                Ok(())
            }
            Err(err) => {
                self.toaster.error(err.message_or("Invalid password"));
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for FileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileManager")
            .field("current_path", &self.current_path())
            .finish_non_exhaustive()
    }
}

fn unexpected(result: &CommandResult) -> CoreError {
    CoreError::Internal(format!("unexpected command result: {result:?}"))
}

/// Resolve a listing state for the folder at `path`.
///
/// The locked shape wins over everything but the first load, so a locked
/// folder never renders as empty or as a generic error.
pub fn listing_view(
    state: &QueryState<Vec<FileItem>>,
    path: &str,
    policy: StalePolicy,
) -> ListingView {
    if state.is_loading() {
        return ListingView::Loading;
    }
    if let Some(err) = &state.error {
        if err.is_locked() {
            return ListingView::Locked {
                folder: locked_folder(path),
            };
        }
    }
    match state.view(policy, false) {
        QueryView::Loading => ListingView::Loading,
        QueryView::Error(err) => ListingView::Error(err),
        QueryView::Content { data, .. } if data.is_empty() => ListingView::Empty,
        QueryView::Content { data, stale } => ListingView::Items { items: data, stale },
    }
}

fn locked_folder(path: &str) -> FileItem {
    let name = match leaf_name(path) {
        "" => "Folder",
        leaf => leaf,
    };
    FileItem {
        name: name.to_owned(),
        kind: FileKind::Folder,
        size: None,
        modified: None,
        path: path.to_owned(),
        locked: true,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn settled(result: Result<Vec<FileItem>, CoreError>) -> QueryState<Vec<FileItem>> {
        let mut state = QueryState::default();
        state.begin(1);
        state.commit(1, result, chrono::Utc::now());
        state
    }

    #[test]
    fn locked_error_becomes_password_prompt() {
        let state = settled(Err(CoreError::Server {
            status: 403,
            message: Some("Folder is locked".into()),
            locked: true,
        }));
        match listing_view(&state, "trips/private", StalePolicy::strict()) {
            ListingView::Locked { folder } => {
                assert_eq!(folder.name, "private");
                assert_eq!(folder.path, "trips/private");
                assert!(folder.locked);
            }
            other => panic!("expected locked view, got {other:?}"),
        }
    }

    #[test]
    fn empty_and_generic_error() {
        let empty = settled(Ok(Vec::new()));
        assert!(matches!(
            listing_view(&empty, "", StalePolicy::strict()),
            ListingView::Empty
        ));

        let failed = settled(Err(CoreError::Transport {
            message: "offline".into(),
        }));
        assert!(matches!(
            listing_view(&failed, "", StalePolicy::strict()),
            ListingView::Error(_)
        ));
    }

    #[test]
    fn root_keys_have_no_path_param() {
        assert_eq!(listing_key("").to_string(), "/files/list");
        assert_eq!(listing_key("trips").to_string(), "/files/list?path=trips");
    }
}
