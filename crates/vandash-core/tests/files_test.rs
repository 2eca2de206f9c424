#![allow(clippy::unwrap_used)]
// File manager flows against a wiremock backend.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vandash_api::ApiClient;
use vandash_core::{
    CoreError, Dashboard, DashboardConfig, FileItem, FileKind, ListingView, Opened, ToastStatus,
    UploadFile,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn dashboard(server: &MockServer) -> Dashboard {
    let url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), url.clone());
    Dashboard::with_client(DashboardConfig::new(url), client)
}

async fn mount_root(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/files/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn root_items() -> serde_json::Value {
    json!([
        {"name": "photos", "type": "folder", "path": "photos"},
        {"name": "private", "type": "folder", "path": "private", "locked": true},
        {"name": "notes.txt", "type": "file", "size": 2048, "path": "notes.txt"}
    ])
}

fn toast(dashboard: &Dashboard) -> (Option<String>, ToastStatus) {
    let t = dashboard.toaster().current();
    (t.message, t.status)
}

// ── Listing and navigation ──────────────────────────────────────────

#[tokio::test]
async fn test_root_listing_and_open() {
    let server = MockServer::start().await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    let ListingView::Items { items, stale } = files.load().await else {
        panic!("expected items");
    };
    assert!(!stale);
    assert_eq!(items.len(), 3);

    let opened = files.open(&items[2]).unwrap();
    assert_eq!(
        opened,
        Opened::File(Url::parse(&format!("{}/files/view/notes.txt", server.uri())).unwrap())
    );
    // Opening a file does not navigate.
    assert_eq!(files.current_path(), "");
}

#[tokio::test]
async fn test_empty_folder_renders_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/list"))
        .and(query_param("path", "photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    files.load().await;
    assert_eq!(
        files.open(&FileItem {
            name: "photos".into(),
            kind: FileKind::Folder,
            size: None,
            modified: None,
            path: "photos".into(),
            locked: false,
        })
        .unwrap(),
        Opened::Folder("photos".into())
    );
    assert!(matches!(files.load().await, ListingView::Empty));

    let crumbs = files.breadcrumbs();
    assert_eq!(crumbs.len(), 2);
    assert_eq!(crumbs[1].label, "photos");
    assert!(files.navigate_breadcrumb(0));
    assert_eq!(files.current_path(), "");
}

#[tokio::test]
async fn test_locked_folder_prompts_then_lists_after_password() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/list"))
        .and(query_param("path", "private"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "Folder is locked",
            "locked": true
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/list"))
        .and(query_param("path", "private"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "diary.txt", "type": "file", "size": 10, "path": "private/diary.txt"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/authenticate"))
        .and(body_json(json!({"password": "hunter2", "path": "private"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    files.load().await;

    files.navigate("private");
    let ListingView::Locked { folder } = files.load().await else {
        panic!("expected a password prompt");
    };
    assert_eq!(folder.name, "private");
    assert!(folder.locked);

    files
        .authenticate(&folder.path, SecretString::from("hunter2".to_owned()))
        .await
        .unwrap();
    assert_eq!(
        toast(&dashboard),
        (Some("Password accepted".into()), ToastStatus::Success)
    );

    let ListingView::Items { items, .. } = files.load().await else {
        panic!("expected the unlocked listing");
    };
    assert_eq!(items[0].name, "diary.txt");
}

#[tokio::test]
async fn test_wrong_password_keeps_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files/authenticate"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid password"})),
        )
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    files.load().await;

    let err = files
        .authenticate("private", SecretString::from("nope".to_owned()))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Server { status: 401, .. }));
    assert_eq!(
        toast(&dashboard),
        (Some("Invalid password".into()), ToastStatus::Error)
    );
    assert_eq!(files.current_path(), "");
}

#[tokio::test]
async fn test_prune_drops_listings_left_behind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/list"))
        .and(query_param("path", "photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "sunset.jpg", "type": "file", "size": 10, "path": "photos/sunset.jpg"}
        ])))
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    files.load().await;
    let root = dashboard.cached_listing("").unwrap();
    assert_eq!(root.data.map(|items| items.len()), Some(3));

    files.navigate("photos");
    files.load().await;
    assert_eq!(dashboard.prune_unused(), 1);
    assert!(dashboard.cached_listing("").is_none());
    assert!(dashboard.cached_listing("photos").is_some());

    drop(files);
    assert_eq!(dashboard.prune_unused(), 1);
    assert!(dashboard.cached_listing("photos").is_none());
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_blank_folder_name_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files/folder"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    let err = files.create_folder("   ").await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert_eq!(
        toast(&dashboard),
        (Some("Folder name cannot be empty".into()), ToastStatus::Error)
    );
}

#[tokio::test]
async fn test_create_folder_in_current_path_refreshes_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/list"))
        .and(query_param("path", "photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/folder"))
        .and(body_json(json!({"name": "2024", "path": "photos"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "path": "photos/2024"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    files.navigate("photos");
    files.load().await;

    let created = files.create_folder(" 2024 ").await.unwrap();
    assert_eq!(created.path, "photos/2024");
    assert_eq!(
        toast(&dashboard),
        (Some("Folder created successfully".into()), ToastStatus::Success)
    );
    files.load().await;

    let listings = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/files/list" && r.url.query() == Some("path=photos"))
        .count();
    assert_eq!(listings, 2);
}

#[tokio::test]
async fn test_upload_reports_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "filename": "van.jpg",
            "path": "van.jpg"
        })))
        .expect(2)
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    let uploaded = files
        .upload(vec![
            UploadFile {
                file_name: "van.jpg".into(),
                bytes: vec![0xff, 0xd8, 0xff],
            },
            UploadFile {
                file_name: "map.png".into(),
                bytes: vec![0x89, 0x50],
            },
        ])
        .await
        .unwrap();
    assert_eq!(uploaded, 2);
    assert_eq!(
        toast(&dashboard),
        (Some("Files uploaded successfully".into()), ToastStatus::Success)
    );
}

#[tokio::test]
async fn test_delete_failure_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/files/delete"))
        .and(body_json(json!({"path": "notes.txt"})))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "File not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    let ListingView::Items { items, .. } = files.load().await else {
        panic!("expected items");
    };

    files.delete(&items[2]).await.unwrap_err();
    assert_eq!(
        toast(&dashboard),
        (Some("File not found".into()), ToastStatus::Error)
    );
}

#[tokio::test]
async fn test_delete_failure_with_html_body_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/files/delete"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("<html><body>Internal Server Error</body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    let ListingView::Items { items, .. } = files.load().await else {
        panic!("expected items");
    };

    let err = files.delete(&items[2]).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Server {
            status: 500,
            message: None,
            ..
        }
    ));
    assert_eq!(
        toast(&dashboard),
        (Some("Failed to delete".into()), ToastStatus::Error)
    );
}

#[tokio::test]
async fn test_lock_folder_toasts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files/lock"))
        .and(body_json(json!({"path": "photos"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    mount_root(&server, root_items()).await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    let ListingView::Items { items, .. } = files.load().await else {
        panic!("expected items");
    };

    files.set_locked(&items[0], true).await.unwrap();
    assert_eq!(
        toast(&dashboard),
        (Some("Folder locked".into()), ToastStatus::Success)
    );
}

#[tokio::test]
async fn test_slideshow_starts_at_chosen_image() {
    let server = MockServer::start().await;
    mount_root(
        &server,
        json!([
            {"name": "a.jpg", "type": "file", "path": "a.jpg"},
            {"name": "readme.md", "type": "file", "path": "readme.md"},
            {"name": "b.PNG", "type": "file", "path": "b.PNG"}
        ]),
    )
    .await;

    let dashboard = dashboard(&server);
    let files = dashboard.files();
    files.load().await;

    let images = files.images();
    assert_eq!(images.len(), 2);
    let show = files.slideshow(Some(&images[1])).unwrap();
    assert_eq!(show.index(), 1);
    assert_eq!(show.current().unwrap().name, "b.PNG");
}
