// File manager endpoints
//
// Listing is path-scoped via the `path` query parameter (omitted for the
// root folder). Locked folders reject listing with `{error, locked: true}`
// until `authenticate_folder` succeeds; the backend alone tracks that.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::client::ApiClient;
use crate::error::{Error, ServerErrorBody};
use crate::models::{FileItem, FolderResponse, SuccessResponse, UploadResponse};

/// A file to upload: name plus contents.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The listing endpoint answers either an array or an error object,
/// sometimes with HTTP 200.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Items(Vec<FileItem>),
    Rejected(ServerErrorBody),
}

impl ApiClient {
    /// List a folder. `path` is relative to the upload root; `""` is the root.
    ///
    /// `GET /files/list?path={path}`
    pub async fn list_files(&self, path: &str) -> Result<Vec<FileItem>, Error> {
        let mut url = self.url("files/list")?;
        if !path.is_empty() {
            url.query_pairs_mut().append_pair("path", path);
        }
        match self.get::<Listing>(url).await? {
            Listing::Items(items) => Ok(items),
            Listing::Rejected(body) => Err(Error::from_payload(200, body)),
        }
    }

    /// Upload one file into `folder` (root when `None`).
    ///
    /// `POST /files/upload` (multipart: `file`, `folder?`)
    pub async fn upload_file(
        &self,
        file: UploadFile,
        folder: Option<&str>,
    ) -> Result<UploadResponse, Error> {
        let url = self.url("files/upload")?;
        debug!(file = %file.file_name, ?folder, "uploading file");

        let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(folder) = folder.filter(|f| !f.is_empty()) {
            form = form.text("folder", folder.to_owned());
        }
        self.post_multipart(url, form).await
    }

    /// Create a folder named `name` inside `path` (root when `None`).
    ///
    /// `POST /files/folder` with `{"name": "...", "path": "..."}`
    pub async fn create_folder(
        &self,
        name: &str,
        path: Option<&str>,
    ) -> Result<FolderResponse, Error> {
        let url = self.url("files/folder")?;
        debug!(name, ?path, "creating folder");
        let mut body = serde_json::Map::new();
        body.insert("name".into(), json!(name));
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            body.insert("path".into(), json!(path));
        }
        self.post(url, &serde_json::Value::Object(body)).await
    }

    /// Delete a file or folder.
    ///
    /// `DELETE /files/delete` with `{"path": "..."}`
    pub async fn delete_file(&self, path: &str) -> Result<SuccessResponse, Error> {
        let url = self.url("files/delete")?;
        debug!(path, "deleting");
        self.delete(url, &json!({ "path": path })).await
    }

    /// Unlock a locked folder for subsequent listings.
    ///
    /// `POST /files/authenticate` with `{"password": "...", "path": "..."}`
    pub async fn authenticate_folder(
        &self,
        path: &str,
        password: &SecretString,
    ) -> Result<SuccessResponse, Error> {
        let url = self.url("files/authenticate")?;
        debug!(path, "authenticating folder");
        self.post(
            url,
            &json!({ "password": password.expose_secret(), "path": path }),
        )
        .await
    }

    /// `POST /files/lock` with `{"path": "..."}`
    pub async fn lock_folder(&self, path: &str) -> Result<SuccessResponse, Error> {
        let url = self.url("files/lock")?;
        debug!(path, "locking folder");
        self.post(url, &json!({ "path": path })).await
    }

    /// `POST /files/unlock` with `{"path": "..."}`
    pub async fn unlock_folder(&self, path: &str) -> Result<SuccessResponse, Error> {
        let url = self.url("files/unlock")?;
        debug!(path, "unlocking folder");
        self.post(url, &json!({ "path": path })).await
    }

    /// URL that serves a file's contents: `/files/view/{path}`, with each
    /// path segment percent-encoded.
    pub fn file_view_url(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.url("files/view")?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn view_url_encodes_each_segment() {
        let client = ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://van.local:5000").unwrap(),
        );
        let url = client.file_view_url("trips/summer 2024/a#1.jpg").unwrap();
        assert_eq!(
            url.as_str(),
            "http://van.local:5000/files/view/trips/summer%202024/a%231.jpg"
        );
    }
}
