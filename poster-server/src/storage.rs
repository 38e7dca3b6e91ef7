//! Poster storage adapters.
//!
//! [`PosterStorage`] is the seam between the HTTP handlers and wherever
//! posters live. [`LocalStorage`] keeps them in a [`PosterStore`];
//! [`RemoteStorage`] forwards to another service speaking the same
//! `/api/posters` contract.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use poster_core::{
    NewPoster, PosterArtifact, PosterId, PosterStore, RenderSnapshot, SeedLabel, StoreError,
};
use poster_renderer::ExportedImage;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::metrics;

/// Path appended to a remote base URL that has none.
pub const POSTERS_PATH: &str = "/api/posters";

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The local store rejected the operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// The remote base URL is invalid.
    #[error("invalid storage URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// A response body could not be parsed.
    #[error("failed to parse storage response: {0}")]
    Json(#[from] serde_json::Error),
    /// The remote answered with a non-success status.
    #[error("storage returned {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the response, or its raw body.
        message: String,
    },
}

/// Where saved posters live.
#[async_trait]
pub trait PosterStorage: Send + Sync + fmt::Debug {
    /// Save an upload and return the new poster's id.
    async fn save(&self, upload: NewPoster) -> Result<PosterId, StorageError>;

    /// Every saved poster, newest first.
    async fn list_all(&self) -> Result<Vec<PosterArtifact>, StorageError>;

    /// Delete a poster. Deleting an unknown id is not an error.
    async fn delete(&self, id: &PosterId) -> Result<(), StorageError>;

    /// Check that the backend can serve requests.
    async fn check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Storage backed by an in-process [`PosterStore`].
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    store: PosterStore,
}

impl LocalStorage {
    /// Wrap an existing store.
    #[must_use]
    pub fn new(store: PosterStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &PosterStore {
        &self.store
    }
}

#[async_trait]
impl PosterStorage for LocalStorage {
    async fn save(&self, upload: NewPoster) -> Result<PosterId, StorageError> {
        let saved = self.store.save(upload)?;
        metrics::set_posters_stored(self.store.len());
        Ok(saved.id)
    }

    async fn list_all(&self) -> Result<Vec<PosterArtifact>, StorageError> {
        Ok(self.store.list_all())
    }

    async fn delete(&self, id: &PosterId) -> Result<(), StorageError> {
        if self.store.delete(id) {
            metrics::set_posters_stored(self.store.len());
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ListBody {
    posters: Vec<PosterArtifact>,
}

#[derive(Deserialize)]
struct SaveBody {
    id: PosterId,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Storage on another service implementing the posters contract.
#[derive(Debug, Clone)]
pub struct RemoteStorage {
    http: Client,
    endpoint: Url,
}

impl RemoteStorage {
    /// Client for the posters endpoint at `base_url`. A URL without a path
    /// gets `/api/posters`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidUrl`] if the URL is malformed and
    /// [`StorageError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, StorageError> {
        let mut endpoint =
            Url::parse(base_url.as_ref()).map_err(|e| StorageError::InvalidUrl(e.to_string()))?;
        if endpoint.path().is_empty() || endpoint.path() == "/" {
            endpoint.set_path(POSTERS_PATH);
        }
        let http = Client::builder()
            .user_agent(concat!("program-a/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, endpoint })
    }

    /// The posters endpoint requests go to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StorageError> {
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map_or_else(|_| String::from_utf8_lossy(&body).into_owned(), |b| b.error);
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl PosterStorage for RemoteStorage {
    #[tracing::instrument(name = "remote_save", skip(self, upload))]
    async fn save(&self, upload: NewPoster) -> Result<PosterId, StorageError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&upload)
            .send()
            .await?;
        let body: SaveBody = Self::read(response).await?;
        Ok(body.id)
    }

    async fn list_all(&self) -> Result<Vec<PosterArtifact>, StorageError> {
        let response = self.http.get(self.endpoint.clone()).send().await?;
        let body: ListBody = Self::read(response).await?;
        Ok(body.posters)
    }

    #[tracing::instrument(name = "remote_delete", skip(self))]
    async fn delete(&self, id: &PosterId) -> Result<(), StorageError> {
        let response = self
            .http
            .delete(self.endpoint.clone())
            .json(&json!({ "id": id }))
            .send()
            .await?;
        let _: serde_json::Value = Self::read(response).await?;
        Ok(())
    }

    async fn check(&self) -> Result<(), StorageError> {
        self.list_all().await.map(|_| ())
    }
}

/// Upload describing an exported poster.
#[must_use]
pub fn upload_for(image: &ExportedImage, snapshot: &RenderSnapshot) -> NewPoster {
    NewPoster::new(image.to_data_url())
        .with_editor(snapshot.kind().as_str())
        .with_seed(SeedLabel::from(&snapshot.seed))
        .with_filename(image.filename.clone())
        .with_size(image.width, image.height)
}

/// Save `upload` on a background task.
///
/// Failures are logged and never reach the caller; the handle resolves to
/// the new id when the save succeeded.
pub fn dispatch_save(
    storage: Arc<dyn PosterStorage>,
    upload: NewPoster,
) -> JoinHandle<Option<PosterId>> {
    tokio::spawn(async move {
        match storage.save(upload).await {
            Ok(id) => {
                metrics::record_storage_op("save", true);
                tracing::debug!(%id, "Poster saved");
                Some(id)
            }
            Err(err) => {
                metrics::record_storage_op("save", false);
                tracing::warn!("Failed to save poster: {}", err);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use poster_core::{EditorKind, PatternParams, Seed};
    use poster_renderer::{export_at, ExportFormat};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn artifact_json(id: &str, timestamp: u64) -> serde_json::Value {
        json!({
            "id": id,
            "dataURL": "data:image/png;base64,AAAA",
            "editor": "rombi",
            "seed": "dawn",
            "timestamp": timestamp,
            "filename": "rombi-poster-1.png",
            "width": 1000,
            "height": 1500
        })
    }

    #[tokio::test]
    async fn local_storage_round_trip() {
        let storage = LocalStorage::default();
        let id = storage
            .save(NewPoster::new("data:image/png;base64,AAAA").with_timestamp(5))
            .await
            .expect("save");
        let all = storage.list_all().await.expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);

        storage.delete(&id).await.expect("delete");
        storage
            .delete(&PosterId::from_string("missing"))
            .await
            .expect("unknown ids are fine");
        assert!(storage.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn local_storage_rejects_missing_image() {
        let storage = LocalStorage::default();
        let err = storage.save(NewPoster::default()).await.unwrap_err();
        assert!(matches!(err, StorageError::Store(StoreError::Invalid(_))));
    }

    #[tokio::test]
    async fn dispatch_swallows_failures() {
        let storage: Arc<dyn PosterStorage> = Arc::new(LocalStorage::default());
        let handle = dispatch_save(Arc::clone(&storage), NewPoster::default());
        assert_eq!(handle.await.expect("join"), None);

        let handle = dispatch_save(Arc::clone(&storage), NewPoster::new("data:image/png;base64,AA"));
        assert!(handle.await.expect("join").is_some());
    }

    #[test]
    fn upload_describes_the_export() {
        let snapshot =
            RenderSnapshot::new(Seed::parse("dawn"), PatternParams::defaults(EditorKind::Rombi));
        let image = export_at(&snapshot, (60, 90), (60, 90), ExportFormat::Png).expect("export");
        let upload = upload_for(&image, &snapshot);
        assert_eq!(upload.editor.as_deref(), Some("rombi"));
        assert_eq!(upload.seed, Some(SeedLabel::Text("dawn".into())));
        assert_eq!(upload.filename.as_deref(), Some(image.filename.as_str()));
        assert_eq!((upload.width, upload.height), (Some(60), Some(90)));
        assert!(upload
            .data_url
            .as_deref()
            .is_some_and(|d| d.starts_with("data:image/png;base64,")));
    }

    #[test]
    fn remote_endpoint_defaults_path() {
        let remote = RemoteStorage::new("http://localhost:8888").expect("client");
        assert_eq!(remote.endpoint().path(), POSTERS_PATH);
        let netlify =
            RemoteStorage::new("https://example.org/.netlify/functions/posters").expect("client");
        assert_eq!(netlify.endpoint().path(), "/.netlify/functions/posters");
        assert!(matches!(
            RemoteStorage::new("not a url"),
            Err(StorageError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn remote_save_posts_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(POSTERS_PATH))
            .and(body_json(json!({
                "dataURL": "data:image/png;base64,AAAA",
                "editor": "sand"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "abc-123" })))
            .mount(&server)
            .await;

        let remote = RemoteStorage::new(server.uri()).expect("client");
        let id = remote
            .save(NewPoster::new("data:image/png;base64,AAAA").with_editor("sand"))
            .await
            .expect("save");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn remote_list_parses_posters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(POSTERS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posters": [artifact_json("b", 20), artifact_json("a", 10)]
            })))
            .mount(&server)
            .await;

        let remote = RemoteStorage::new(server.uri()).expect("client");
        let posters = remote.list_all().await.expect("list");
        assert_eq!(posters.len(), 2);
        assert_eq!(posters[0].id.as_str(), "b");
        assert_eq!(posters[1].seed, Some(SeedLabel::Text("dawn".into())));
        remote.check().await.expect("healthy");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn remote_delete_sends_id() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(POSTERS_PATH))
            .and(body_json(json!({ "id": "gone" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let remote = RemoteStorage::new(server.uri()).expect("client");
        remote
            .delete(&PosterId::from_string("gone"))
            .await
            .expect("delete");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn remote_errors_carry_the_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(POSTERS_PATH))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "Missing dataURL" })),
            )
            .mount(&server)
            .await;

        let remote = RemoteStorage::new(server.uri()).expect("client");
        match remote.save(NewPoster::default()).await.unwrap_err() {
            StorageError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Missing dataURL");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
