//! Object storage client for proof documents
//!
//! The storage service owns uploads and downloads; this client only asks it
//! for upload slots. The returned key and URL are opaque to the platform
//! and stored verbatim.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Object storage client
#[derive(Clone)]
pub struct ObjectStorageClient {
    client: Client,
    endpoint: String,
    bucket: String,
}

/// Opaque reference to a stored object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Request body for an upload slot
#[derive(Debug, Serialize)]
struct UploadSlotRequest<'a> {
    bucket: &'a str,
    filename: &'a str,
    content_type: &'a str,
}

impl ObjectStorageClient {
    /// Create a new ObjectStorageClient instance
    pub fn new(endpoint: String, bucket: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            bucket,
        }
    }

    /// Request an upload slot for a proof document
    ///
    /// Returns the storage key and the URL the caller uploads to.
    pub async fn request_upload_slot(
        &self,
        filename: &str,
        content_type: &str,
    ) -> AppResult<StoredObject> {
        let url = format!("{}/v1/upload-slots", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&UploadSlotRequest {
                bucket: &self.bucket,
                filename,
                content_type,
            })
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Upload slot request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::StorageError(format!(
                "Storage service returned status {}",
                response.status()
            )));
        }

        response
            .json::<StoredObject>()
            .await
            .map_err(|e| AppError::StorageError(format!("Invalid storage response: {}", e)))
    }
}
