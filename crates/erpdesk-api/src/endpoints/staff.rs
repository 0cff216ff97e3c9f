// Staff directory endpoints, including the one multipart upload.

use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Page, Staff, StaffDocument, StaffQuery};

impl ApiClient {
    /// `GET /staff` filtered by `query`.
    pub async fn search_staff(&self, query: &StaffQuery) -> Result<Page<Staff>, Error> {
        self.get_with_params("/staff", &query.to_params()).await
    }

    /// `GET /staff/{id}`
    pub async fn get_staff(&self, id: &str) -> Result<Staff, Error> {
        self.get(&format!("/staff/{id}")).await
    }

    /// `POST /staff/{id}/documents` as `multipart/form-data` with a single
    /// `file` part.
    pub async fn upload_staff_document(
        &self,
        id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<StaffDocument, Error> {
        debug!(id, file_name, size = bytes.len(), "uploading staff document");
        let part = Part::bytes(bytes).file_name(file_name.to_owned());
        let form = Form::new().part("file", part);
        self.request_multipart(&format!("/staff/{id}/documents"), form)
            .await
    }
}
