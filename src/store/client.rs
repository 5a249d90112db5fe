use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::StoreError;
use crate::model::{Driver, Job, Manifest, Vehicle};

/// CRUD seam over the external record store.
///
/// Everything the engine persists goes through this trait, so tests and the
/// demo run against an in-memory implementation while production uses
/// [`HttpRecordStore`]. Create/update calls return the persisted row,
/// including server-assigned timestamps.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError>;
    async fn put_job(&self, job: &Job) -> Result<Job, StoreError>;
    async fn jobs_for_manifest(&self, manifest_id: &str) -> Result<Vec<Job>, StoreError>;
    async fn get_driver(&self, id: &str) -> Result<Option<Driver>, StoreError>;
    async fn get_vehicle(&self, id: &str) -> Result<Option<Vehicle>, StoreError>;
    async fn get_manifest(&self, id: &str) -> Result<Option<Manifest>, StoreError>;
    async fn find_manifest_by_key(&self, dispatch_key: &str)
    -> Result<Option<Manifest>, StoreError>;
    async fn create_manifest(&self, manifest: &Manifest) -> Result<Manifest, StoreError>;
    async fn put_manifest(&self, manifest: &Manifest) -> Result<Manifest, StoreError>;
}

pub struct HttpRecordStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpRecordStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_timeout(base_url, api_key, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_opt<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        let response = self
            .client
            .get(self.url(path))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = check(response).await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let response = self
            .client
            .post(self.url(path))
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;
        let body = check(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let response = self
            .client
            .put(self.url(path))
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }
        let body = check(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn map_send_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Http(err)
    }
}

async fn check(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(StoreError::ApiError {
            status: status.as_u16(),
            message,
        });
    }
    response.text().await.map_err(StoreError::Http)
}

impl RecordStore for HttpRecordStore {
    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        self.get_opt(&format!("/jobs/{id}")).await
    }

    async fn put_job(&self, job: &Job) -> Result<Job, StoreError> {
        self.put_json(&format!("/jobs/{}", job.id), job).await
    }

    async fn jobs_for_manifest(&self, manifest_id: &str) -> Result<Vec<Job>, StoreError> {
        let jobs: Option<Vec<Job>> = self
            .get_opt(&format!("/jobs?manifest_id={manifest_id}"))
            .await?;
        Ok(jobs.unwrap_or_default())
    }

    async fn get_driver(&self, id: &str) -> Result<Option<Driver>, StoreError> {
        self.get_opt(&format!("/drivers/{id}")).await
    }

    async fn get_vehicle(&self, id: &str) -> Result<Option<Vehicle>, StoreError> {
        self.get_opt(&format!("/vehicles/{id}")).await
    }

    async fn get_manifest(&self, id: &str) -> Result<Option<Manifest>, StoreError> {
        self.get_opt(&format!("/manifests/{id}")).await
    }

    async fn find_manifest_by_key(
        &self,
        dispatch_key: &str,
    ) -> Result<Option<Manifest>, StoreError> {
        let matches: Option<Vec<Manifest>> = self
            .get_opt(&format!("/manifests?dispatch_key={dispatch_key}"))
            .await?;
        Ok(matches.unwrap_or_default().into_iter().next())
    }

    async fn create_manifest(&self, manifest: &Manifest) -> Result<Manifest, StoreError> {
        self.post_json("/manifests", manifest).await
    }

    async fn put_manifest(&self, manifest: &Manifest) -> Result<Manifest, StoreError> {
        self.put_json(&format!("/manifests/{}", manifest.id), manifest)
            .await
    }
}
