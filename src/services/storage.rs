//! Object-storage REST client implementing the [`ObjectStore`] port.
//!
//! Speaks the OCI-style object-storage surface: the pre-authenticated
//! request collection under `/n/{namespace}/b/{bucket}/p/` and the object
//! listing under `/n/{namespace}/b/{bucket}/o`. Request signing and
//! identity are a deployment concern handled outside this process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::models::{AccessGrant, GrantRequest, ObjectPage, StorageObject};
use crate::services::grants::{ObjectStore, StoreError};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct HttpObjectStore {
    http: reqwest::Client,
    endpoint: String,
    namespace: String,
}

impl HttpObjectStore {
    pub fn new(config: &StorageConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
        })
    }

    fn par_collection(&self, bucket: &str) -> String {
        format!("{}/n/{}/b/{}/p/", self.endpoint, self.namespace, bucket)
    }

    fn object_listing(&self, bucket: &str) -> String {
        format!("{}/n/{}/b/{}/o", self.endpoint, self.namespace, bucket)
    }

    fn check(
        result: Result<reqwest::Response, reqwest::Error>,
        bucket: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let response = result.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(StoreError::BucketNotFound(bucket.to_string()))
        } else {
            Err(StoreError::Unavailable(format!(
                "object storage returned {}",
                status
            )))
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("malformed storage response: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParSummary {
    id: String,
    name: String,
    #[serde(default)]
    access_uri: String,
    time_expires: DateTime<Utc>,
}

impl From<ParSummary> for AccessGrant {
    fn from(par: ParSummary) -> Self {
        AccessGrant {
            id: par.id,
            name: par.name,
            access_uri: par.access_uri,
            expires_at: par.time_expires,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateParBody<'a> {
    name: &'a str,
    object_name: &'a str,
    access_type: &'a str,
    time_expires: DateTime<Utc>,
    bucket_listing_action: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectSummary {
    name: String,
    size: Option<u64>,
    time_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListObjectsResponse {
    objects: Vec<ObjectSummary>,
    next_start_with: Option<String>,
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn list_grants(&self, bucket: &str) -> Result<Vec<AccessGrant>, StoreError> {
        let response = Self::check(
            self.http.get(self.par_collection(bucket)).send().await,
            bucket,
        )?;
        let pars: Vec<ParSummary> = Self::decode(response).await?;
        Ok(pars.into_iter().map(AccessGrant::from).collect())
    }

    async fn delete_grant(&self, bucket: &str, grant_id: &str) -> Result<(), StoreError> {
        let url = format!("{}{}", self.par_collection(bucket), grant_id);
        Self::check(self.http.delete(url).send().await, bucket)?;
        Ok(())
    }

    async fn create_grant(
        &self,
        bucket: &str,
        request: GrantRequest,
    ) -> Result<AccessGrant, StoreError> {
        let body = CreateParBody {
            name: &request.name,
            object_name: &request.object_path,
            access_type: request.access.as_str(),
            time_expires: request.expires_at,
            // Grants never allow enumerating the bucket
            bucket_listing_action: "Deny",
        };

        let response = Self::check(
            self.http
                .post(self.par_collection(bucket))
                .json(&body)
                .send()
                .await,
            bucket,
        )?;
        let par: ParSummary = Self::decode(response).await?;
        Ok(par.into())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        start: Option<&str>,
    ) -> Result<ObjectPage, StoreError> {
        let mut req = self
            .http
            .get(self.object_listing(bucket))
            .query(&[("fields", "size,timeCreated")]);
        if let Some(start) = start {
            req = req.query(&[("start", start)]);
        }

        let response = Self::check(req.send().await, bucket)?;
        let listing: ListObjectsResponse = Self::decode(response).await?;

        Ok(ObjectPage {
            objects: listing
                .objects
                .into_iter()
                .map(|o| StorageObject {
                    name: o.name,
                    size: o.size,
                    time_created: o.time_created,
                })
                .collect(),
            next_start: listing.next_start_with,
        })
    }
}
