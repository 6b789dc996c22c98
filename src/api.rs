//! HTTP client for the drive backend.
//!
//! The backend is an opaque remote store with three endpoints: `get_data`
//! (snapshot fetch), `up_data` (snapshot persist), and `download` (download
//! trigger). Requests carry the static `user_id`/`token` pair; the snapshot
//! is a flat list of path-addressed records in one of a few historical
//! response shapes, all accepted here.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::drive::record::FileRecord;
use crate::error::{AppError, Result};

/// A decoded backend snapshot.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub records: Vec<FileRecord>,
    /// Bookkeeping id some backend deployments attach to the file list;
    /// echoed back verbatim on persist when present.
    pub last_message_id: Option<i64>,
}

/// The shapes `get_data` has answered with across backend versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotPayload {
    Bare(Vec<FileRecord>),
    UserData {
        user_data: Vec<FileRecord>,
    },
    Files {
        files: Vec<FileRecord>,
        #[serde(default)]
        last_message_id: Option<i64>,
    },
}

impl From<SnapshotPayload> for Snapshot {
    fn from(payload: SnapshotPayload) -> Self {
        match payload {
            SnapshotPayload::Bare(records) | SnapshotPayload::UserData { user_data: records } => {
                Snapshot {
                    records,
                    last_message_id: None,
                }
            }
            SnapshotPayload::Files {
                files,
                last_message_id,
            } => Snapshot {
                records: files,
                last_message_id,
            },
        }
    }
}

/// Client for the remote store.
pub struct RemoteStore {
    client: reqwest::Client,
    host: String,
    user_id: String,
    token: String,
}

impl RemoteStore {
    pub fn new(host: &str, user_id: &str, token: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            user_id: user_id.to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.host, endpoint)
    }

    /// Fetch the full drive snapshot.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
        debug!(endpoint = "get_data", "fetching snapshot");
        let resp = self
            .client
            .post(self.url("get_data"))
            .json(&json!({ "user_id": self.user_id, "token": self.token }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(endpoint = "get_data", status = status.as_u16(), "fetch failed");
            return Err(AppError::Api {
                endpoint: "get_data",
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await?;
        let payload: SnapshotPayload = serde_json::from_slice(&bytes)?;
        let snapshot = Snapshot::from(payload);
        debug!(records = snapshot.records.len(), "snapshot loaded");
        Ok(snapshot)
    }

    /// Push the full flattened state. Best-effort: the caller reports
    /// failure to the user and does not roll anything back.
    pub async fn persist(
        &self,
        records: &[FileRecord],
        last_message_id: Option<i64>,
    ) -> Result<()> {
        debug!(
            endpoint = "up_data",
            records = records.len(),
            "persisting snapshot"
        );
        let body = persist_body(&self.user_id, &self.token, records, last_message_id);
        let resp = self
            .client
            .post(self.url("up_data"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(endpoint = "up_data", status = status.as_u16(), "persist failed");
            return Err(AppError::Api {
                endpoint: "up_data",
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Ask the backend to deliver a file through the bot.
    pub async fn request_download(&self, file_id: &str, file_type: &str) -> Result<()> {
        debug!(endpoint = "download", file_id, "requesting download");
        let resp = self
            .client
            .post(self.url("download"))
            .json(&json!({
                "user_id": self.user_id,
                "token": self.token,
                "file_id": file_id,
                "file_type": file_type,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Api {
                endpoint: "download",
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Build the `up_data` request body. The `user_data` payload is the bare
/// record array, or the wrapped `{files, last_message_id}` form when the
/// snapshot carried a message id.
fn persist_body(
    user_id: &str,
    token: &str,
    records: &[FileRecord],
    last_message_id: Option<i64>,
) -> serde_json::Value {
    let user_data = match last_message_id {
        Some(id) => json!({ "files": records, "last_message_id": id }),
        None => json!(records),
    };
    json!({
        "user_id": user_id,
        "token": token,
        "user_data": user_data,
    })
}
