//! Payload upload
//!
//! Posts the finished payload to a Coveralls-compatible endpoint as
//! multipart form data.

use anyhow::Result;
use reqwest::multipart::{Form, Part};

use crate::payload::CoverallsPayload;

/// Jobs endpoint on the aggregation service
const JOBS_ENDPOINT: &str = "/api/v1/jobs";

/// Upload the payload. The document travels as a `json_file` form part,
/// which is the shape the jobs endpoint expects.
pub async fn upload_payload(server_url: &str, payload: &CoverallsPayload) -> Result<()> {
    let json = serde_json::to_string(payload)?;

    let part = Part::text(json)
        .file_name("coverage.json")
        .mime_str("application/json")?;
    let form = Form::new().part("json_file", part);

    let url = format!("{}{}", server_url.trim_end_matches('/'), JOBS_ENDPOINT);

    let client = reqwest::Client::new();
    let response = client.post(&url).multipart(form).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        anyhow::bail!("Coverage upload failed: {} - {}", status, text);
    }

    Ok(())
}
