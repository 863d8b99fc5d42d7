use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const RECEIPT_SCHEMA_VERSION: u64 = 1;

/// The resolved request behind one composition or edit call, as recorded in
/// the receipt written next to the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeReceipt {
    pub mode: String,
    pub person_count: u64,
    pub pose: Option<String>,
    pub scene: Option<String>,
    pub aspect_ratio: Option<String>,
    pub preserve_outfits: Option<bool>,
    pub shared_background: Option<bool>,
    pub directive: String,
    pub provider: String,
    pub model: String,
}

pub fn build_receipt(
    request: &ComposeReceipt,
    provider_response: &Map<String, Value>,
    image_path: &Path,
    checksum_sha256: &str,
    byte_len: u64,
) -> Value {
    let mut root = Map::new();
    root.insert(
        "schema_version".to_string(),
        Value::Number(RECEIPT_SCHEMA_VERSION.into()),
    );
    root.insert(
        "request".to_string(),
        sanitize_payload(&serde_json::to_value(request).unwrap_or(Value::Null)),
    );
    root.insert(
        "provider_response".to_string(),
        sanitize_payload(&Value::Object(provider_response.clone())),
    );

    let mut artifact = Map::new();
    artifact.insert(
        "image_path".to_string(),
        Value::String(image_path.to_string_lossy().to_string()),
    );
    artifact.insert(
        "checksum_sha256".to_string(),
        Value::String(checksum_sha256.to_string()),
    );
    artifact.insert("byte_len".to_string(), Value::Number(byte_len.into()));
    root.insert("artifact".to_string(), Value::Object(artifact));
    root.insert("ts".to_string(), Value::String(now_utc_iso()));
    Value::Object(root)
}

pub fn write_receipt(path: &Path, payload: &Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(payload)?)?;
    Ok(())
}

/// Inline image bodies never belong in receipts; replace them wherever they
/// could appear in a provider payload.
fn sanitize_payload(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
        Value::Array(rows) => Value::Array(rows.iter().map(sanitize_payload).collect()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, row) in map {
                let lowered = key.to_ascii_lowercase();
                if matches!(
                    lowered.as_str(),
                    "data" | "b64_json" | "image_bytes" | "inlinedata" | "inline_data"
                ) {
                    out.insert(key.clone(), Value::String("<omitted>".to_string()));
                    continue;
                }
                out.insert(key.clone(), sanitize_payload(row));
            }
            Value::Object(out)
        }
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{build_receipt, write_receipt, ComposeReceipt, RECEIPT_SCHEMA_VERSION};

    fn request() -> ComposeReceipt {
        ComposeReceipt {
            mode: "generate".to_string(),
            person_count: 3,
            pose: Some("lineup".to_string()),
            scene: Some("Outdoor sunny park".to_string()),
            aspect_ratio: Some("1:1".to_string()),
            preserve_outfits: Some(true),
            shared_background: Some(true),
            directive: "Create a photorealistic group photo".to_string(),
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash-image".to_string(),
        }
    }

    #[test]
    fn receipt_carries_request_artifact_and_timestamp() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let receipt_path = temp.path().join("receipt-1.json");
        let image_path = temp.path().join("artifact-1.png");

        let mut provider_response = Map::new();
        provider_response.insert("image_parts".to_string(), json!(1));

        let payload = build_receipt(&request(), &provider_response, &image_path, "abc123", 42);
        write_receipt(&receipt_path, &payload)?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&receipt_path)?)?;
        assert_eq!(parsed["schema_version"], json!(RECEIPT_SCHEMA_VERSION));
        assert_eq!(parsed["request"]["mode"], json!("generate"));
        assert_eq!(parsed["request"]["person_count"], json!(3));
        assert_eq!(parsed["request"]["pose"], json!("lineup"));
        assert_eq!(parsed["provider_response"]["image_parts"], json!(1));
        assert_eq!(
            parsed["artifact"]["image_path"],
            json!(image_path.to_string_lossy())
        );
        assert_eq!(parsed["artifact"]["checksum_sha256"], json!("abc123"));
        assert_eq!(parsed["artifact"]["byte_len"], json!(42));
        assert!(parsed.get("ts").and_then(Value::as_str).is_some());
        Ok(())
    }

    #[test]
    fn inline_image_bodies_are_omitted() {
        let temp = tempfile::tempdir().expect("tempdir");
        let image_path = temp.path().join("artifact-1.png");

        let mut provider_response = Map::new();
        provider_response.insert(
            "candidates".to_string(),
            json!([{ "parts": [{ "inlineData": { "data": "aGVsbG8=" } }] }]),
        );

        let payload = build_receipt(&request(), &provider_response, &image_path, "abc", 1);
        let rendered = serde_json::to_string(&payload).expect("serializes");
        assert!(!rendered.contains("aGVsbG8="));
        assert!(rendered.contains("<omitted>"));
    }
}
