use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

/// Append-only writer for a session's `events.jsonl`.
///
/// Default fields are `type`, `session_id`, `seq`, and `ts`; the caller
/// payload is merged last and can override any of them. `seq` is monotone per
/// writer, so readers can order events without trusting wall-clock time. One
/// compact JSON object per line.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    inner: Arc<SessionEventsInner>,
}

#[derive(Debug)]
struct SessionEventsInner {
    path: PathBuf,
    session_id: String,
    next_seq: Mutex<u64>,
}

impl SessionEvents {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SessionEventsInner {
                path: path.into(),
                session_id: session_id.into(),
                next_seq: Mutex::new(0),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut seq_guard = self
            .inner
            .next_seq
            .lock()
            .map_err(|_| anyhow::anyhow!("session event writer lock poisoned"))?;
        let seq = *seq_guard;

        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(event_type.to_string()));
        event.insert(
            "session_id".to_string(),
            Value::String(self.inner.session_id.clone()),
        );
        event.insert("seq".to_string(), Value::Number(seq.into()));
        event.insert("ts".to_string(), Value::String(now_utc_iso()));
        for (key, value) in payload {
            event.insert(key, value);
        }

        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(&event)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        *seq_guard = seq + 1;

        Ok(Value::Object(event))
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::DateTime;
    use serde_json::Value;

    use super::{EventPayload, SessionEvents};

    #[test]
    fn emit_writes_compact_jsonl_line() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let events = SessionEvents::new(&path, "session-7");

        let mut payload = EventPayload::new();
        payload.insert("step".to_string(), Value::String("upload".to_string()));
        let emitted = events.emit("step_changed", payload)?;

        let content = fs::read_to_string(&path)?;
        let line = content.lines().next().unwrap_or("");
        let parsed: Value = serde_json::from_str(line)?;

        assert_eq!(parsed, emitted);
        assert_eq!(parsed["type"], Value::String("step_changed".to_string()));
        assert_eq!(parsed["session_id"], Value::String("session-7".to_string()));
        assert_eq!(parsed["step"], Value::String("upload".to_string()));

        let ts = parsed["ts"].as_str().unwrap_or("");
        DateTime::parse_from_rfc3339(ts)?;
        Ok(())
    }

    #[test]
    fn seq_is_monotone_across_emits() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let events = SessionEvents::new(&path, "session-7");

        events.emit("one", EventPayload::new())?;
        events.emit("two", EventPayload::new())?;
        events.emit("three", EventPayload::new())?;

        let content = fs::read_to_string(&path)?;
        let seqs: Vec<u64> = content
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter_map(|row| row.get("seq").and_then(Value::as_u64))
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn payload_can_override_default_keys() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let events = SessionEvents::new(&path, "session-7");

        let mut payload = EventPayload::new();
        payload.insert("type".to_string(), Value::String("override".to_string()));
        payload.insert(
            "session_id".to_string(),
            Value::String("other-session".to_string()),
        );
        let emitted = events.emit("step_changed", payload)?;

        assert_eq!(emitted["type"], Value::String("override".to_string()));
        assert_eq!(
            emitted["session_id"],
            Value::String("other-session".to_string())
        );
        Ok(())
    }

    #[test]
    fn clones_share_one_sequence() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let events = SessionEvents::new(&path, "session-7");
        let alias = events.clone();

        events.emit("one", EventPayload::new())?;
        alias.emit("two", EventPayload::new())?;

        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: Value = serde_json::from_str(lines[1])?;
        assert_eq!(second["seq"], Value::Number(1.into()));
        Ok(())
    }
}
