use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The one durable preference: the display theme, read at startup and
/// written on toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Missing or unreadable preference files fall back to the default theme.
pub fn load_theme(path: &Path) -> Theme {
    let Some(payload) = read_json_object(path) else {
        return Theme::default();
    };
    match payload.get("theme").and_then(Value::as_str) {
        Some("dark") => Theme::Dark,
        _ => Theme::Light,
    }
}

pub fn store_theme(path: &Path, theme: Theme) -> anyhow::Result<()> {
    let mut payload = Map::new();
    payload.insert(
        "theme".to_string(),
        Value::String(theme.as_str().to_string()),
    );
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(
        path,
        serde_json::to_string_pretty(&Value::Object(payload))?,
    )?;
    Ok(())
}

fn read_json_object(path: &Path) -> Option<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    parsed.as_object().cloned()
}

#[cfg(test)]
mod tests {
    use super::{load_theme, store_theme, Theme};

    #[test]
    fn round_trips_both_themes() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("prefs.json");

        store_theme(&path, Theme::Dark)?;
        assert_eq!(load_theme(&path), Theme::Dark);

        store_theme(&path, Theme::Light)?;
        assert_eq!(load_theme(&path), Theme::Light);
        Ok(())
    }

    #[test]
    fn missing_file_defaults_to_light() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert_eq!(load_theme(&temp.path().join("absent.json")), Theme::Light);
    }

    #[test]
    fn corrupt_file_defaults_to_light() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("prefs.json");
        std::fs::write(&path, "{not json")?;
        assert_eq!(load_theme(&path), Theme::Light);

        std::fs::write(&path, r#"{"theme": "plaid"}"#)?;
        assert_eq!(load_theme(&path), Theme::Light);
        Ok(())
    }

    #[test]
    fn toggled_alternates() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }
}
