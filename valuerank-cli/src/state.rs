/// Session file persistence and catalogue loading.
///
/// The engine produces the session JSON; this module only moves it to and
/// from disk. Saves go through a temporary file and a rename so a crash
/// mid-write never leaves a truncated session behind.
use std::path::Path;

use crate::bail;

/// Read the saved session, if there is one.
pub fn load_state(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => bail(format!("Failed to read session at {}: {e}", path.display())),
    }
}

pub fn save_state(path: &Path, json: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)
}

/// Save or exit with an error.
pub fn save_or_bail(path: &Path, json: &str) {
    save_state(path, json)
        .unwrap_or_else(|e| bail(format!("Failed to save session to {}: {e}", path.display())));
}

/// Parse a string as either a JSON array of strings or plain text (one item per line).
pub fn parse_items_from_str(content: &str) -> Result<Vec<String>, serde_json::Error> {
    let trimmed = content.trim();
    if trimmed.starts_with('[') {
        let items: Vec<String> = serde_json::from_str(trimmed)?;
        Ok(items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else {
        Ok(trimmed
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Load a catalogue file (auto-detects JSON array vs one-per-line).
pub fn load_catalogue(path: &Path) -> Vec<String> {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| bail(format!("Failed to read catalogue {}: {e}", path.display())));
    let items = parse_items_from_str(&content)
        .unwrap_or_else(|e| bail(format!("Catalogue looks like JSON but failed to parse: {e}")));
    if items.len() < 2 {
        bail(format!("Need at least 2 items to rank, got {}", items.len()));
    }
    items
}
