use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};

/// Turns newline-delimited JSON objects into one JSON array literal.
///
/// Purely textual: every line is trimmed, the lines are joined with `,` and
/// the result is wrapped in brackets. Nothing is validated, so blank lines in
/// the middle of the input become empty elements, and running it over its own
/// output wraps the array a second time.
pub fn repair_text(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.lines().map(str::trim).collect();
    format!("[{}]", lines.join(","))
}

/// Rewrites `path` in place with [`repair_text`].
pub async fn repair_in_place<S: Storage>(storage: &S, path: &str) -> Result<()> {
    let repair_error = |reason: String| {
        tracing::error!("Error fixing JSON file format: {}", reason);
        EtlError::FormatRepairError {
            path: path.to_string(),
            reason,
        }
    };

    let raw = storage
        .read_file(path)
        .await
        .map_err(|e| repair_error(e.to_string()))?;
    let content =
        String::from_utf8(raw).map_err(|e| repair_error(format!("not valid UTF-8: {}", e)))?;

    let repaired = repair_text(&content);
    storage
        .write_file(path, repaired.as_bytes())
        .await
        .map_err(|e| repair_error(e.to_string()))?;

    tracing::info!("JSON file formatted successfully: {}", path);
    Ok(())
}
