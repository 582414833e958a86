use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use pb_core::{Error, Result};

const RULE: &str = "==================================================";

/// Write `error_report_<timestamp>.txt` into `dir` and return its path.
pub fn write_error_report(dir: &Path, error: &Error) -> Result<PathBuf> {
    let now = Local::now();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("error_report_{}.txt", now.format("%Y%m%d_%H%M%S")));

    let contents = format!(
        "Error report - {}\n{}\nMessage: {}\nKind: {}\n{}\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        RULE,
        error,
        error.kind(),
        RULE
    );
    fs::write(&path, contents)?;

    tracing::info!(path = %path.display(), "📄 Error report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_contains_message_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let error = Error::Database("connection refused".to_string());

        let path = write_error_report(dir.path(), &error).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("error_report_"));
        assert!(name.ends_with(".txt"));

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Message: Database error: connection refused"));
        assert!(contents.contains("Kind: StoreError"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports/today");
        let path = write_error_report(&nested, &Error::HealthCheck("arXiv down".to_string())).unwrap();
        assert!(path.starts_with(&nested));
    }
}
