//! Reading feature files from disk and writing them back out.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::Feature;

const FEATURE_EXTENSION: &str = "feature";
pub const DEFAULT_ROOT_LABEL: &str = "Feature Files";

/// Raw Gherkin text plus where it came from.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub text: String,
    /// Folder name when the document was assembled from a directory.
    pub folder_name: Option<String>,
}

impl Document {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Label for the root epic of a deep plan: the folder name in Title Case,
    /// or "Feature Files".
    pub fn default_root_label(&self) -> String {
        self.folder_name
            .as_deref()
            .map(title_case)
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ROOT_LABEL.to_string())
    }
}

/// Read a single file, or every `.feature` file in a directory (sorted by
/// file name, joined with a blank line).
pub fn read_document(path: &Path) -> io::Result<Document> {
    if !path.is_dir() {
        let text = fs::read_to_string(path)?;
        return Ok(Document {
            text,
            folder_name: None,
        });
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == FEATURE_EXTENSION))
        .collect();
    files.sort();

    let mut parts = Vec::with_capacity(files.len());
    for file in &files {
        parts.push(fs::read_to_string(file)?.trim_end().to_string());
    }
    tracing::debug!(dir = %path.display(), files = files.len(), "read feature folder");

    Ok(Document {
        text: parts.join("\n\n"),
        folder_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
    })
}

/// Upper-case the first word character of every whitespace-separated word and
/// lower-case the rest of it.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_whitespace() {
            in_word = false;
            out.push(c);
        } else if in_word {
            out.extend(c.to_lowercase());
        } else if c.is_alphanumeric() || c == '_' {
            in_word = true;
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// File name for a feature: every non-alphanumeric ASCII character becomes
/// `_`, the rest is lower-cased.
pub fn feature_file_name(feature_name: &str) -> String {
    let stem: String = feature_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.{}", stem, FEATURE_EXTENSION)
}

/// Write each feature block to its own `.feature` file in `dir`.
///
/// Features sharing a file name get a numeric suffix instead of overwriting
/// each other.
pub fn write_feature_files(features: &[Feature], dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut written = Vec::with_capacity(features.len());
    for feature in features {
        let base = feature_file_name(&feature.name);
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;
        let file_name = if *count == 1 {
            base
        } else {
            let stem = base.trim_end_matches(".feature");
            format!("{}_{}.{}", stem, count, FEATURE_EXTENSION)
        };

        let path = dir.join(file_name);
        fs::write(&path, format!("{}\n", feature.raw_content.trim_end()))?;
        tracing::info!(path = %path.display(), "wrote feature file");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("checkout flow"), "Checkout Flow");
        assert_eq!(title_case("USER-accounts"), "User-accounts");
        assert_eq!(title_case("-billing  v2"), "-Billing  V2");
    }

    #[test]
    fn test_feature_file_name() {
        assert_eq!(feature_file_name("User Login (SSO)"), "user_login__sso_.feature");
    }

    #[test]
    fn test_default_root_label() {
        assert_eq!(Document::from_text("x").default_root_label(), "Feature Files");

        let doc = Document {
            folder_name: Some("payment flows".to_string()),
            ..Default::default()
        };
        assert_eq!(doc.default_root_label(), "Payment Flows");
    }
}
