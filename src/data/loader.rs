// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads every .txt file in a directory as one Document.
//
// Files are visited in name order so that the id stream (and
// therefore every batch) is reproducible between runs.
// A missing directory yields an empty corpus; an unreadable or
// non-UTF-8 file is skipped with a warning.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::document::Document;
use crate::domain::traits::DocumentSource;

pub struct TextLoader {
    /// Path to the directory containing .txt files
    dir: String,
}

impl TextLoader {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentSource for TextLoader {
    fn load_all(&self) -> Result<Vec<Document>> {
        let dir = Path::new(&self.dir);

        if !dir.exists() {
            tracing::warn!(
                "Corpus directory '{}' does not exist, returning empty corpus",
                self.dir
            );
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            match load_single_text(&path) {
                Ok(doc) => {
                    tracing::debug!("Loaded: {} ({} words)", doc.source, doc.word_count());
                    docs.push(doc);
                }
                Err(e) => tracing::warn!("Skipping '{}': {}", path.display(), e),
            }
        }

        tracing::info!("Successfully loaded {} documents", docs.len());
        Ok(docs)
    }
}

fn load_single_text(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(Document::new(source, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rnnlm_loader_{}_{}", name, std::process::id()));
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_loads_only_txt_files_in_name_order() {
        let dir = scratch_dir("order");
        fs::write(dir.join("b.txt"), "second file").unwrap();
        fs::write(dir.join("a.txt"), "first file").unwrap();
        fs::write(dir.join("notes.md"), "ignored").unwrap();

        let docs = TextLoader::new(dir.to_string_lossy()).load_all().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source, "a.txt");
        assert_eq!(docs[1].text, "second file");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_directory_is_empty_corpus() {
        let docs = TextLoader::new("/definitely/not/a/corpus/dir").load_all().unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_non_utf8_file_is_skipped() {
        let dir = scratch_dir("utf8");
        fs::write(dir.join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();
        fs::write(dir.join("good.txt"), "fine").unwrap();

        let docs = TextLoader::new(dir.to_string_lossy()).load_all().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "good.txt");

        fs::remove_dir_all(&dir).ok();
    }
}
