//! Default filesystem-backed port implementations.

use crate::ports::{DescriptorSink, DescriptorSource};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use specprune_spec::{Document, MacroTable};
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::debug;

/// Parses spec files from disk.
#[derive(Debug, Clone, Default)]
pub struct FsDescriptorSource;

impl DescriptorSource for FsDescriptorSource {
    fn load(&self, path: &Utf8Path, macros: &MacroTable) -> anyhow::Result<Document> {
        Document::parse(path, macros.clone()).with_context(|| format!("parse {}", path))
    }
}

/// Writes the document back to the path it was parsed from.
#[derive(Debug, Clone, Default)]
pub struct FsDescriptorSink;

impl DescriptorSink for FsDescriptorSink {
    fn save(&self, doc: &Document) -> anyhow::Result<()> {
        let path = doc
            .path()
            .map(Utf8Path::to_string)
            .unwrap_or_else(|| "<memory>".to_string());
        doc.save().with_context(|| format!("save {}", path))
    }
}

/// In-memory spec store for embedding and testing.
///
/// Serves as both source and sink: saved documents replace the stored text,
/// so a later load sees the edit.
#[derive(Debug, Default)]
pub struct InMemoryDescriptors {
    files: RefCell<BTreeMap<Utf8PathBuf, String>>,
}

impl InMemoryDescriptors {
    pub fn new<P, T>(files: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: Into<Utf8PathBuf>,
        T: Into<String>,
    {
        let files = files
            .into_iter()
            .map(|(path, text)| (path.into(), text.into()))
            .collect();
        Self {
            files: RefCell::new(files),
        }
    }

    pub fn insert(&self, path: impl Into<Utf8PathBuf>, text: impl Into<String>) {
        self.files.borrow_mut().insert(path.into(), text.into());
    }

    pub fn get(&self, path: &Utf8Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }
}

impl DescriptorSource for InMemoryDescriptors {
    fn load(&self, path: &Utf8Path, macros: &MacroTable) -> anyhow::Result<Document> {
        let files = self.files.borrow();
        let text = files
            .get(path)
            .with_context(|| format!("no in-memory spec at {}", path))?;
        let mut doc =
            Document::parse_str(text, macros.clone()).with_context(|| format!("parse {}", path))?;
        doc.set_path(path);
        Ok(doc)
    }
}

impl DescriptorSink for InMemoryDescriptors {
    fn save(&self, doc: &Document) -> anyhow::Result<()> {
        let path = doc.path().context("document has no backing path")?;
        debug!(path = %path, "storing spec in memory");
        self.insert(path, doc.render());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SPEC: &str = "Name: x\n%install\nmake install\n";

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        (temp, root)
    }

    #[test]
    fn fs_source_and_sink_round_trip() {
        let (_temp, root) = temp_root();
        let path = root.join("x.spec");
        fs_err::write(&path, SPEC).expect("write");

        let doc = FsDescriptorSource
            .load(&path, &MacroTable::bootstrap())
            .expect("load");
        assert_eq!(doc.path(), Some(path.as_path()));

        FsDescriptorSink.save(&doc).expect("save");
        assert_eq!(fs_err::read_to_string(&path).expect("read"), SPEC);
    }

    #[test]
    fn fs_source_reports_path_on_missing_file() {
        let (_temp, root) = temp_root();
        let path = root.join("missing.spec");
        let err = FsDescriptorSource
            .load(&path, &MacroTable::bootstrap())
            .unwrap_err();
        assert!(format!("{err:#}").contains("missing.spec"));
    }

    #[test]
    fn fs_sink_rejects_pathless_document() {
        let doc = Document::parse_str(SPEC, MacroTable::bootstrap()).expect("parse");
        let err = FsDescriptorSink.save(&doc).unwrap_err();
        assert!(format!("{err:#}").contains("no backing path"));
    }

    #[test]
    fn in_memory_save_replaces_text() {
        let store = InMemoryDescriptors::new([("a.spec", SPEC)]);
        let mut doc = store
            .load(Utf8Path::new("a.spec"), &MacroTable::bootstrap())
            .expect("load");
        doc.sections()
            .install_lines_mut()
            .expect("install")
            .push("install b".to_string());
        store.save(&doc).expect("save");

        assert_eq!(
            store.get(Utf8Path::new("a.spec")).as_deref(),
            Some("Name: x\n%install\nmake install\ninstall b\n")
        );
    }

    #[test]
    fn in_memory_missing_path_is_an_error() {
        let store = InMemoryDescriptors::default();
        assert!(
            store
                .load(Utf8Path::new("nope.spec"), &MacroTable::bootstrap())
                .is_err()
        );
    }
}
