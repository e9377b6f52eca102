//! Where generated sources go

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{CodegenError, Result};

/// Receives generated source files.
pub trait CodeSink {
    /// Store `contents` at `path`.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Called once after every file of a run was written, with the set of
    /// directories that received files.
    fn finish(&self, _dirs: &BTreeSet<PathBuf>) -> Result<()> {
        Ok(())
    }
}

/// Writes files to disk, pretty-printed, and regenerates each directory's
/// `mod.rs`.
#[derive(Debug, Default)]
pub struct FileSink;

impl FileSink {
    pub fn new() -> Self {
        Self
    }
}

impl CodeSink for FileSink {
    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| CodegenError::OutputDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, format_source(contents))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn finish(&self, dirs: &BTreeSet<PathBuf>) -> Result<()> {
        for dir in dirs {
            write_mod_file(dir)?;
        }
        Ok(())
    }
}

/// Logs the target paths and writes nothing.
#[derive(Debug, Default)]
pub struct DryRunSink {
    written: Mutex<Vec<PathBuf>>,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths that would have been written, in order.
    pub fn written(&self) -> Vec<PathBuf> {
        self.written
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }
}

impl CodeSink for DryRunSink {
    fn write(&self, path: &Path, _contents: &str) -> Result<()> {
        info!("Would write {}", path.display());
        if let Ok(mut paths) = self.written.lock() {
            paths.push(path.to_path_buf());
        }
        Ok(())
    }
}

/// Pretty-print Rust source; text that does not parse is returned as is.
pub fn format_source(contents: &str) -> String {
    match syn::parse_file(contents) {
        Ok(file) => prettyplease::unparse(&file),
        Err(e) => {
            debug!("Generated source left unformatted: {}", e);
            contents.to_string()
        }
    }
}

/// Rewrite `dir/mod.rs` to declare and re-export every module file in `dir`.
fn write_mod_file(dir: &Path) -> Result<()> {
    let mut modules = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some("mod") | None => {}
            Some(stem) => modules.push(stem.to_string()),
        }
    }
    modules.sort();

    let mut code = String::from("// Generated modules\n\n");
    for module in &modules {
        code.push_str(&format!("pub mod {};\n", module));
    }
    code.push('\n');
    for module in &modules {
        code.push_str(&format!("pub use {}::*;\n", module));
    }

    fs::write(dir.join("mod.rs"), code)?;
    debug!("Wrote {} ({} modules)", dir.join("mod.rs").display(), modules.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_writes_formatted_and_mod() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("entity");
        let sink = FileSink::new();

        sink.write(&out.join("user.rs"), "pub struct User { id: i64 }")
            .unwrap();
        sink.write(&out.join("order_item.rs"), "pub struct OrderItem;")
            .unwrap();
        fs::write(out.join("notes.txt"), "ignored").unwrap();
        sink.finish(&BTreeSet::from([out.clone()])).unwrap();

        let user = fs::read_to_string(out.join("user.rs")).unwrap();
        assert!(user.contains("pub struct User {\n    id: i64,\n}"));

        let module = fs::read_to_string(out.join("mod.rs")).unwrap();
        assert!(module.contains("pub mod order_item;\npub mod user;\n"));
        assert!(module.contains("pub use user::*;"));
        assert!(!module.contains("notes"));
        assert!(!module.contains("pub mod mod;"));
    }

    #[test]
    fn test_unparsable_source_is_kept() {
        assert_eq!(format_source("fn broken( {"), "fn broken( {");
    }

    #[test]
    fn test_dry_run_records_paths() {
        let sink = DryRunSink::new();
        sink.write(Path::new("out/user.rs"), "ignored").unwrap();
        sink.finish(&BTreeSet::new()).unwrap();
        assert_eq!(sink.written(), vec![PathBuf::from("out/user.rs")]);
        assert!(!Path::new("out/user.rs").exists());
    }
}
