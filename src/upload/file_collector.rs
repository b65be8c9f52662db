use crate::upload::types::SelectedFile;
use glob::Pattern;
use ignore::Walk;
use std::path::Path;

/// Decides which files a module card accepts, from glob patterns such as `*.pdf`.
#[derive(Debug, Clone, Default)]
pub struct FileCollector {
    patterns: Vec<Pattern>,
}

impl FileCollector {
    pub fn new(accept: &[String]) -> Self {
        let patterns = accept
            .iter()
            .filter_map(|raw| match Pattern::new(&raw.to_lowercase()) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %raw, error = %e, "ignoring invalid accept pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Extensions for the native file dialog filter, e.g. `["pdf", "txt"]`.
    pub fn extensions(&self) -> Vec<String> {
        self.patterns
            .iter()
            .filter_map(|p| p.as_str().strip_prefix("*.").map(str::to_string))
            .collect()
    }

    pub fn accepts(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let name = name.to_lowercase();
        self.patterns.iter().any(|p| p.matches(&name))
    }

    /// Walks `folder` (honouring `.gitignore`) and returns accepted files in walk order.
    pub fn collect_folder(&self, folder: &Path) -> Vec<SelectedFile> {
        let mut files = Vec::new();
        for entry in Walk::new(folder) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "error walking directory");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !self.accepts(path) {
                continue;
            }
            match SelectedFile::from_path(path) {
                Ok(file) => files.push(file),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file"),
            }
        }
        tracing::debug!(folder = %folder.display(), count = files.len(), "collected files");
        files
    }

    /// Keeps the accepted paths from a dialog selection, preserving order.
    pub fn select_paths<I, P>(&self, paths: I) -> Vec<SelectedFile>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .filter(|p| self.accepts(p.as_ref()))
            .filter_map(|p| SelectedFile::from_path(p.as_ref()).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn accept(patterns: &[&str]) -> FileCollector {
        FileCollector::new(&patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn matches_case_insensitively() {
        let collector = accept(&["*.jpg", "*.png"]);
        assert!(collector.accepts(Path::new("/tmp/Photo.JPG")));
        assert!(collector.accepts(Path::new("shot.png")));
        assert!(!collector.accepts(Path::new("notes.txt")));
    }

    #[test]
    fn no_patterns_accepts_everything() {
        assert!(accept(&[]).accepts(Path::new("anything.bin")));
    }

    #[test]
    fn extensions_for_dialog() {
        assert_eq!(accept(&["*.pdf", "*.docx", "report*"]).extensions(), vec!["pdf", "docx"]);
    }

    #[test]
    fn collects_accepted_files_from_folder() {
        let dir = tempfile::Builder::new().prefix("collect").tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.pdf"), "b").unwrap();
        fs::write(dir.path().join("c.png"), "c").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("d.txt"), "dd").unwrap();

        let mut names: Vec<_> = accept(&["*.txt", "*.pdf"])
            .collect_folder(dir.path())
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.pdf", "d.txt"]);
    }

    #[test]
    fn select_paths_filters_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let b = dir.path().join("b.txt");
        let a = dir.path().join("a.txt");
        let skip = dir.path().join("c.exe");
        for p in [&a, &b, &skip] {
            fs::write(p, "x").unwrap();
        }
        let picked = accept(&["*.txt"]).select_paths([&b, &skip, &a]);
        let names: Vec<_> = picked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "a.txt"]);
        assert_eq!(picked[0].size, 1);
    }
}
