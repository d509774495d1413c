//! Deterministic fixture project generator for tests.
//!
//! Generates synthetic LaTeX projects with controlled characteristics:
//! chapter count, labels per chapter, bibliography size and filler prose.
//!
//! All output is deterministic (no randomness) so repeated runs see
//! byte-identical trees.

use std::fmt::Write;
use std::path::Path;
use std::time::SystemTime;
use tempfile::TempDir;

/// Configuration for generating a fixture project.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub chapter_count: usize,
    pub labels_per_chapter: usize,
    pub bib_entries: usize,
    pub extra_lines_per_chapter: usize,
}

const SURNAMES: &[&str] = &[
    "Knuth", "Lamport", "Dijkstra", "Hoare", "Liskov",
    "Hopper", "Ritchie", "Thompson", "Wirth", "Backus",
];

impl FixtureConfig {
    /// Small project: 3 chapters, 4 labels each, 10 bibliography entries.
    pub fn small() -> Self {
        Self {
            chapter_count: 3,
            labels_per_chapter: 4,
            bib_entries: 10,
            extra_lines_per_chapter: 5,
        }
    }
}

/// Content of chapter `index`
fn generate_chapter(index: usize, config: &FixtureConfig) -> String {
    let mut content = String::new();
    writeln!(content, "\\chapter{{Chapter {}}}", index).unwrap();
    for label_i in 0..config.labels_per_chapter {
        writeln!(content, "\\section{{Part {}}}\\label{{ch{}:sec{}}}", label_i, index, label_i).unwrap();
        if config.bib_entries > 0 {
            let cited = (index * config.labels_per_chapter + label_i) % config.bib_entries;
            writeln!(content, "As shown in \\cite{{ref{}}}, see \\ref{{ch{}:sec{}}}.", cited, index, label_i).unwrap();
        }
    }
    for line_i in 0..config.extra_lines_per_chapter {
        writeln!(content, "Filler sentence {} of chapter {}.", line_i, index).unwrap();
    }
    content
}

/// Content of the shared bibliography
fn generate_bibliography(config: &FixtureConfig) -> String {
    let mut content = String::from("@string{pub = \"Fixture Press\"}\n\n");
    for i in 0..config.bib_entries {
        let first = SURNAMES[i % SURNAMES.len()];
        let second = SURNAMES[(i + 3) % SURNAMES.len()];
        writeln!(content, "@book{{ref{},", i).unwrap();
        writeln!(content, "  title = {{Collected Notes on Topic Number {}}},", i).unwrap();
        writeln!(content, "  author = {{{}, A. and {}, B.}},", first, second).unwrap();
        writeln!(content, "  publisher = pub,").unwrap();
        writeln!(content, "  year = {}", 1970 + i % 50).unwrap();
        writeln!(content, "}}\n").unwrap();
    }
    content
}

/// Create a temporary fixture project from the given configuration.
///
/// Layout: `refs.bib` at the root and `chapters/chapter_<i>.tex` below it.
/// The directory is cleaned up when the `TempDir` is dropped.
pub fn create_fixture_project(config: &FixtureConfig) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory for fixture project");
    write_fixture_project(temp_dir.path(), config);
    temp_dir
}

/// Write fixture files into an existing directory.
pub fn write_fixture_project(dir: &Path, config: &FixtureConfig) {
    let mut files = vec![(String::from("refs.bib"), generate_bibliography(config))];
    for i in 0..config.chapter_count {
        files.push((format!("chapters/chapter_{}.tex", i), generate_chapter(i, config)));
    }
    for (name, content) in &files {
        write_file(dir, name, content);
    }
}

/// Write `(relative path, content)` pairs under `dir`, creating parents.
pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        write_file(dir, name, content);
    }
}

fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create {}: {}", parent.display(), e));
    }
    std::fs::write(&path, content).unwrap_or_else(|e| panic!("Failed to write fixture file {}: {}", name, e));
}

/// Set a file's modification time.
pub fn set_mtime(path: &Path, mtime: SystemTime) {
    let file = std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap_or_else(|e| panic!("Failed to open {}: {}", path.display(), e));
    file.set_modified(mtime)
        .unwrap_or_else(|e| panic!("Failed to set mtime of {}: {}", path.display(), e));
}

/// Remove every permission bit from `path`.
///
/// Returns false when the file is still readable afterwards (privileged
/// users bypass mode bits), in which case callers should skip their check.
#[cfg(unix)]
pub fn make_unreadable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o000))
        .unwrap_or_else(|e| panic!("Failed to chmod {}: {}", path.display(), e));
    std::fs::read(path).is_err()
}
