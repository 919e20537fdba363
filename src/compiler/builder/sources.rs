use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Where the builder reads schema files from.
pub trait SourceProvider {
    /// Returns the canonical path of the file at `path`, or `None` if there
    /// is no such file.  Two paths naming the same file canonicalize to the
    /// same value.
    fn resolve(&self, path: &Path) -> Option<PathBuf>;

    fn read(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads schema files from the file system.
#[derive(Debug, Default)]
pub struct DiskSources;

impl SourceProvider for DiskSources {
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        std::fs::canonicalize(path).ok().filter(|p| p.is_file())
    }

    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Schema files held in memory.  Paths are canonicalized lexically.
#[derive(Debug, Default)]
pub struct MemorySources {
    files: HashMap<PathBuf, String>,
}

impl MemorySources {
    pub fn new() -> MemorySources {
        MemorySources::default()
    }

    pub fn add<P: AsRef<Path>>(&mut self, path: P, text: &str) -> &mut Self {
        self.files
            .insert(normalize(path.as_ref()), text.to_string());
        self
    }
}

impl SourceProvider for MemorySources {
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let path = normalize(path);
        if self.files.contains_key(&path) {
            Some(path)
        } else {
            None
        }
    }

    fn read(&self, path: &Path) -> std::io::Result<String> {
        self.files.get(&normalize(path)).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })
    }
}

/// Removes `.` components and folds `..` into the component before it.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => (),
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => (),
                _ => out.push(".."),
            },
            c => out.push(c.as_os_str()),
        }
    }
    out
}
