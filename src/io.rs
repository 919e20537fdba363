use std::path::{Component, Path, PathBuf};

/// Writes `path` relative to `root`, with `/` between components whatever
/// the platform.  A path outside of `root` is written in full.
pub fn relative_posix_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::RootDir => Some(String::new()),
            Component::CurDir => None,
            Component::ParentDir => Some("..".into()),
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Writes `contents` to `dir/name`, creating `dir` and any missing parents.
pub fn write_output(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, std::io::Error> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, contents)?;
    Ok(path)
}
