use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

/// How one schema type is written in a target language.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypemapEntry {
    pub typename: String,
    #[serde(default)]
    pub pass_by_value: bool,
    #[serde(default)]
    pub headers: Vec<String>,
}

/// Entries of one language, keyed by the fully qualified schema type.
pub type LanguageMap = BTreeMap<String, TypemapEntry>;

/// Type mappings per target language.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Typemap {
    languages: BTreeMap<String, LanguageMap>,
}

#[derive(Debug)]
pub enum TypemapError {
    Io(PathBuf, std::io::Error),
    Json(PathBuf, serde_json::Error),
}

impl std::fmt::Display for TypemapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypemapError::Io(path, e) => {
                write!(f, "{}: Error: Unable to read typemap: {}", path.display(), e)
            }
            TypemapError::Json(path, e) => {
                write!(f, "{}: Error: Invalid typemap: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for TypemapError {}

impl Typemap {
    /// Parses a typemap document.  Comment lines (those starting with `#`
    /// after any blanks) are blanked out first so reported line numbers
    /// still match the file.
    pub fn parse(text: &str) -> Result<Typemap, serde_json::Error> {
        let json = strip_comments(text);
        serde_json::from_str(&json)
    }

    /// Reads and merges the typemap files in order.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Typemap, TypemapError> {
        let mut typemap = Typemap::default();
        for path in paths {
            let path = path.as_ref();
            debug!("Loading typemap {}", path.display());
            let text = std::fs::read_to_string(path)
                .map_err(|e| TypemapError::Io(path.to_path_buf(), e))?;
            let next = Typemap::parse(&text).map_err(|e| TypemapError::Json(path.to_path_buf(), e))?;
            typemap.merge(next);
        }
        Ok(typemap)
    }

    /// Adds the entries of `other`.  Where both have an entry for the same
    /// language and type, the one from `other` is kept.
    pub fn merge(&mut self, other: Typemap) {
        for (language, entries) in other.languages {
            self.languages.entry(language).or_default().extend(entries);
        }
    }

    pub fn get(&self, language: &str, fq_type: &str) -> Option<&TypemapEntry> {
        self.languages.get(language)?.get(fq_type)
    }

    pub fn language(&self, language: &str) -> Option<&LanguageMap> {
        self.languages.get(language)
    }
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| if line.trim_start().starts_with('#') { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}
