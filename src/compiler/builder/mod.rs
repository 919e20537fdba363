//! Builds modules from schema files.
//!
//! A [`CompilerContext`] owns everything one compilation run needs: the
//! source provider, the import search path, the cache of built modules, and
//! the stack of files whose builds are in progress.  Each file is built at
//! most once per context, so a file imported through several paths is shared
//! as a single `Rc<Module>`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info};

use super::ir::{Import, Module};
use super::pack::{byte_layout, PackedStruct};
use super::translate::translate;
use super::{parse_schema, SchemaError};
use crate::io::relative_posix_path;

mod error;
mod resolve;
mod sources;

pub use error::*;
pub use sources::{normalize, DiskSources, MemorySources, SourceProvider};

pub struct CompilerContext<S: SourceProvider> {
    sources: S,
    search_dirs: Vec<PathBuf>,
    source_root: Option<PathBuf>,
    cache: HashMap<PathBuf, Rc<Module>>,
    import_stack: Vec<PathBuf>,
    failed_stack: Option<Vec<PathBuf>>,
}

impl<S: SourceProvider> CompilerContext<S> {
    pub fn new(sources: S) -> CompilerContext<S> {
        CompilerContext {
            sources,
            search_dirs: vec![],
            source_root: None,
            cache: HashMap::new(),
            import_stack: vec![],
            failed_stack: None,
        }
    }

    /// Directories searched, in order, for imports which are not found next
    /// to the importing file.
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    /// Module paths are given relative to this directory.
    pub fn with_source_root(mut self, root: PathBuf) -> Self {
        self.source_root = Some(root);
        self
    }

    /// The modules built so far, keyed by canonical path.
    pub fn modules(&self) -> impl Iterator<Item = (&PathBuf, &Rc<Module>)> {
        self.cache.iter()
    }

    /// Builds the module in `path` and, first, everything it imports.  A
    /// module that was already built by this context is returned from the
    /// cache.
    pub fn compile(&mut self, path: &Path) -> Result<Rc<Module>, CompileError> {
        self.failed_stack = None;
        let result = match self.sources.resolve(path) {
            Some(canonical) => self.build_file(&canonical),
            None => Err(SchemaError::Io(
                path.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
            )),
        };

        let failed_stack = self.failed_stack.take().unwrap_or_default();
        result.map_err(|error| CompileError {
            error,
            import_stack: failed_stack.iter().map(|p| self.display_path(p)).collect(),
        })
    }

    /// The path of `path` as shown to the user and stored in modules.
    fn display_path(&self, path: &Path) -> String {
        match &self.source_root {
            Some(root) => relative_posix_path(path, &normalize(root)),
            None => relative_posix_path(path, Path::new("")),
        }
    }

    fn build_file(&mut self, path: &Path) -> Result<Rc<Module>, SchemaError> {
        if self.import_stack.iter().any(|p| p == path) {
            let mut chain: Vec<String> = self
                .import_stack
                .iter()
                .map(|p| self.display_path(p))
                .collect();
            chain.push(self.display_path(path));
            if self.failed_stack.is_none() {
                self.failed_stack = Some(self.import_stack.clone());
            }
            return Err(CircularImportError { chain }.into());
        }

        if let Some(module) = self.cache.get(path) {
            debug!("Using cached module for {}", path.display());
            return Ok(module.clone());
        }

        self.import_stack.push(path.to_path_buf());
        let result = self.build_uncached(path);
        if result.is_err() && self.failed_stack.is_none() {
            self.failed_stack = Some(self.import_stack.clone());
        }
        self.import_stack.pop();

        let module = Rc::new(result?);
        self.cache.insert(path.to_path_buf(), module.clone());
        Ok(module)
    }

    fn build_uncached(&mut self, path: &Path) -> Result<Module, SchemaError> {
        let filename = self.display_path(path);
        info!("Building {}", filename);

        let text = self
            .sources
            .read(path)
            .map_err(|e| SchemaError::Io(path.to_path_buf(), e))?;
        let tree = parse_schema(&filename, &text)?;
        let record = translate(&tree, &filename)?;

        let mut imports = vec![];
        for import in &record.imports {
            let import_path = self.find_import(path, &import.filename).ok_or_else(|| {
                ResolutionError::new(
                    &filename,
                    import.line,
                    ResolutionErrorKind::ImportNotFound(import.filename.clone()),
                )
            })?;
            debug!("{} imports {}", filename, import_path.display());
            let module = self.build_file(&import_path)?;
            imports.push(Import {
                filename: import.filename.clone(),
                namespace: module.namespace.clone(),
                module,
            });
        }

        let module =
            resolve::Resolver::new(&filename, &record).build(&record, filename.clone(), imports)?;

        for s in module.layout_structs() {
            let packed = PackedStruct::new(&s)?;
            byte_layout(&packed)?;
            debug!("{}: {} packs into {} bytes", filename, s.name, packed.total_size());
        }

        Ok(module)
    }

    /// Looks for an import next to the importing file, then in each search
    /// directory.
    fn find_import(&self, importer: &Path, import: &str) -> Option<PathBuf> {
        let local = importer.parent().map(|dir| dir.join(import));
        local
            .into_iter()
            .chain(self.search_dirs.iter().map(|dir| dir.join(import)))
            .find_map(|candidate| self.sources.resolve(&candidate))
    }
}
