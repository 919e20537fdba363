/*!
 * Generators consume built modules.  The `json` and `yaml` generators dump
 * the IR of a module together with the packed layout of each of its structs.
 * Any generator named after a `.py` or `.sh` script is an external emitter:
 * it is started once per module with the IR document as JSON on its stdin.
 */
pub mod typemap;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::str::FromStr;

use log::{debug, info};
use serde::Serialize;

use crate::compiler::ir::{Module, Struct};
use crate::compiler::pack::{LayoutError, PackedStruct};
use crate::io::write_output;

pub use typemap::{Typemap, TypemapEntry, TypemapError};

#[derive(Debug)]
pub enum GenerateError {
    UnknownGenerator(String),
    Layout(LayoutError),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Io(PathBuf, std::io::Error),
    EmitterFailed { emitter: PathBuf, status: ExitStatus },
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::UnknownGenerator(name) => write!(
                f,
                "Unknown generator {} (expected json, yaml or a .py or .sh emitter)",
                name
            ),
            GenerateError::Layout(e) => write!(f, "{}", e),
            GenerateError::Json(e) => write!(f, "Unable to write JSON: {}", e),
            GenerateError::Yaml(e) => write!(f, "Unable to write YAML: {}", e),
            GenerateError::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            GenerateError::EmitterFailed { emitter, status } => {
                write!(f, "Emitter {} failed: {}", emitter.display(), status)
            }
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<LayoutError> for GenerateError {
    fn from(e: LayoutError) -> Self {
        GenerateError::Layout(e)
    }
}

impl From<serde_json::Error> for GenerateError {
    fn from(e: serde_json::Error) -> Self {
        GenerateError::Json(e)
    }
}

impl From<serde_yaml::Error> for GenerateError {
    fn from(e: serde_yaml::Error) -> Self {
        GenerateError::Yaml(e)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Generator {
    Json,
    Yaml,
    External(PathBuf),
}

impl FromStr for Generator {
    type Err = GenerateError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "json" => Ok(Generator::Json),
            "yaml" => Ok(Generator::Yaml),
            _ if name.ends_with(".py") || name.ends_with(".sh") => {
                Ok(Generator::External(PathBuf::from(name)))
            }
            _ => Err(GenerateError::UnknownGenerator(name.into())),
        }
    }
}

impl Generator {
    /// Parses a comma separated list of generator names.  Empty names are
    /// skipped.
    pub fn parse_list(list: &str) -> Result<Vec<Generator>, GenerateError> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Generator::from_str)
            .collect()
    }

    /// Runs this generator over `module`, writing under `output_dir`.
    pub fn run(&self, module: &Module, typemap: &Typemap, output_dir: &Path) -> Result<(), GenerateError> {
        match self {
            Generator::Json => {
                let path = write_output(output_dir, &output_name(module, "json"), &ir_json(module, typemap)?)
                    .map_err(|e| GenerateError::Io(output_dir.to_path_buf(), e))?;
                info!("Wrote {}", path.display());
            }
            Generator::Yaml => {
                let path = write_output(output_dir, &output_name(module, "yaml"), &ir_yaml(module, typemap)?)
                    .map_err(|e| GenerateError::Io(output_dir.to_path_buf(), e))?;
                info!("Wrote {}", path.display());
            }
            Generator::External(script) => run_emitter(script, &ir_json(module, typemap)?, output_dir)?,
        }
        Ok(())
    }
}

/// The document handed to emitters.
#[derive(Serialize)]
pub struct IrDocument<'a> {
    pub module: &'a Module,
    pub layouts: &'a [PackedStruct<'a>],
    pub typemap: &'a Typemap,
}

/// Packs every struct of the module, method parameter structs included.
pub fn pack_all(structs: &[Struct]) -> Result<Vec<PackedStruct>, LayoutError> {
    structs.iter().map(PackedStruct::new).collect()
}

pub fn ir_json(module: &Module, typemap: &Typemap) -> Result<String, GenerateError> {
    let structs = module.layout_structs();
    let layouts = pack_all(&structs)?;
    let doc = IrDocument {
        module,
        layouts: &layouts,
        typemap,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn ir_yaml(module: &Module, typemap: &Typemap) -> Result<String, GenerateError> {
    let structs = module.layout_structs();
    let layouts = pack_all(&structs)?;
    let doc = IrDocument {
        module,
        layouts: &layouts,
        typemap,
    };
    Ok(serde_yaml::to_string(&doc)?)
}

/// `<module path>.<extension>`, always relative so it lands under the
/// output directory.
fn output_name(module: &Module, extension: &str) -> String {
    format!("{}.{}", module.path.trim_start_matches('/'), extension)
}

fn emitter_command(script: &Path) -> Command {
    let interpreter = match script.extension().and_then(|e| e.to_str()) {
        Some("py") => "python3",
        _ => "sh",
    };
    let mut cmd = Command::new(interpreter);
    cmd.arg(script);
    cmd
}

fn run_emitter(script: &Path, document: &str, output_dir: &Path) -> Result<(), GenerateError> {
    let mut cmd = emitter_command(script);
    cmd.arg("--output-dir")
        .arg(output_dir)
        .stdin(Stdio::piped());

    debug!("Running {:?}", cmd);
    let io_err = |e| GenerateError::Io(script.to_path_buf(), e);
    let mut child = cmd.spawn().map_err(io_err)?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(document.as_bytes()).map_err(io_err)?;
    }
    let status = child.wait().map_err(io_err)?;
    if !status.success() {
        return Err(GenerateError::EmitterFailed {
            emitter: script.to_path_buf(),
            status,
        });
    }
    Ok(())
}
