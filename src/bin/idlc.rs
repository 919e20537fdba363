extern crate log;
extern crate simplelog;

use std::path::Path;
use std::process::exit;
use std::rc::Rc;

use clap::ArgMatches;
use log::info;

use idl_frontend::cli::*;
use idl_frontend::compiler::ir::Module;
use idl_frontend::compiler::translate::translate;
use idl_frontend::compiler::{parse_schema, CompilerContext, DiskSources, SchemaError};
use idl_frontend::generate::{ir_json, pack_all, Typemap};

fn main() {
    let config = configure_cli().get_matches();

    if let Some(level) = get_log_level(&config) {
        if let Err(e) = configure_logging(level) {
            eprintln!("warning: unable to configure logging: {}", e);
        }
    }

    if let Some(args) = config.subcommand_matches("generate") {
        if let Err(code) = generate(args) {
            exit(code)
        }
    }
}

fn generate(args: &ArgMatches) -> Result<(), i32> {
    let config = get_generate_config(args).map_err(|e| {
        print_errs(&[e]);
        ERR_USAGE
    })?;

    let typemap = Typemap::load(&config.typemaps).map_err(|e| {
        print_errs(&[e]);
        ERR_USAGE
    })?;

    let root = std::fs::canonicalize(&config.depth).map_err(|e| {
        print_errs(&[format!("{}: {}", config.depth.display(), e)]);
        ERR_USAGE
    })?;

    let mut ctx = CompilerContext::new(DiskSources)
        .with_search_dirs(config.import_dirs.clone())
        .with_source_root(root);

    // Every input must compile before anything is written
    let mut modules: Vec<(&Path, Rc<Module>)> = vec![];
    for file in &config.files {
        info!("Compiling {}", file.display());
        let module = ctx.compile(file).map_err(|e| {
            print_errs(&[e]);
            ERR_COMPILE
        })?;
        modules.push((file.as_path(), module));
    }

    if let Some(emit) = config.emit {
        for (file, module) in &modules {
            print_emit(emit, file, module).map_err(|e| {
                print_errs(&[e]);
                ERR_COMPILE
            })?;
        }
    }

    for (_, module) in &modules {
        for generator in &config.generators {
            generator
                .run(module, &typemap, &config.output_dir)
                .map_err(|e| {
                    print_errs(&[e]);
                    ERR_COMPILE
                })?;
        }
    }

    Ok(())
}

fn print_emit(emit: Emit, file: &Path, module: &Module) -> Result<(), String> {
    let text = match emit {
        Emit::Record => {
            let source = std::fs::read_to_string(file).map_err(|e| format!("{}: {}", file.display(), e))?;
            let tree = parse_schema(&module.name, &source).map_err(|e| e.to_string())?;
            let record = translate(&tree, &module.name).map_err(|e| SchemaError::from(e).to_string())?;
            serde_json::to_string_pretty(&record).map_err(|e| e.to_string())?
        }
        Emit::Ir => ir_json(module, &Typemap::default()).map_err(|e| e.to_string())?,
        Emit::Layout => {
            let structs = module.layout_structs();
            let layouts = pack_all(&structs).map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&layouts).map_err(|e| e.to_string())?
        }
    };
    println!("{}", text);
    Ok(())
}
