//! Debug script to see what the collector produces for a file.
//!
//! Usage: debug_metadata <file.ts|file.d.ts> [tsconfig.json]

use std::rc::Rc;

use aotgen_compiler::{paths, CompileOptions, CompilerHost, NodeHostContext, ProjectConfig};

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(file) = args.next() else {
        eprintln!("usage: debug_metadata <file> [project]");
        std::process::exit(2);
    };
    let file = match std::fs::canonicalize(&file) {
        Ok(path) => paths::normalize(&path.to_string_lossy()),
        Err(e) => {
            eprintln!("Error: {}: {}", file, e);
            std::process::exit(1);
        }
    };

    let options = match args.next() {
        Some(project) => match ProjectConfig::load(project.as_ref()) {
            Ok(project) => project.options,
            Err(e) => {
                eprintln!("Error: {:?}", e);
                std::process::exit(1);
            }
        },
        None => {
            let dir = paths::dirname(&file);
            CompileOptions::new(&dir, &dir)
        }
    };

    let mut host = match CompilerHost::new(options, Rc::new(NodeHostContext::new())) {
        Ok(host) => host,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            std::process::exit(1);
        }
    };

    println!("File: {}", file);
    println!("Source file: {}", host.is_source_file(&file));
    println!("Emit path: {}", host.calculate_emit_path(&file));

    match host.get_metadata_for(&file) {
        Ok(documents) if documents.is_empty() => println!("\nNo metadata"),
        Ok(documents) => {
            for document in documents {
                println!("\nVersion {}:", document.version());
                match serde_json::to_string_pretty(&document.to_value()) {
                    Ok(text) => println!("{}", text),
                    Err(e) => println!("  <unprintable: {}>", e),
                }
            }
        }
        Err(e) => {
            println!("Error: {:?}", e);
        }
    }
}
