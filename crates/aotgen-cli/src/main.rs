//! aotgen command line.
//!
//! Loads a project file, runs the code generator and reports what happened.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use tracing_subscriber::EnvFilter;

use aotgen_compiler::codegen::summary::SUMMARY_SUFFIX;
use aotgen_compiler::config::MissingTranslation;
use aotgen_compiler::{
    paths, CodegenOptions, CompileMode, CompileOptions, CompileResult, Compiler, CompilerConfig, CompilerError,
    ProjectConfig, SummaryCompiler,
};

mod external;
mod ui;

use external::ProcessCompiler;

#[derive(Parser)]
#[command(name = "aotgen")]
#[command(version)]
#[command(about = "Ahead-of-time template code generation")]
struct Cli {
    /// Project file, or a directory containing tsconfig.json
    #[arg(short, long, global = true, default_value = ProjectConfig::DEFAULT_FILE)]
    project: PathBuf,

    /// Log debug output (AOTGEN_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code for every declaration in the project
    Compile {
        #[command(flatten)]
        codegen: CodegenArgs,
    },

    /// Analyze the project and list its declarations
    Check,

    /// Recompile whenever a file under the base path changes
    Watch {
        #[command(flatten)]
        codegen: CodegenArgs,
    },

    /// Print where a generated file is written
    EmitPath {
        /// Generated file, in source-tree layout
        file: String,
    },

    /// Print the import specifier one file uses to reach another
    Resolve {
        /// File being imported
        imported: String,

        /// File containing the import
        containing: String,
    },
}

#[derive(Args, Clone)]
struct CodegenArgs {
    /// Template compiler command (reads a request on stdin, prints modules
    /// on stdout). Defaults to the built-in summary compiler.
    #[arg(long)]
    compiler: Option<String>,

    /// Call the template compiler once per file
    #[arg(long)]
    per_file: bool,

    /// Translation file to compile with
    #[arg(long)]
    i18n_file: Option<PathBuf>,

    /// Format of the translation file
    #[arg(long)]
    i18n_format: Option<String>,

    /// Locale of the translation file
    #[arg(long)]
    locale: Option<String>,

    /// Strategy for messages without a translation
    #[arg(long, default_value = "warning", value_parser = ["error", "warning", "ignore"])]
    missing_translation: String,
}

impl CodegenArgs {
    fn options(&self) -> CodegenOptions {
        CodegenOptions {
            i18n_file: self.i18n_file.clone(),
            i18n_format: self.i18n_format.clone(),
            locale: self.locale.clone(),
            missing_translation: MissingTranslation::parse(&self.missing_translation).unwrap_or_default(),
            compile_mode: if self.per_file {
                CompileMode::PerFile
            } else {
                CompileMode::Program
            },
        }
    }
}

/// Root-dir traces are only emitted when the project sets `trace`, so their
/// target is always enabled.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn,aotgen::trace=info"
    }
}

fn init_tracing(verbose: bool) {
    let filter =
        EnvFilter::try_from_env("AOTGEN_LOG").unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compile { codegen } => {
            ui::header(env!("CARGO_PKG_VERSION"));
            let config = CompilerConfig {
                project: cli.project,
                codegen: codegen.options(),
            };

            let spinner = ui::spinner("Compiling templates...");
            let start = Instant::now();
            let result = run_compile(&Compiler::new(config), codegen.compiler.as_deref()).await;
            spinner.finish_and_clear();

            match result {
                Ok(result) => {
                    print_result(&result);
                    ui::timing("Done", start.elapsed().as_millis());
                }
                Err(e) => {
                    ui::failure_header();
                    return Err(e.into());
                }
            }
        }

        Commands::Check => {
            let config = CompilerConfig {
                project: cli.project,
                ..Default::default()
            };

            let spinner = ui::spinner("Analyzing...");
            let files = Compiler::new(config).check();
            spinner.finish_and_clear();
            let files = files?;

            let mut declarations = 0;
            for file in files.iter().filter(|file| !file.declarations.is_empty()) {
                ui::file_line(&file.file_name);
                for declaration in &file.declarations {
                    ui::declaration_line(&declaration.name, declaration.kind.as_str());
                    declarations += 1;
                }
            }
            println!();
            ui::success(&format!(
                "{} in {}",
                ui::plural(declarations, "declaration"),
                ui::plural(files.len(), "file")
            ));
        }

        Commands::Watch { codegen } => {
            ui::header(env!("CARGO_PKG_VERSION"));
            let project = ProjectConfig::load(&cli.project)?;
            let config = CompilerConfig {
                project: project.path.clone(),
                codegen: codegen.options(),
            };
            run_watch_mode(&project, config, codegen.compiler).await?;
        }

        Commands::EmitPath { file } => {
            let host = Compiler::new(CompilerConfig {
                project: cli.project,
                ..Default::default()
            })
            .create_host()?;
            let file = absolute(&file)?;
            ui::mapping(&file, &host.calculate_emit_path(&file));
        }

        Commands::Resolve { imported, containing } => {
            let mut host = Compiler::new(CompilerConfig {
                project: cli.project,
                ..Default::default()
            })
            .create_host()?;
            let imported = absolute(&imported)?;
            let containing = absolute(&containing)?;
            let specifier = host.file_name_to_module_name(&imported, &containing)?;
            ui::mapping(&imported, &specifier);
        }
    }

    Ok(())
}

/// Runs one compilation with either the external or the built-in compiler.
async fn run_compile(compiler: &Compiler, command: Option<&str>) -> Result<CompileResult, CompilerError> {
    match command {
        Some(command) => {
            let process = ProcessCompiler::parse(command)
                .ok_or_else(|| CompilerError::compile("the --compiler command is empty"))?;
            compiler.compile(process).await
        }
        None => compiler.compile(SummaryCompiler::new()).await,
    }
}

fn print_result(result: &CompileResult) {
    ui::success(&format!(
        "{} across {}",
        ui::plural(result.declarations, "declaration"),
        ui::plural(result.files_analyzed, "file")
    ));

    if result.emitted.is_empty() {
        ui::dim("Nothing to write.");
        return;
    }

    println!();
    ui::box_header("Generated");
    for path in &result.emitted {
        ui::box_line(path);
    }
    ui::box_footer();
    println!();
}

fn absolute(path: &str) -> miette::Result<String> {
    let path = Path::new(path);
    if path.is_absolute() {
        return Ok(paths::normalize(&path.to_string_lossy()));
    }
    let cwd = std::env::current_dir().map_err(|e| miette::miette!("cannot read working directory: {}", e))?;
    Ok(paths::normalize(&cwd.join(path).to_string_lossy()))
}

/// Changes to generated output must not trigger another run.
fn is_relevant_change(path: &Path, options: &CompileOptions) -> bool {
    let path = paths::normalize(&path.to_string_lossy());
    let in_dependencies = path.split('/').any(|segment| segment == paths::DEPENDENCY_ROOT);
    let in_separate_gen_dir =
        options.gen_dir != options.base_path && paths::replace_prefix(&path, &options.gen_dir, "").is_some();
    let generated = paths::is_generated_file(&path) || path.ends_with(SUMMARY_SUFFIX);
    !in_dependencies && !in_separate_gen_dir && !generated
}

async fn run_watch_mode(
    project: &ProjectConfig,
    config: CompilerConfig,
    command: Option<String>,
) -> miette::Result<()> {
    let base_path = PathBuf::from(&project.options.base_path);
    let options = project.options.clone();
    ui::info(&format!("Watching for changes in {}", base_path.display()));
    println!();

    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);

    let mut debouncer = new_debouncer(Duration::from_millis(500), move |result: DebounceEventResult| match result {
        Ok(events) => {
            if events.iter().any(|event| is_relevant_change(&event.path, &options)) {
                let _ = tx.try_send(());
            }
        }
        Err(e) => tracing::warn!(error = %e, "file watcher error"),
    })
    .map_err(|e| miette::miette!("failed to create file watcher: {}", e))?;

    debouncer
        .watcher()
        .watch(&base_path, RecursiveMode::Recursive)
        .map_err(|e| miette::miette!("failed to watch {}: {}", base_path.display(), e))?;

    let compiler = Compiler::new(config);
    recompile(&compiler, command.as_deref(), "Compiling...").await;
    ui::info("Ready! Waiting for changes...");

    loop {
        tokio::select! {
            _ = rx.recv() => {
                println!();
                recompile(&compiler, command.as_deref(), "Change detected, recompiling...").await;
                println!();
                ui::info("Ready! Waiting for changes...");
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                ui::dim("Stopping watch mode.");
                break;
            }
        }
    }

    Ok(())
}

/// One watch iteration. Every run builds a fresh host, so no cache
/// survives between changes.
async fn recompile(compiler: &Compiler, command: Option<&str>, message: &str) {
    let spinner = ui::spinner(message);
    let start = Instant::now();
    let result = run_compile(compiler, command).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => ui::success(&format!(
            "Wrote {} in {}ms",
            ui::plural(result.emitted.len(), "file"),
            start.elapsed().as_millis()
        )),
        Err(e) => ui::error(&format!("{:?}", miette::Report::new(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_output_is_ignored() {
        let options = CompileOptions::new("/proj/src", "/proj/gen");
        assert!(is_relevant_change(Path::new("/proj/src/app/a.component.ts"), &options));
        assert!(is_relevant_change(Path::new("/proj/src/app/a.component.html"), &options));
        assert!(!is_relevant_change(Path::new("/proj/gen/app/a.component.js"), &options));
        assert!(!is_relevant_change(Path::new("/proj/src/node_modules/lib/index.d.ts"), &options));
    }

    #[test]
    fn test_generated_files_ignored_in_shared_tree() {
        let options = CompileOptions::new("/proj/src", "/proj/src");
        assert!(is_relevant_change(Path::new("/proj/src/app/a.component.ts"), &options));
        assert!(!is_relevant_change(Path::new("/proj/src/app/a.component.ngfactory.ts"), &options));
        assert!(!is_relevant_change(Path::new("/proj/src/app/a.component.ngsummary.json"), &options));
    }

    #[test]
    fn test_trace_target_enabled_by_default() {
        assert!(default_directives(false).contains("aotgen::trace=info"));
        assert!(default_directives(false).parse::<EnvFilter>().is_ok());
        assert_eq!(default_directives(true), "debug");
    }

    #[test]
    fn test_codegen_args_map_to_options() {
        let cli = Cli::parse_from([
            "aotgen",
            "compile",
            "--per-file",
            "--locale",
            "fr",
            "--missing-translation",
            "error",
        ]);
        let Commands::Compile { codegen } = cli.command else {
            panic!("expected compile");
        };
        let options = codegen.options();
        assert_eq!(options.compile_mode, CompileMode::PerFile);
        assert_eq!(options.locale.as_deref(), Some("fr"));
        assert_eq!(options.missing_translation, MissingTranslation::Error);
        assert_eq!(cli.project, PathBuf::from("tsconfig.json"));
    }
}
