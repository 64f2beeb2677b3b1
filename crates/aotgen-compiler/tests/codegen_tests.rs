//! End-to-end runs of the code generator against an in-memory host.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use aotgen_compiler::codegen::{
    AotCompiler, CodeGenerator, CompileRequest, GeneratedImport, GeneratedModule, SummaryCompiler, PREAMBLE,
};
use aotgen_compiler::{
    CodegenOptions, CompileMode, CompileOptions, CompilerError, CompilerHost, HostContext, MemoryHostContext, Program,
};

/// Compiler that records its requests and answers with canned modules.
#[derive(Default)]
struct ScriptedCompiler {
    requests: Rc<RefCell<Vec<CompileRequest>>>,
    modules: Vec<GeneratedModule>,
    fail: bool,
}

impl AotCompiler for ScriptedCompiler {
    async fn compile(
        &mut self,
        _host: &mut CompilerHost,
        request: &CompileRequest,
    ) -> Result<Vec<GeneratedModule>, CompilerError> {
        self.requests.borrow_mut().push(request.clone());
        if self.fail {
            return Err(CompilerError::compile("template parse errors"));
        }
        Ok(self.modules.clone())
    }
}

/// In-memory host whose writes to one path fail.
struct FailingWrites {
    inner: Rc<MemoryHostContext>,
    fail_on: String,
}

impl HostContext for FailingWrites {
    fn file_exists(&self, path: &str) -> bool {
        self.inner.file_exists(path)
    }

    fn directory_exists(&self, path: &str) -> bool {
        self.inner.directory_exists(path)
    }

    fn read_file(&self, path: &str) -> Result<String, CompilerError> {
        self.inner.read_file(path)
    }

    fn write_file(&self, path: &str, content: &str, source_files: &[String]) -> Result<(), CompilerError> {
        if path == self.fail_on {
            return Err(CompilerError::io(path, "no space left on device"));
        }
        self.inner.write_file(path, content, source_files)
    }
}

fn project_files() -> MemoryHostContext {
    MemoryHostContext::new()
        .with_file(
            "/proj/src/app/a.component.ts",
            r#"
import { Component } from '@angular/core';

@Component({ selector: 'app-a', templateUrl: './a.component.html' })
export class AComponent {}
"#,
        )
        .with_file("/proj/src/app/a.component.html", "<h1>a</h1>")
        .with_file("/proj/src/app/a.component.ngfactory.ts", "// stale output")
        .with_file("/proj/src/app/consts.ts", "const local = 1;")
        .with_file("/proj/node_modules/@angular/core/core.d.ts", "export declare class Component {}")
        .with_file(
            "/proj/node_modules/@angular/core/core.metadata.json",
            r#"{"__symbolic":"module","version":3,"metadata":{},"importAs":"@angular/core"}"#,
        )
}

fn program() -> Program {
    Program::from_files([
        "/proj/src/app/a.component.ts",
        "/proj/src/app/a.component.ngfactory.ts",
        "/proj/src/app/consts.ts",
    ])
}

fn host(fs: &Rc<MemoryHostContext>) -> CompilerHost {
    CompilerHost::new(CompileOptions::new("/proj/src", "/proj/gen"), fs.clone()).unwrap()
}

fn factory_module() -> GeneratedModule {
    GeneratedModule {
        source_file_url: "/proj/src/app/a.component.ts".to_string(),
        gen_file_url: "/proj/src/app/a.component.ngfactory.ts".to_string(),
        source_text: "export const AComponentNgFactory = i1.createFactory(i0.AComponent);\n".to_string(),
        imports: vec![
            GeneratedImport {
                alias: "i0".to_string(),
                file: "/proj/src/app/a.component.ts".to_string(),
            },
            GeneratedImport {
                alias: "i1".to_string(),
                file: "/proj/node_modules/@angular/core/core.d.ts".to_string(),
            },
        ],
    }
}

#[tokio::test]
async fn test_codegen_writes_generated_files() {
    let fs = Rc::new(project_files());
    let requests = Rc::new(RefCell::new(Vec::new()));
    let compiler = ScriptedCompiler {
        requests: requests.clone(),
        modules: vec![factory_module()],
        fail: false,
    };

    let mut generator = CodeGenerator::create(CodegenOptions::default(), program(), host(&fs), compiler).unwrap();
    let result = generator.codegen().await.unwrap();

    assert_eq!(result.files_analyzed, 2);
    assert_eq!(result.declarations, 1);
    assert_eq!(result.emitted, vec!["/proj/gen/app/a.component.ngfactory.ts".to_string()]);

    let requests = requests.borrow();
    assert_eq!(requests.len(), 1);
    let files: Vec<_> = requests[0].files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(files, vec!["/proj/src/app/a.component.ts", "/proj/src/app/consts.ts"]);
    assert_eq!(
        requests[0].files[0].resources["/proj/src/app/a.component.html"],
        "<h1>a</h1>"
    );

    let written = fs.get("/proj/gen/app/a.component.ngfactory.ts").unwrap();
    assert!(written.starts_with(PREAMBLE));
    assert!(written.contains("import * as i0 from './a.component';\n"));
    assert!(written.contains("import * as i1 from '@angular/core';\n"));
    assert!(written.ends_with("i1.createFactory(i0.AComponent);\n"));
}

#[tokio::test]
async fn test_json_outputs_have_no_preamble() {
    let fs = Rc::new(project_files());
    let mut generator =
        CodeGenerator::create(CodegenOptions::default(), program(), host(&fs), SummaryCompiler::new()).unwrap();
    let result = generator.codegen().await.unwrap();

    assert_eq!(result.emitted, vec!["/proj/gen/app/a.component.ngsummary.json".to_string()]);
    let written = fs.get("/proj/gen/app/a.component.ngsummary.json").unwrap();
    let summary: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(summary["moduleName"], "./a.component");
    assert_eq!(summary["symbols"][0]["name"], "AComponent");
    assert_eq!(summary["symbols"][0]["kind"], "component");
}

#[tokio::test]
async fn test_per_file_mode_compiles_each_file() {
    let fs = Rc::new(project_files());
    let requests = Rc::new(RefCell::new(Vec::new()));
    let compiler = ScriptedCompiler {
        requests: requests.clone(),
        ..Default::default()
    };
    let options = CodegenOptions {
        compile_mode: CompileMode::PerFile,
        ..Default::default()
    };

    let mut generator = CodeGenerator::create(options, program(), host(&fs), compiler).unwrap();
    generator.codegen().await.unwrap();

    let requests = requests.borrow();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|request| request.files.len() == 1));
}

#[tokio::test]
async fn test_compile_failure_fails_the_run() {
    let fs = Rc::new(project_files());
    let compiler = ScriptedCompiler {
        modules: vec![factory_module()],
        fail: true,
        ..Default::default()
    };

    let mut generator = CodeGenerator::create(CodegenOptions::default(), program(), host(&fs), compiler).unwrap();
    let result = generator.codegen().await;

    assert!(matches!(result, Err(CompilerError::CompileFailed { .. })));
    assert!(fs.written().is_empty());
}

#[tokio::test]
async fn test_write_failure_fails_the_run() {
    let fs = Rc::new(project_files());
    let context = Rc::new(FailingWrites {
        inner: fs.clone(),
        fail_on: "/proj/gen/app/a.component.ngfactory.ts".to_string(),
    });
    let host = CompilerHost::new(CompileOptions::new("/proj/src", "/proj/gen"), context).unwrap();
    let style_module = GeneratedModule {
        source_file_url: "/proj/src/app/a.component.ts".to_string(),
        gen_file_url: "/proj/src/app/a.component.ngstyle.ts".to_string(),
        source_text: "export const styles = [];\n".to_string(),
        imports: Vec::new(),
    };
    let compiler = ScriptedCompiler {
        modules: vec![factory_module(), style_module],
        ..Default::default()
    };

    let mut generator = CodeGenerator::create(CodegenOptions::default(), program(), host, compiler).unwrap();
    let result = generator.codegen().await;

    match result {
        Err(CompilerError::IoError { path, .. }) => {
            assert_eq!(path, PathBuf::from("/proj/gen/app/a.component.ngfactory.ts"))
        }
        other => panic!("expected a write error, got {:?}", other.map(|r| r.emitted)),
    }
    assert!(fs.written().is_empty());
    assert!(fs.get("/proj/gen/app/a.component.ngstyle.ts").is_none());
}

#[test]
fn test_translation_file_requires_locale() {
    let fs = Rc::new(project_files().with_file("/proj/messages.xlf", "<xliff/>"));
    let options = CodegenOptions {
        i18n_file: Some(PathBuf::from("/proj/messages.xlf")),
        ..Default::default()
    };

    let result = CodeGenerator::create(options, program(), host(&fs), ScriptedCompiler::default());
    match result {
        Err(CompilerError::MissingLocale { file }) => assert_eq!(file, "/proj/messages.xlf"),
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("expected a missing locale error"),
    }
}

#[test]
fn test_translations_are_forwarded() {
    let fs = Rc::new(MemoryHostContext::new().with_file("/proj/messages.xlf", "<xliff/>"));
    let options = CodegenOptions {
        i18n_file: Some(PathBuf::from("/proj/messages.xlf")),
        i18n_format: Some("xlf".to_string()),
        locale: Some("fr".to_string()),
        ..Default::default()
    };

    let generator = CodeGenerator::create(options, Program::default(), host(&fs), ScriptedCompiler::default()).unwrap();
    let settings = generator.settings();
    assert_eq!(settings.translations.as_deref(), Some("<xliff/>"));
    assert_eq!(settings.locale.as_deref(), Some("fr"));
    assert_eq!(settings.gen_dir, "/proj/gen");
}
