//! Template compiler running as a child process.
//!
//! Each compile request is written as JSON to the child's stdin. The child
//! answers with a JSON array of generated modules on stdout and exits 0.
//! Anything else fails the run with the child's stderr.

use std::process::Stdio;

use aotgen_compiler::codegen::{AotCompiler, CompileRequest, GeneratedModule};
use aotgen_compiler::{CompilerError, CompilerHost};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

pub struct ProcessCompiler {
    program: String,
    args: Vec<String>,
}

impl ProcessCompiler {
    /// Parses a command line such as `node ./ngc-bridge.js --strict`.
    /// Arguments are split on whitespace.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl AotCompiler for ProcessCompiler {
    async fn compile(
        &mut self,
        _host: &mut CompilerHost,
        request: &CompileRequest,
    ) -> Result<Vec<GeneratedModule>, CompilerError> {
        let payload = serde_json::to_vec(request).map_err(|e| CompilerError::compile(e.to_string()))?;
        debug!(program = %self.program, files = request.files.len(), "spawning template compiler");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CompilerError::compile(format!("failed to start '{}': {}", self.program, e)))?;

        // The request is written while stdout and stderr drain, so a child that
        // answers before reading all of its input cannot fill a pipe and stall.
        let stdin = child.stdin.take();
        let send = async move {
            match stdin {
                Some(mut stdin) => stdin.write_all(&payload).await,
                None => Ok(()),
            }
            // Dropping stdin closes the pipe so the child sees EOF.
        };
        let (sent, output) = tokio::join!(send, child.wait_with_output());
        let output = output
            .map_err(|e| CompilerError::compile(format!("failed to wait for '{}': {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("'{}' exited with {}", self.program, output.status)
            } else {
                stderr
            };
            return Err(CompilerError::compile(message));
        }

        sent.map_err(|e| CompilerError::compile(format!("failed to send request: {}", e)))?;

        serde_json::from_slice(&output.stdout)
            .map_err(|e| CompilerError::compile(format!("invalid compiler output: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::time::Duration;

    use aotgen_compiler::codegen::{AnalyzedFile, CompilerSettings};
    use aotgen_compiler::{CompileOptions, MemoryHostContext};

    #[test]
    fn test_parse_command_line() {
        let compiler = ProcessCompiler::parse("node  bridge.js --strict").unwrap();
        assert_eq!(compiler.program(), "node");
        assert_eq!(compiler.args, vec!["bridge.js", "--strict"]);
    }

    #[test]
    fn test_parse_empty_command() {
        assert!(ProcessCompiler::parse("   ").is_none());
    }

    fn request_with_resource(size: usize) -> CompileRequest {
        let file = AnalyzedFile {
            file_name: "/proj/src/app/a.component.ts".to_string(),
            declarations: Vec::new(),
            resources: [("/proj/src/app/a.component.html".to_string(), "x".repeat(size))]
                .into_iter()
                .collect(),
        };
        CompileRequest {
            files: vec![file],
            settings: CompilerSettings::default(),
        }
    }

    fn host() -> CompilerHost {
        CompilerHost::new(
            CompileOptions::new("/proj/src", "/proj/gen"),
            Rc::new(MemoryHostContext::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_large_request_does_not_stall_on_echoing_child() {
        let mut compiler = ProcessCompiler::parse("cat").unwrap();
        let request = request_with_resource(1024 * 1024);

        let result = tokio::time::timeout(Duration::from_secs(30), compiler.compile(&mut host(), &request))
            .await
            .expect("compiler process stalled");

        // `cat` echoes the request, which is not a module list.
        match result {
            Err(CompilerError::CompileFailed { message }) => {
                assert!(message.contains("invalid compiler output"), "{}", message)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let mut compiler = ProcessCompiler::parse("false").unwrap();
        let result = compiler.compile(&mut host(), &request_with_resource(16)).await;
        assert!(matches!(result, Err(CompilerError::CompileFailed { .. })));
    }
}
