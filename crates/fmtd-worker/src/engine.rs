use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use fmtd_common::protocol::error::{FmtdError, Result};

/// The external formatter, invoked as a black box: input text on stdin,
/// transformed text on stdout, diagnostics on stderr.
///
/// Each call spawns and fully drains one process. Concurrent jobs spawn
/// concurrent processes; every invocation's pipes are process-local, so no
/// synchronization is needed between them.
#[derive(Debug, Clone)]
pub struct FormatEngine {
    program: String,
    args: Vec<String>,
}

impl FormatEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Runs the formatter once over `input`.
    ///
    /// Outcomes:
    /// - clean exit and empty stderr: `Ok` with the captured stdout;
    /// - non-zero exit or anything on stderr: [`FmtdError::Diagnostic`]
    ///   carrying the stderr text verbatim (the formatter rejecting the
    ///   submitted text is an expected outcome, not a system fault);
    /// - the process could not be started or fed at all:
    ///   [`FmtdError::EngineSpawn`].
    pub async fn format(&self, input: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FmtdError::EngineSpawn(format!("{}: {}", self.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| FmtdError::EngineSpawn("stdin pipe missing".to_string()))?;

        // Feed stdin while the output pipes are being drained. A formatter
        // that streams output as it reads would otherwise fill its stdout
        // pipe, stop reading stdin, and deadlock against our write.
        let feed = async {
            let result = stdin.write_all(input.as_bytes()).await;
            // Close stdin so the formatter sees EOF and finishes.
            drop(stdin);
            result
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output =
            output.map_err(|e| FmtdError::EngineSpawn(format!("waiting for formatter: {}", e)))?;

        if let Err(e) = fed {
            // A formatter may exit with a diagnostic before draining stdin;
            // let its stderr and exit status speak in that case.
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(FmtdError::EngineSpawn(format!(
                    "writing to formatter stdin: {}",
                    e
                )));
            }
        }

        let diagnostic = String::from_utf8_lossy(&output.stderr).into_owned();

        if !diagnostic.is_empty() {
            debug!(program = %self.program, "formatter produced a diagnostic");
            return Err(FmtdError::Diagnostic(diagnostic));
        }
        if !output.status.success() {
            return Err(FmtdError::Diagnostic(format!(
                "formatter exited with {}",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_engine_echoes_through_cat() {
        let engine = FormatEngine::new("cat");
        let out = engine.format("abc\ndef\n").await.unwrap();
        assert_eq!(out, "abc\ndef\n");
    }

    #[tokio::test]
    async fn test_input_larger_than_pipe_buffer_streams_through() {
        // cat writes as it reads; an input well past the ~64 KiB pipe buffer
        // must round-trip without the stdin write and the output drain
        // deadlocking against each other.
        let engine = FormatEngine::new("cat");
        let input = "0123456789abcdef\n".repeat(64 * 1024); // ~1 MiB

        let out = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            engine.format(&input),
        )
        .await
        .expect("format stalled on a large input")
        .unwrap();

        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn test_stderr_is_a_verbatim_diagnostic() {
        let engine = FormatEngine::new("sh").with_args(vec![
            "-c".to_string(),
            "cat >/dev/null; printf 'syntax error on line 1' >&2; exit 1".to_string(),
        ]);

        let err = engine.format("{{{").await.unwrap_err();
        match err {
            FmtdError::Diagnostic(text) => assert_eq!(text, "syntax error on line 1"),
            other => panic!("expected Diagnostic, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stderr_with_clean_exit_still_fails() {
        let engine = FormatEngine::new("sh").with_args(vec![
            "-c".to_string(),
            "cat; printf 'warning: tabs' >&2".to_string(),
        ]);

        let err = engine.format("x").await.unwrap_err();
        assert!(matches!(err, FmtdError::Diagnostic(t) if t == "warning: tabs"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_without_stderr_reports_status() {
        let engine = FormatEngine::new("sh").with_args(vec![
            "-c".to_string(),
            "cat >/dev/null; exit 3".to_string(),
        ]);

        let err = engine.format("x").await.unwrap_err();
        assert!(matches!(err, FmtdError::Diagnostic(t) if t.contains("exited")));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let engine = FormatEngine::new("/nonexistent/formatter");
        let err = engine.format("x").await.unwrap_err();
        assert!(matches!(err, FmtdError::EngineSpawn(_)), "got: {:?}", err);
    }
}
