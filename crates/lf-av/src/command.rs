//! Builder for executing external tool commands.
//!
//! Two execution modes are offered. [`ToolCommand::execute`] is for short
//! helper invocations (probing, version checks): it enforces a timeout and
//! turns any failure into an error. [`ToolCommand::run_merged`] is for
//! pipeline stages: it interleaves stdout and stderr into one captured
//! stream, waits for the process to exit however long that takes, and
//! leaves outcome classification to the caller.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Default helper-command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a helper tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// Result of a stage process that ran to completion.
#[derive(Debug, Clone)]
pub struct MergedOutput {
    pub status: ExitStatus,
    /// Stdout and stderr lines in arrival order.
    pub output: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use lf_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> lf_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .arg("-v").arg("quiet")
///     .arg("-print_format").arg("json")
///     .arg("-show_format")
///     .arg("-show_streams")
///     .arg("/path/to/video.mp4")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append a path argument.
    pub fn path_arg(&mut self, p: &Path) -> &mut Self {
        self.args.push(p.to_string_lossy().into_owned());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time for [`ToolCommand::execute`].
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr separately.
    ///
    /// # Errors
    ///
    /// Returns [`lf_core::Error::Tool`] if spawning fails, the process
    /// exits unsuccessfully (message includes stderr), or the timeout
    /// expires.
    pub async fn execute(&self) -> lf_core::Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| lf_core::Error::tool(&program_name, format!("failed to spawn: {e}")))?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !output.status.success() {
                    return Err(lf_core::Error::tool(
                        program_name,
                        format!(
                            "exited with status {}: {}",
                            output.status,
                            tool_output.stderr.trim()
                        ),
                    ));
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(lf_core::Error::tool(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            // The child future is dropped here; kill_on_drop reaps it.
            Err(_elapsed) => Err(lf_core::Error::tool(
                program_name,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }

    /// Run the command to completion with stdout and stderr merged.
    ///
    /// No timeout applies: once started, a stage process runs until it
    /// exits. An `Err` means the process could not be started.
    pub async fn run_merged(&self) -> std::io::Result<MergedOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr was not captured"))?;

        // Lines are split on raw bytes so a non-UTF-8 byte can never stop a
        // pipe from being drained.
        let mut out_reader = BufReader::new(stdout);
        let mut err_reader = BufReader::new(stderr);
        let mut out_buf = Vec::new();
        let mut err_buf = Vec::new();
        let mut out_done = false;
        let mut err_done = false;
        let mut merged = String::new();

        while !(out_done && err_done) {
            let line = tokio::select! {
                read = out_reader.read_until(b'\n', &mut out_buf), if !out_done => {
                    next_line(read, &mut out_buf, &mut out_done, &program_name, "stdout")
                }
                read = err_reader.read_until(b'\n', &mut err_buf), if !err_done => {
                    next_line(read, &mut err_buf, &mut err_done, &program_name, "stderr")
                }
            };

            if let Some(line) = line {
                tracing::trace!(tool = %program_name, "{line}");
                merged.push_str(&line);
                merged.push('\n');
            }
        }

        let status = child.wait().await?;
        Ok(MergedOutput {
            status,
            output: merged,
        })
    }
}

/// Turn one `read_until` result into a decoded line.
///
/// Partial reads left in `buf` by a cancelled `select!` branch are kept and
/// completed by the next call. A trailing line without a newline is
/// flushed at end of stream.
fn next_line(
    read: std::io::Result<usize>,
    buf: &mut Vec<u8>,
    done: &mut bool,
    program: &str,
    stream: &str,
) -> Option<String> {
    match read {
        Ok(0) => {
            *done = true;
            (!buf.is_empty()).then(|| take_line(buf))
        }
        Ok(_) if buf.ends_with(b"\n") => Some(take_line(buf)),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(tool = %program, "stopped reading {stream}: {e}");
            *done = true;
            None
        }
    }
}

fn take_line(buf: &mut Vec<u8>) -> String {
    let mut end = buf.len();
    while end > 0 && matches!(buf[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    let line = String::from_utf8_lossy(&buf[..end]).into_owned();
    buf.clear();
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new(PathBuf::from("sh"));
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn execute_echo() {
        // `echo` should be universally available.
        let output = ToolCommand::new(PathBuf::from("echo"))
            .arg("hello")
            .execute()
            .await;

        match output {
            Ok(out) => {
                assert!(out.status.success());
                assert!(out.stdout.trim().contains("hello"));
            }
            Err(_) => {
                // On some minimal environments echo may not exist; skip.
            }
        }
    }

    #[tokio::test]
    async fn execute_nonexistent_tool() {
        let result = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345"))
            .execute()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn timeout_fires() {
        let result = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute()
            .await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("timed out"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn run_merged_captures_both_streams() {
        let Ok(out) = sh("echo to-stdout; echo to-stderr 1>&2").run_merged().await else {
            return; // no sh available
        };
        assert!(out.status.success());
        assert!(out.output.contains("to-stdout"));
        assert!(out.output.contains("to-stderr"));
    }

    #[tokio::test]
    async fn run_merged_reports_exit_code() {
        let Ok(out) = sh("echo failing 1>&2; exit 3").run_merged().await else {
            return;
        };
        assert_eq!(out.status.code(), Some(3));
        assert!(out.output.contains("failing"));
    }

    #[tokio::test]
    async fn run_merged_drains_stderr_after_invalid_utf8() {
        // A latin-1 byte followed by far more than a pipe buffer of progress.
        let script = "printf 'caf\\351\\n' 1>&2; i=0; \
            while [ $i -lt 8000 ]; do \
            echo \"frame=$i fps=25 q=28.0 size=1024kB time=00:00:01.00 bitrate=800kbits/s\" 1>&2; \
            i=$((i+1)); done; echo done";
        let cmd = sh(script);
        let run = tokio::time::timeout(Duration::from_secs(20), cmd.run_merged());
        let out = match run.await {
            Ok(Ok(out)) => out,
            Ok(Err(_)) => return, // no sh available
            Err(_) => panic!("run_merged did not return"),
        };
        assert!(out.status.success());
        assert_eq!(out.output.lines().next(), Some("caf\u{FFFD}"));
        assert!(out.output.contains("frame=7999 "));
        assert!(out.output.contains("done\n"));
    }

    #[tokio::test]
    async fn run_merged_keeps_unterminated_last_line() {
        let Ok(out) = sh("printf 'no newline'").run_merged().await else {
            return;
        };
        assert_eq!(out.output, "no newline\n");
    }

    #[tokio::test]
    async fn run_merged_spawn_error() {
        let result = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345"))
            .run_merged()
            .await;
        assert!(result.is_err());
    }
}
