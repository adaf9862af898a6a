//! External process execution
//!
//! Runs a build tool as a child process with a working directory, an
//! environment overlay, per-stream IO redirects and a deadline. When the
//! deadline passes the child's whole process tree is killed.

mod tree;

use crate::error::{SrcdepsError, SrcdepsResult};
use crate::request::{IoRedirects, Redirect};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Max number of output lines to include in error messages
const ERROR_TAIL_LINES: usize = 50;

/// A fully described command to run
#[derive(Debug, Clone)]
pub struct ShellCommand {
    executable: String,
    arguments: Vec<String>,
    working_directory: PathBuf,
    environment: BTreeMap<String, String>,
    inherit_environment: bool,
    io_redirects: IoRedirects,
    timeout: Option<Duration>,
}

impl ShellCommand {
    pub fn builder(executable: impl Into<String>) -> ShellCommandBuilder {
        ShellCommandBuilder {
            command: ShellCommand {
                executable: executable.into(),
                arguments: Vec::new(),
                working_directory: PathBuf::from("."),
                environment: BTreeMap::new(),
                inherit_environment: true,
                io_redirects: IoRedirects::inherit_all(),
                timeout: None,
            },
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.executable)?;
        for arg in &self.arguments {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Builder for [`ShellCommand`]
#[derive(Debug)]
pub struct ShellCommandBuilder {
    command: ShellCommand,
}

impl ShellCommandBuilder {
    pub fn argument(mut self, argument: impl Into<String>) -> Self {
        self.command.arguments.push(argument.into());
        self
    }

    pub fn arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command
            .arguments
            .extend(arguments.into_iter().map(Into::into));
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.command.working_directory = dir.into();
        self
    }

    /// Variables overlaid on the child's environment
    pub fn environment(mut self, environment: &BTreeMap<String, String>) -> Self {
        self.command
            .environment
            .extend(environment.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Start from the current process environment (default) or from nothing
    pub fn inherit_environment(mut self, inherit: bool) -> Self {
        self.command.inherit_environment = inherit;
        self
    }

    pub fn io_redirects(mut self, io_redirects: IoRedirects) -> Self {
        self.command.io_redirects = io_redirects;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command.timeout = timeout;
        self
    }

    pub fn build(self) -> ShellCommand {
        self.command
    }
}

/// Result of a command that exited successfully
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    /// Captured stdout; with `err2out` this includes stderr lines
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Where one output stream of the child ends up
enum Sink {
    Inherit,
    ParentStdout,
    Discard,
    Capture,
    File(File),
}

impl Sink {
    fn open(redirect: &Redirect) -> SrcdepsResult<Self> {
        Ok(match redirect {
            Redirect::Inherit => Self::Inherit,
            Redirect::Discard => Self::Discard,
            Redirect::Capture => Self::Capture,
            Redirect::Write(path) => Self::File(
                File::create(path)
                    .map_err(|e| SrcdepsError::io(format!("creating {}", path.display()), e))?,
            ),
            Redirect::Append(path) => Self::File(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| SrcdepsError::io(format!("opening {}", path.display()), e))?,
            ),
            Redirect::Read(path) => {
                return Err(SrcdepsError::configuration(
                    "io_redirects",
                    format!("cannot write output to read:{}", path.display()),
                ))
            }
        })
    }

    /// A second handle on the same destination, for merging stderr
    fn duplicate(&self) -> SrcdepsResult<Self> {
        Ok(match self {
            Self::Inherit | Self::ParentStdout => Self::ParentStdout,
            Self::Discard => Self::Discard,
            Self::Capture => Self::Capture,
            Self::File(file) => Self::File(
                file.try_clone()
                    .map_err(|e| SrcdepsError::io("duplicating stdout file handle", e))?,
            ),
        })
    }

    fn is_capture(&self) -> bool {
        matches!(self, Self::Capture)
    }

    fn into_stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::ParentStdout => Stdio::from(std::io::stdout()),
            Self::Discard => Stdio::null(),
            Self::Capture => Stdio::piped(),
            Self::File(file) => Stdio::from(file),
        }
    }
}

fn stdin_stdio(redirect: &Redirect) -> SrcdepsResult<Stdio> {
    match redirect {
        Redirect::Inherit => Ok(Stdio::inherit()),
        Redirect::Discard => Ok(Stdio::null()),
        Redirect::Read(path) => File::open(path)
            .map(Stdio::from)
            .map_err(|e| SrcdepsError::io(format!("opening {}", path.display()), e)),
        other => Err(SrcdepsError::configuration(
            "io_redirects.stdin",
            format!("'{}' cannot be used for stdin", other),
        )),
    }
}

/// Extract the useful tail of captured output for error diagnostics
pub(crate) fn error_output_tail(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > ERROR_TAIL_LINES {
        lines[total - ERROR_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}

/// Output read from the child so far
///
/// Shared with the collector task so lines survive when collection is cut
/// short.
#[derive(Debug, Default)]
struct Captured {
    stdout: String,
    stderr: String,
}

fn lock(captured: &Mutex<Captured>) -> MutexGuard<'_, Captured> {
    captured.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn read_line<R>(
    reader: &mut Option<BufReader<R>>,
    buf: &mut Vec<u8>,
) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.read_until(b'\n', buf).await,
        None => Ok(0),
    }
}

/// Append the line held in `buf` to `target`, decoding it lossily
fn push_line(target: &mut String, buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    target.push_str(&String::from_utf8_lossy(buf));
    target.push('\n');
    buf.clear();
}

/// Record one read result; returns false once the stream is finished
fn accept(
    stream: &str,
    read: std::io::Result<usize>,
    buf: &mut Vec<u8>,
    target: &mut String,
) -> bool {
    match read {
        Ok(0) => {}
        Ok(_) => {
            push_line(target, buf);
            return true;
        }
        Err(e) => warn!("Reading child {} failed: {}", stream, e),
    }
    // A read interrupted by the other stream may have left a partial line
    if !buf.is_empty() {
        push_line(target, buf);
    }
    false
}

/// Read captured streams line by line until both are closed
///
/// With `merge` set, stderr lines are appended to the stdout buffer in
/// arrival order. A stream that fails to read is dropped, which closes the
/// pipe instead of leaving the child blocked on a full buffer.
async fn collect_output<O, E>(
    stdout: Option<O>,
    stderr: Option<E>,
    merge: bool,
    captured: Arc<Mutex<Captured>>,
) where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut stdout = stdout.map(BufReader::new);
    let mut stderr = stderr.map(BufReader::new);
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_line(&mut stdout, &mut out_buf), if stdout.is_some() => {
                let mut captured = lock(&captured);
                if !accept("stdout", read, &mut out_buf, &mut captured.stdout) {
                    stdout = None;
                }
            }
            read = read_line(&mut stderr, &mut err_buf), if stderr.is_some() => {
                let mut captured = lock(&captured);
                let target = if merge {
                    &mut captured.stdout
                } else {
                    &mut captured.stderr
                };
                if !accept("stderr", read, &mut err_buf, target) {
                    stderr = None;
                }
            }
        }
    }
}

/// Run `command` to completion or until its timeout elapses
///
/// Fails with `ProcessTimeout` when the deadline passes (the process tree is
/// killed first) and with `ProcessExit` on a non-zero exit. Descendants still
/// running when the child exits are killed as well.
pub async fn execute(command: &ShellCommand) -> SrcdepsResult<CommandOutput> {
    if !command.working_directory.is_dir() {
        return Err(SrcdepsError::configuration(
            "working_directory",
            format!("{} is not a directory", command.working_directory.display()),
        ));
    }

    let io = &command.io_redirects;
    let stdout_sink = Sink::open(&io.stdout)?;
    let stderr_sink = if io.err2out {
        stdout_sink.duplicate()?
    } else {
        Sink::open(&io.stderr)?
    };
    let merge = io.err2out && stdout_sink.is_capture();

    let mut cmd = Command::new(&command.executable);
    cmd.args(&command.arguments)
        .current_dir(&command.working_directory)
        .stdin(stdin_stdio(&io.stdin)?)
        .stdout(stdout_sink.into_stdio())
        .stderr(stderr_sink.into_stdio())
        .kill_on_drop(true);
    if !command.inherit_environment {
        cmd.env_clear();
    }
    cmd.envs(&command.environment);
    tree::configure(&mut cmd);

    info!("Executing: {}", command);
    debug!(
        "Working directory: {}, io: {}, timeout: {:?}",
        command.working_directory.display(),
        io,
        command.timeout
    );

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(|e| SrcdepsError::ProcessSpawn {
        command: command.to_string(),
        source: e,
    })?;
    let pid = child.id();

    let captured = Arc::new(Mutex::new(Captured::default()));
    let mut collector = tokio::spawn(collect_output(
        child.stdout.take(),
        child.stderr.take(),
        merge,
        Arc::clone(&captured),
    ));

    let wait_result = match command.timeout {
        Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Command exceeded {} ms, killing process tree: {}",
                    timeout.as_millis(),
                    command
                );
                tree::kill_tree(&mut child).await;
                collector.abort();
                return Err(SrcdepsError::ProcessTimeout {
                    command: command.to_string(),
                    timeout,
                });
            }
        },
        None => child.wait().await,
    };
    let status = match wait_result {
        Ok(status) => status,
        Err(e) => {
            collector.abort();
            return Err(SrcdepsError::io(format!("waiting for {}", command), e));
        }
    };

    // Descendants may keep the pipes open after the child exits
    if let Some(pid) = pid {
        tree::kill_group(pid);
    }
    match tokio::time::timeout(tree::KILL_GRACE, &mut collector).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Output collection failed: {}", e),
        Err(_) => {
            warn!("Output streams still open after exit of: {}", command);
            collector.abort();
        }
    }
    let Captured { stdout, stderr } = std::mem::take(&mut *lock(&captured));
    let duration = start.elapsed();

    if !status.success() {
        return Err(SrcdepsError::ProcessExit {
            command: command.to_string(),
            code: status.code(),
            output: error_output_tail(&stdout, &stderr),
        });
    }

    debug!("Command finished in {} ms: {}", duration.as_millis(), command);
    Ok(CommandOutput {
        code: status.code(),
        stdout,
        stderr,
        duration,
    })
}
