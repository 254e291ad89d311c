use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ExecutionConfig;
use crate::error::{ApertiumError, Result};
use crate::language::pair_key;
use crate::modes::ModeRegistry;
use crate::platform::OsTag;

/// Returned in place of a translation when no mode covers the pair
pub fn missing_mode_message(pair_key: &str) -> String {
    format!("No such mode: {}", pair_key)
}

/// Folder with the toolchain binaries: `<root>/<build>/apertium-all-dev/bin`
pub fn executable_dir(root: &Path, build_type: &str) -> PathBuf {
    root.join(build_type).join("apertium-all-dev").join("bin")
}

/// Shell command line plus the environment it runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: String,
    /// Shell flags preceding the command line
    pub args: Vec<String>,
    pub command_line: String,
    /// Pass the command line to the shell untouched instead of quoting it.
    /// `cmd /S /C` strips one outer pair of quotes itself, so quoting it again
    /// would mangle every quoted path inside.
    pub raw_command_line: bool,
    pub env: Vec<(String, OsString)>,
}

impl ShellInvocation {
    /// `/bin/sh -c` everywhere except Windows, which gets a quiet `cmd` without autorun
    pub fn for_platform(os: OsTag, command_line: &str) -> Self {
        let (program, args): (&str, &[&str]) = if os.is_windows() {
            ("cmd", &["/D", "/Q", "/S", "/C"])
        } else {
            ("/bin/sh", &["-c"])
        };

        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            command_line: command_line.to_string(),
            raw_command_line: os.is_windows(),
            env: Vec::new(),
        }
    }

    pub fn env<V: Into<OsString>>(mut self, key: &str, value: V) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    /// Put `dir` in front of the inherited PATH
    pub fn prepend_path(self, dir: &Path) -> Self {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let paths = std::iter::once(dir.to_path_buf()).chain(std::env::split_paths(&inherited));
        let joined = std::env::join_paths(paths).unwrap_or_else(|e| {
            warn!("Cannot add {} to PATH: {}", dir.display(), e);
            inherited.clone()
        });
        self.env("PATH", joined)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        push_command_line(&mut cmd, &self.command_line, self.raw_command_line);
        cmd.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_os_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down every stage
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

#[cfg(windows)]
fn push_command_line(cmd: &mut Command, command_line: &str, raw: bool) {
    if raw {
        cmd.raw_arg(command_line);
    } else {
        cmd.arg(command_line);
    }
}

#[cfg(not(windows))]
fn push_command_line(cmd: &mut Command, command_line: &str, _raw: bool) {
    cmd.arg(command_line);
}

/// Everything a finished pipeline produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: ExitStatus,
}

impl PipelineOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Standard output followed by standard error, as one string
    pub fn combined_text(&self) -> String {
        let mut bytes = Vec::with_capacity(self.stdout.len() + self.stderr.len());
        bytes.extend_from_slice(&self.stdout);
        bytes.extend_from_slice(&self.stderr);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Standard output, or a `Pipeline` error when the exit status is non-zero
    pub fn into_checked(self, pair: &str) -> Result<String> {
        if self.success() {
            Ok(self.stdout_text())
        } else {
            Err(ApertiumError::Pipeline {
                pair: pair.to_string(),
                code: self.status.code(),
                stderr: self.stderr_text().trim().to_string(),
            })
        }
    }
}

/// Runs registered pipelines as child processes
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    os: OsTag,
    executable_dir: PathBuf,
    config: ExecutionConfig,
}

impl PipelineExecutor {
    pub fn new(os: OsTag, executable_dir: PathBuf, config: ExecutionConfig) -> Self {
        let executable_dir = std::fs::canonicalize(&executable_dir).unwrap_or(executable_dir);
        Self { os, executable_dir, config }
    }

    pub fn executable_dir(&self) -> &Path {
        &self.executable_dir
    }

    /// Invocation for a pipeline, with PATH and LC_ALL set up
    pub fn invocation(&self, command_line: &str) -> ShellInvocation {
        ShellInvocation::for_platform(self.os, command_line)
            .prepend_path(&self.executable_dir)
            .env("LC_ALL", &self.config.locale)
    }

    /// Translate `text`, returning standard output and standard error together.
    ///
    /// An unregistered pair is not an error: the returned text says which
    /// mode is missing.
    pub async fn translate(
        &self,
        registry: &ModeRegistry,
        source: &str,
        target: &str,
        text: &str,
    ) -> Result<String> {
        let pair = pair_key(source, target);
        match self.execute(registry, &pair, text).await? {
            Some(output) => Ok(output.combined_text()),
            None => Ok(missing_mode_message(&pair)),
        }
    }

    /// Translate `text`, failing when the pipeline exits non-zero
    pub async fn translate_checked(
        &self,
        registry: &ModeRegistry,
        source: &str,
        target: &str,
        text: &str,
    ) -> Result<String> {
        let pair = pair_key(source, target);
        match self.execute(registry, &pair, text).await? {
            Some(output) => output.into_checked(&pair),
            None => Ok(missing_mode_message(&pair)),
        }
    }

    /// Run the mode registered under `pair`, or `None` if there is none
    pub async fn execute(
        &self,
        registry: &ModeRegistry,
        pair: &str,
        text: &str,
    ) -> Result<Option<PipelineOutput>> {
        let Some(mode) = registry.get(pair) else {
            info!("No mode registered for {}", pair);
            return Ok(None);
        };

        let invocation = self.invocation(&mode.command_line);
        let limit = match self.config.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let Some(output) = run_pipeline_within(&invocation, text.as_bytes(), limit).await? else {
            return Err(ApertiumError::Timeout {
                pair: pair.to_string(),
                secs: self.config.timeout_secs,
            });
        };

        if !output.success() {
            warn!("Pipeline {} exited with {}", pair, output.status);
        }
        Ok(Some(output))
    }
}

/// Spawn the invocation, feed it `input` and collect both output streams.
///
/// Input is written from its own task while stdout and stderr are drained,
/// so a pipeline that produces output before consuming all input cannot
/// stall on a full pipe.
pub async fn run_pipeline(invocation: &ShellInvocation, input: &[u8]) -> Result<PipelineOutput> {
    run_pipeline_within(invocation, input, None)
        .await?
        .ok_or_else(|| ApertiumError::Io(std::io::Error::other("pipeline stopped without a time limit")))
}

/// Like [`run_pipeline`], but gives up after `limit`.
///
/// On expiry the whole process tree is killed and `None` is returned.
pub async fn run_pipeline_within(
    invocation: &ShellInvocation,
    input: &[u8],
    limit: Option<Duration>,
) -> Result<Option<PipelineOutput>> {
    debug!(
        "Executing pipeline: {} {:?} {}",
        invocation.program, invocation.args, invocation.command_line
    );

    let mut child = invocation.command().spawn()?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ApertiumError::Io(std::io::Error::other("child stdin was not captured")))?;

    let input = input.to_vec();
    let writer = tokio::spawn(async move {
        stdin.write_all(&input).await?;
        stdin.shutdown().await
    });
    let stdout = tokio::spawn(drain(child.stdout.take()));
    let stderr = tokio::spawn(drain(child.stderr.take()));

    let status = match limit {
        None => child.wait().await?,
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!("Pipeline ran longer than {:?}, killing it", limit);
                kill_tree(&mut child).await;
                writer.abort();
                stdout.abort();
                stderr.abort();
                return Ok(None);
            }
        },
    };

    let stdout = joined(stdout).await?;
    let stderr = joined(stderr).await?;

    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!("Pipeline closed its input early");
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(e) => return Err(ApertiumError::Io(std::io::Error::other(e))),
    }

    Ok(Some(PipelineOutput { stdout, stderr, status }))
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buffer).await?;
    }
    Ok(buffer)
}

async fn joined(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.await {
        Ok(bytes) => Ok(bytes?),
        Err(e) => Err(ApertiumError::Io(std::io::Error::other(e))),
    }
}

/// Kill the shell and every stage it started, then reap the shell
async fn kill_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        kill_descendants(pid).await;
    }
    if let Err(e) = child.kill().await {
        debug!("Shell already gone: {}", e);
    }
}

#[cfg(unix)]
async fn kill_descendants(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    // The shell leads its own group, see `ShellInvocation::command`
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!("Cannot kill process group {}: {}", pid, e);
    }
}

#[cfg(windows)]
async fn kill_descendants(pid: u32) {
    let pid = pid.to_string();
    let result = Command::new("taskkill")
        .args(["/T", "/F", "/PID", pid.as_str()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match result {
        Ok(status) if status.success() => {}
        Ok(status) => debug!("taskkill for {} exited with {}", pid, status),
        Err(e) => debug!("Cannot run taskkill for {}: {}", pid, e),
    }
}
