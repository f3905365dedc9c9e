//! External converter invocation.
//!
//! Runs one headless LibreOffice (or compatible) process per document and waits
//! for it with a deadline. Whether a PDF was actually written is checked by the
//! locator, not here.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use super::ConversionError;

const SPAWN_ATTEMPTS: u32 = 5;

/// Characters escaped in the path part of a `file://` URL.
const URL_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Outcome of a converter run that exited with status 0.
#[derive(Debug, Clone, Copy)]
pub struct Completion {
    pub exit_code: i32,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct ConverterInvoker {
    program: String,
    timeout: Duration,
}

impl ConverterInvoker {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arguments for a single headless PDF export.
    pub fn command_args(
        input_path: &Path,
        output_dir: &Path,
        profile_dir: Option<&Path>,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--headless".into(), "--norestore".into()];
        if let Some(profile) = profile_dir {
            args.push(profile_arg(profile));
        }
        args.push("--convert-to".into());
        args.push("pdf".into());
        args.push("--outdir".into());
        args.push(output_dir.as_os_str().to_os_string());
        args.push(input_path.as_os_str().to_os_string());
        args
    }

    /// Run the converter to completion.
    ///
    /// The converter leads its own process group. If it outlives the configured
    /// timeout the whole group is killed, so helper processes the launcher
    /// started go down with it.
    pub async fn invoke(
        &self,
        input_path: &Path,
        output_dir: &Path,
        profile_dir: Option<&Path>,
    ) -> Result<Completion, ConversionError> {
        let args = Self::command_args(input_path, output_dir, profile_dir);
        info!(
            "Running converter: {} {}",
            self.program,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let started = Instant::now();
        let mut child = spawn_retrying(|| command.spawn()).await.map_err(|source| {
            ConversionError::ProcessSpawn {
                program: self.program.clone(),
                source,
            }
        })?;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let waited = tokio::time::timeout(self.timeout, async {
            tokio::join!(child.wait(), read_pipe(stdout_pipe), read_pipe(stderr_pipe))
        })
        .await;
        let (status, stdout, stderr) = match waited {
            Ok((status, stdout, stderr)) => {
                let status = status.map_err(|e| ConversionError::ProcessExit {
                    code: None,
                    stderr: e.to_string(),
                })?;
                (status, stdout, stderr)
            }
            Err(_) => {
                warn!(
                    "Converter exceeded {:?} on {}, killing it",
                    self.timeout,
                    input_path.display()
                );
                kill_process_tree(&mut child).await;
                return Err(ConversionError::Timeout(self.timeout));
            }
        };
        let elapsed = started.elapsed();

        let stdout = String::from_utf8_lossy(&stdout);
        let stderr = String::from_utf8_lossy(&stderr);
        if !stdout.trim().is_empty() {
            debug!("converter stdout: {}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("converter stderr: {}", stderr.trim());
        }

        if !status.success() {
            let code = status.code();
            warn!(
                "Converter exited with status {:?} after {:?}: {}",
                code,
                elapsed,
                stderr.trim()
            );
            return Err(ConversionError::ProcessExit {
                code,
                stderr: stderr.into_owned(),
            });
        }

        Ok(Completion {
            exit_code: status.code().unwrap_or(0),
            elapsed,
        })
    }
}

/// Spawns, retrying while the executable is still open for writing elsewhere
/// (ETXTBSY, e.g. during a package upgrade).
async fn spawn_retrying<T>(mut spawn: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut attempt = 1;
    loop {
        match spawn() {
            Err(e) if e.kind() == io::ErrorKind::ExecutableFileBusy && attempt < SPAWN_ATTEMPTS => {
                debug!("Converter executable busy (attempt {attempt}), retrying");
                tokio::time::sleep(Duration::from_millis(20 * u64::from(attempt))).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!("Failed to read converter output: {}", e);
        }
    }
    buf
}

/// Kills the converter's process group, then reaps the converter itself.
async fn kill_process_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // Spawned with process_group(0), so the group id is the child's pid.
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
        if rc != 0 {
            debug!("killpg({}) failed: {}", pid, io::Error::last_os_error());
        }
    }

    if let Err(e) = child.start_kill() {
        debug!("Failed to kill converter: {}", e);
    }
    if let Err(e) = child.wait().await {
        warn!("Failed to reap converter: {}", e);
    }
}

/// `-env:UserInstallation=file:///...` pointing the converter at a private profile.
///
/// Expects an absolute path; anything not starting with `/` is treated as a
/// drive-letter path.
fn profile_arg(profile_dir: &Path) -> OsString {
    let path = profile_dir.to_string_lossy();
    #[cfg(windows)]
    let path = path.replace('\\', "/");
    let encoded = utf8_percent_encode(&path, URL_PATH);
    let url = if path.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    };
    format!("-env:UserInstallation={url}").into()
}
