//! The child-process seam: everything the session needs from a spawned
//! agent is behind [`ChildProcess`], so the read-loop/write-mutex/event
//! fan-out logic is testable without spawning a real binary.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

/// Everything the adapter needs from a spawned child: write a line to
/// its stdin, read one line from its stdout, and terminate it.
pub trait ChildProcess: Send + Sync {
    /// Write `line` followed by a newline to the child's stdin. Callers
    /// serialize their own writes; implementations need not be
    /// internally synchronized beyond that contract.
    fn write_line(&self, line: &str) -> std::io::Result<()>;

    /// Block for the next stdout line. Returns `Ok(None)` on a clean EOF
    /// (the child closed stdout without crashing mid-write).
    fn read_line(&self) -> std::io::Result<Option<String>>;

    /// Close stdin, signalling the child to wind down.
    fn close_stdin(&self) -> std::io::Result<()>;

    /// Wait up to `timeout` for the child to exit, returning its exit
    /// code if it did. `Ok(None)` means it is still running.
    fn wait_timeout(&self, timeout: Duration) -> std::io::Result<Option<i32>>;

    /// Forcibly terminate the child.
    fn kill(&self) -> std::io::Result<()>;
}

/// A real OS child process communicating over piped stdio.
pub struct RealChildProcess {
    child: Mutex<Child>,
    stdin: Mutex<Option<std::process::ChildStdin>>,
    stdout: Mutex<BufReader<std::process::ChildStdout>>,
}

impl RealChildProcess {
    /// Spawn `command` with `args`, the given environment, piped stdio,
    /// and stderr drained to `/dev/null`-equivalent (`Stdio::null()`).
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
    ) -> std::io::Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .env_clear()
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd.spawn()?;
        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");

        Ok(Self {
            child: Mutex::new(child),
            stdin: Mutex::new(Some(stdin)),
            stdout: Mutex::new(BufReader::new(stdout)),
        })
    }
}

impl ChildProcess for RealChildProcess {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut guard = self.stdin.lock().expect("stdin mutex poisoned");
        let Some(stdin) = guard.as_mut() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin already closed",
            ));
        };
        stdin.write_all(line.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()
    }

    fn read_line(&self) -> std::io::Result<Option<String>> {
        let mut stdout = self.stdout.lock().expect("stdout mutex poisoned");
        let mut buf = String::new();
        let bytes_read = stdout.read_line(&mut buf)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    fn close_stdin(&self) -> std::io::Result<()> {
        // Dropping the handle closes the pipe; idempotent if already closed.
        self.stdin.lock().expect("stdin mutex poisoned").take();
        Ok(())
    }

    fn wait_timeout(&self, timeout: Duration) -> std::io::Result<Option<i32>> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let mut child = self.child.lock().expect("child mutex poisoned");
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status.code().unwrap_or(-1)));
            }
            drop(child);
            if std::time::Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn kill(&self) -> std::io::Result<()> {
        self.child.lock().expect("child mutex poisoned").kill()
    }
}

/// `Probe`'s first check: the command's first token must resolve to an
/// absolute, existing path or a name on `PATH`.
#[must_use]
pub fn command_is_resolvable(command: &str) -> bool {
    let path = std::path::Path::new(command);
    if path.is_absolute() {
        return path.exists();
    }

    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| {
                let candidate = dir.join(command);
                candidate.is_file()
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_path_must_exist() {
        assert!(command_is_resolvable("/bin/sh") || command_is_resolvable("/usr/bin/sh"));
        assert!(!command_is_resolvable("/definitely/not/a/real/binary-xyz"));
    }

    #[test]
    fn relative_name_must_be_on_path() {
        assert!(command_is_resolvable("sh"));
        assert!(!command_is_resolvable("definitely-not-a-real-binary-xyz"));
    }
}
