//! Subprocess plumbing shared by the system capabilities.

use std::io;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

/// Run a command to completion and capture its output. An `Err` means the
/// process could not be spawned; a non-zero exit is reported in the output.
pub(crate) fn run(program: &str, args: &[&str]) -> io::Result<Output> {
    Command::new(program).args(args).output()
}

/// Run a command and turn a non-zero exit into an error carrying stderr.
pub(crate) fn check(program: &str, args: &[&str]) -> io::Result<()> {
    check_cmd(Command::new(program).args(args))
}

/// [`check`] for a caller-built command (extra env vars, cwd).
pub(crate) fn check_cmd(cmd: &mut Command) -> io::Result<()> {
    let output = cmd.output()?;
    if output.status.success() {
        return Ok(());
    }
    Err(command_failed(cmd, &output))
}

/// Run with a bounded timeout, killing the child on expiry.
///
/// Used for init-system calls where a hung service manager must not block
/// the run indefinitely.
pub(crate) fn status_with_timeout(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> io::Result<std::process::ExitStatus> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!(
                    "`{program} {}` did not finish within {}s",
                    args.join(" "),
                    timeout.as_secs()
                ),
            ));
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn command_failed(cmd: &Command, output: &Output) -> io::Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    io::Error::other(format!(
        "`{:?}` exited with {}: {}",
        cmd.get_program().to_string_lossy(),
        output.status,
        stderr.trim()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn check_reports_stderr_on_failure() {
        let err = check("sh", &["-c", "echo boom >&2; exit 3"]).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    #[cfg(unix)]
    fn status_with_timeout_kills_hung_child() {
        let start = Instant::now();
        let err =
            status_with_timeout("sleep", &["30"], Duration::from_millis(200)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    #[cfg(unix)]
    fn status_with_timeout_passes_exit_status_through() {
        let status =
            status_with_timeout("sh", &["-c", "exit 4"], Duration::from_secs(5)).unwrap();
        assert_eq!(status.code(), Some(4));
    }
}
