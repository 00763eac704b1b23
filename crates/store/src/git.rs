//! Best-effort `git` queries. Every failure (binary missing, not a repository,
//! non-zero exit, timeout) collapses to `None`.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

pub const GIT_TIMEOUT_ENV: &str = "ROADMAPPER_GIT_TIMEOUT_MS";
const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_millis(5_000);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn git_timeout() -> Duration {
    std::env::var(GIT_TIMEOUT_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map_or(DEFAULT_GIT_TIMEOUT, Duration::from_millis)
}

/// Runs `git -C <root> <args>` and returns stdout when it exits successfully
/// before the timeout.
fn run_git(root: &Path, args: &[&str]) -> Option<String> {
    let mut child = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| log::debug!("git {args:?}: spawn failed: {err}"))
        .ok()?;

    let mut stdout = child.stdout.take()?;
    let reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
        buf
    });

    let deadline = Instant::now() + git_timeout();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                log::warn!("git {args:?} timed out in {}", root.display());
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(err) => {
                log::debug!("git {args:?}: wait failed: {err}");
                return None;
            }
        }
    };

    let bytes = reader.join().ok()?;
    if !status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Current branch name; `None` outside a repository or on a detached HEAD.
#[must_use]
pub fn current_branch(root: &Path) -> Option<String> {
    let out = run_git(root, &["branch", "--show-current"])?;
    let branch = out.trim();
    if branch.is_empty() {
        return None;
    }
    Some(branch.to_string())
}

/// Lines of `git status --short`.
#[must_use]
pub fn status_short(root: &Path) -> Option<Vec<String>> {
    let out = run_git(root, &["status", "--short"])?;
    Some(
        out.lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .filter(|line| !line.trim().is_empty())
            .collect(),
    )
}

/// `git init`; returns whether it succeeded.
pub fn init_repository(root: &Path) -> bool {
    run_git(root, &["init"]).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn non_repository_yields_none() {
        let temp = tempdir().unwrap();
        // A plain temp dir is not a repository (or git is absent); either way None.
        let nested = temp.path().join("plain");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join(".git"), "gitdir: /definitely/not/here\n").unwrap();
        assert_eq!(current_branch(&nested), None);
        assert_eq!(status_short(&nested), None);
    }

    #[test]
    fn missing_directory_yields_none() {
        let temp = tempdir().unwrap();
        assert_eq!(current_branch(&temp.path().join("gone")), None);
    }
}
