//! Process tree termination
//!
//! A build must not leave descendants behind, whether it timed out or
//! exited with background jobs still running. On Unix the child leads its
//! own process group, which is killed as a whole; on Windows `taskkill /T`
//! walks the tree.

use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// How long to wait for a killed child to be reaped
pub(crate) const KILL_GRACE: Duration = Duration::from_secs(5);

/// Prepare `command` so its whole tree can be killed later
#[cfg(unix)]
pub(crate) fn configure(command: &mut Command) {
    command.process_group(0);
}

#[cfg(windows)]
pub(crate) fn configure(_command: &mut Command) {}

#[cfg(unix)]
fn killpg(pid: u32) -> std::io::Result<()> {
    // The child called setpgid(0, 0) at spawn, so its pid is the group id
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(unix)]
async fn kill_descendants(pid: u32) {
    if let Err(e) = killpg(pid) {
        debug!("killpg({}) failed: {}", pid, e);
    }
}

#[cfg(windows)]
async fn kill_descendants(pid: u32) {
    let result = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;
    if let Err(e) = result {
        debug!("taskkill /PID {} failed: {}", pid, e);
    }
}

/// Kill whatever is left of an exited child's process group
///
/// A group id is not handed out again while the group has members, so the
/// signal reaches only processes the build left behind.
#[cfg(unix)]
pub(crate) fn kill_group(pid: u32) {
    if killpg(pid).is_ok() {
        debug!("Killed leftover processes of group {}", pid);
    }
}

// Windows pids are recycled as soon as the process is gone
#[cfg(windows)]
pub(crate) fn kill_group(_pid: u32) {}

/// Kill `child` and everything it spawned, then reap it
pub(crate) async fn kill_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        kill_descendants(pid).await;
    }
    if let Err(e) = child.start_kill() {
        debug!("start_kill failed: {}", e);
    }

    match tokio::time::timeout(KILL_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!("Killed process exited with {}", status),
        Ok(Err(e)) => warn!("Failed to reap killed process: {}", e),
        Err(_) => warn!(
            "Killed process not reaped within {} ms",
            KILL_GRACE.as_millis()
        ),
    }
}
