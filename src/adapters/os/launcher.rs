//! Detached worker launcher.
//!
//! The worker gets its own process group, a null stdin and the log
//! file as stdout/stderr, so it neither receives the operator's
//! Ctrl-C nor holds a pipe that would keep the supervisor around.

use std::fs::OpenOptions;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use tracing::{info, instrument};

use crate::ports::launcher::{Launcher, SpawnedProcess, WorkerCommand};

/// [`Launcher`] using `std::process` with `process_group(0)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedLauncher;

/// Child handle; dropping it neither waits nor kills.
struct DetachedChild {
    child: Child,
}

impl SpawnedProcess for DetachedChild {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

impl Launcher for DetachedLauncher {
    #[instrument(skip(self, command), fields(program = %command.program.display()))]
    fn launch(
        &self,
        command: &WorkerCommand,
        log_file: &Path,
    ) -> io::Result<Box<dyn SpawnedProcess>> {
        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        let stderr = stdout.try_clone()?;

        let child = Command::new(&command.program)
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .process_group(0)
            .spawn()?;

        info!(
            pid = child.id(),
            log = %log_file.display(),
            "Worker spawned"
        );

        Ok(Box::new(DetachedChild { child }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn shell(script: &str) -> WorkerCommand {
        WorkerCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
            env: vec![("DEXBOT_TEST_VALUE".to_string(), "forwarded".to_string())],
        }
    }

    fn wait_exit(child: &mut Box<dyn SpawnedProcess>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !child.has_exited() {
            assert!(Instant::now() < deadline, "worker did not exit");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_output_and_env_reach_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("w.log");
        std::fs::write(&log, "previous run\n").unwrap();

        let mut child = DetachedLauncher
            .launch(&shell("echo out $DEXBOT_TEST_VALUE; echo err >&2"), &log)
            .unwrap();
        assert!(child.pid() > 0);
        wait_exit(&mut child);

        let content = std::fs::read_to_string(&log).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains("out forwarded"));
        assert!(content.contains("err"));
    }

    #[test]
    fn test_worker_runs_in_own_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("pg.log");

        let mut child = DetachedLauncher.launch(&shell("ps -o pgid= -p $$"), &log).unwrap();
        let pid = child.pid();
        wait_exit(&mut child);

        let pgid: u32 = std::fs::read_to_string(&log).unwrap().trim().parse().unwrap();
        assert_eq!(pgid, pid);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let command = WorkerCommand {
            program: PathBuf::from("/nonexistent/dexbot-worker"),
            args: Vec::new(),
            env: Vec::new(),
        };
        let err = DetachedLauncher
            .launch(&command, &dir.path().join("x.log"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
