//! Shared test fakes: an in-memory process table and a launcher that
//! hands out fake pids instead of spawning anything.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dexbot::adapters::logs::FileLogReader;
use dexbot::adapters::persistence::JsonRecordStore;
use dexbot::adapters::wallet::EnvWallet;
use dexbot::domain::error::PmError;
use dexbot::ports::launcher::{Launcher, SpawnedProcess, WorkerCommand};
use dexbot::ports::process::{ProcessControl, TermSignal};
use dexbot::ports::prompt::Prompt;
use dexbot::ports::record_store::RecordStore;
use dexbot::ports::wallet::WalletService;
use dexbot::usecases::supervisor::{Supervisor, SupervisorPorts, SupervisorSettings};

/// Well-known development key (anvil account #0).
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

// ---- Fake OS process table ----

#[derive(Default)]
struct FakeOsState {
    next_pid: u32,
    alive: HashSet<u32>,
    ignore_term: HashSet<u32>,
    fail_signals: bool,
    signals: Vec<(u32, TermSignal)>,
}

/// In-memory [`ProcessControl`].
#[derive(Default)]
pub struct FakeOs {
    state: Mutex<FakeOsState>,
}

impl FakeOs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Allocate a fresh live pid.
    pub fn spawn_pid(&self) -> u32 {
        let mut state = self.state.lock().unwrap();
        state.next_pid += 1;
        let pid = 10_000 + state.next_pid;
        state.alive.insert(pid);
        pid
    }

    /// The process dies without the supervisor's involvement.
    pub fn die(&self, pid: u32) {
        self.state.lock().unwrap().alive.remove(&pid);
    }

    /// SIGTERM is ignored by `pid`; only SIGKILL works.
    pub fn ignore_term(&self, pid: u32) {
        self.state.lock().unwrap().ignore_term.insert(pid);
    }

    /// Every signal delivery fails from now on.
    pub fn fail_signals(&self) {
        self.state.lock().unwrap().fail_signals = true;
    }

    pub fn signals(&self) -> Vec<(u32, TermSignal)> {
        self.state.lock().unwrap().signals.clone()
    }

    pub fn running(&self, pid: u32) -> bool {
        self.state.lock().unwrap().alive.contains(&pid)
    }
}

impl ProcessControl for FakeOs {
    fn is_alive(&self, pid: u32) -> bool {
        self.running(pid)
    }

    fn terminate(&self, pid: u32, signal: TermSignal) -> Result<(), PmError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_signals {
            return Err(PmError::SignalDelivery {
                pid,
                reason: "Operation not permitted".to_string(),
            });
        }
        if !state.alive.contains(&pid) {
            return Err(PmError::SignalDelivery {
                pid,
                reason: "No such process".to_string(),
            });
        }
        state.signals.push((pid, signal));
        let dies = match signal {
            TermSignal::Graceful => !state.ignore_term.contains(&pid),
            TermSignal::Forceful => true,
        };
        if dies {
            state.alive.remove(&pid);
        }
        Ok(())
    }
}

// ---- Fake launcher ----

/// How the next launched worker behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    /// Writes a start-up line and keeps running.
    Healthy,
    /// Keeps running without writing anything.
    Silent,
    /// Writes `output` and exits inside the grace period.
    Crash(String),
    /// Keeps running and ignores SIGTERM.
    Stubborn,
    /// The OS refuses the spawn.
    Refused,
}

struct FakeChild {
    pid: u32,
    os: Arc<FakeOs>,
}

impl SpawnedProcess for FakeChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn has_exited(&mut self) -> bool {
        !self.os.running(self.pid)
    }
}

/// [`Launcher`] allocating pids in a [`FakeOs`].
pub struct FakeLauncher {
    os: Arc<FakeOs>,
    mode: Mutex<LaunchMode>,
    launches: Mutex<Vec<WorkerCommand>>,
}

impl FakeLauncher {
    pub fn new(os: Arc<FakeOs>) -> Arc<Self> {
        Arc::new(Self {
            os,
            mode: Mutex::new(LaunchMode::Healthy),
            launches: Mutex::new(Vec::new()),
        })
    }

    pub fn set_mode(&self, mode: LaunchMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn launches(&self) -> Vec<WorkerCommand> {
        self.launches.lock().unwrap().clone()
    }
}

fn append(log_file: &Path, text: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(log_file)?;
    file.write_all(text.as_bytes())
}

impl Launcher for FakeLauncher {
    fn launch(
        &self,
        command: &WorkerCommand,
        log_file: &Path,
    ) -> io::Result<Box<dyn SpawnedProcess>> {
        let mode = self.mode.lock().unwrap().clone();
        if mode == LaunchMode::Refused {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "spawn refused"));
        }

        self.launches.lock().unwrap().push(command.clone());
        let pid = self.os.spawn_pid();
        match mode {
            LaunchMode::Healthy | LaunchMode::Stubborn => {
                append(log_file, &format!("worker {pid} started\n"))?;
                if mode == LaunchMode::Stubborn {
                    self.os.ignore_term(pid);
                }
            }
            LaunchMode::Crash(output) => {
                append(log_file, &output)?;
                self.os.die(pid);
            }
            LaunchMode::Silent | LaunchMode::Refused => {}
        }

        Ok(Box::new(FakeChild {
            pid,
            os: Arc::clone(&self.os),
        }))
    }
}

// ---- Harness ----

/// A supervisor over fakes rooted in a scratch directory.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub os: Arc<FakeOs>,
    pub launcher: Arc<FakeLauncher>,
    pub store: Arc<JsonRecordStore>,
    pub supervisor: Supervisor,
}

impl Harness {
    pub fn store_file(&self) -> PathBuf {
        self.dir.path().join("processes.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.dir.path().join("logs")
    }

    /// Write a strategy config into the scratch directory.
    pub fn write_config(&self, file: &str, json: &str) -> PathBuf {
        let path = self.dir.path().join(file);
        std::fs::write(&path, json).unwrap();
        path
    }

    pub async fn record_count(&self) -> usize {
        self.store.load().await.len()
    }
}

/// Short timings so tests run fast.
pub fn fast_settings(root: &Path) -> SupervisorSettings {
    SupervisorSettings {
        log_dir: root.join("logs"),
        worker_program: PathBuf::from("/usr/local/bin/dexbot"),
        default_account: "main".to_string(),
        start_grace: Duration::from_millis(10),
        stop_grace: Duration::from_millis(50),
        restart_pause: Duration::from_millis(5),
        crash_tail_lines: 20,
    }
}

pub fn harness_with(wallet: Arc<dyn WalletService>, prompt: Arc<dyn Prompt>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let os = FakeOs::new();
    let launcher = FakeLauncher::new(Arc::clone(&os));
    let store = Arc::new(JsonRecordStore::new(dir.path().join("processes.json")));

    let ports = SupervisorPorts {
        store: Arc::clone(&store) as Arc<dyn RecordStore>,
        processes: Arc::clone(&os) as Arc<dyn ProcessControl>,
        launcher: Arc::clone(&launcher) as Arc<dyn Launcher>,
        logs: Arc::new(FileLogReader),
        wallet,
        prompt,
    };
    let supervisor = Supervisor::new(ports, fast_settings(dir.path()));

    Harness {
        dir,
        os,
        launcher,
        store,
        supervisor,
    }
}

/// Unlocked wallet and a prompt that must never be consulted.
pub fn harness(prompt: Arc<dyn Prompt>) -> Harness {
    let wallet = EnvWallet::with_secret(Some("ops".to_string()), DEV_KEY).unwrap();
    harness_with(Arc::new(wallet), prompt)
}

/// Prompt that fails the test if it is ever used.
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn confirm(&self, message: &str) -> bool {
        panic!("unexpected confirmation: {message}");
    }

    fn secret(&self, message: &str) -> anyhow::Result<String> {
        panic!("unexpected secret prompt: {message}");
    }
}
