//! Local subprocess supervision with a hard deadline.
//!
//! Both `ssh` and `scp` invocations go through [`run_with_timeout`], which
//! captures stdout and stderr on separate reader threads and kills the child
//! once the budget is spent.

use log::{debug, warn};
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest pause between two exit checks.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to wait for pipe readers after the child is gone. A grandchild
/// that inherited the pipes can keep them open past the kill.
const READER_GRACE: Duration = Duration::from_millis(500);

/// How the supervised process ended.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The process exited on its own. `code` is `None` when it was ended by a
    /// signal.
    Exited {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The deadline passed and the process was killed.
    TimedOut { stdout: String, stderr: String },
    /// The process could not be started at all.
    SpawnFailed(std::io::Error),
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Runs `cmd` to completion or until `timeout` elapses.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> ProcessOutcome {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to spawn {:?}: {}", cmd.get_program(), e);
            return ProcessOutcome::SpawnFailed(e);
        }
    };

    let (tx, rx) = mpsc::channel();
    let mut readers = 0;
    if let Some(out) = child.stdout.take() {
        spawn_reader(out, Stream::Stdout, tx.clone());
        readers += 1;
    }
    if let Some(err) = child.stderr.take() {
        spawn_reader(err, Stream::Stderr, tx.clone());
        readers += 1;
    }
    drop(tx);

    let start = Instant::now();
    let mut interval = Duration::from_millis(5);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to poll child process: {}", e);
                break None;
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            warn!("Process exceeded {:?}, killing it", timeout);
            if let Err(e) = child.kill() {
                debug!("Kill after timeout failed: {}", e);
            }
            let _ = child.wait();
            let (stdout, stderr) = collect(&rx, readers);
            return ProcessOutcome::TimedOut { stdout, stderr };
        }

        thread::sleep(interval.min(timeout - elapsed));
        interval = (interval * 2).min(MAX_POLL_INTERVAL);
    };

    let (stdout, stderr) = collect(&rx, readers);
    ProcessOutcome::Exited {
        code: status.and_then(|s| s.code()),
        stdout,
        stderr,
    }
}

/// A chunk read from one pipe, or `None` once that pipe reaches EOF.
type Chunk = (Stream, Option<Vec<u8>>);

fn spawn_reader<R>(mut source: R, stream: Stream, tx: mpsc::Sender<Chunk>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send((stream, Some(buf[..n].to_vec()))).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("Pipe read ended with error: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send((stream, None));
    });
}

/// Drains the readers until every pipe hits EOF or the grace period runs out.
/// Whatever arrived before the cutoff is kept.
fn collect(rx: &mpsc::Receiver<Chunk>, readers: usize) -> (String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let deadline = Instant::now() + READER_GRACE;
    let mut open = readers;

    while open > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Stream::Stdout, Some(bytes))) => stdout.extend_from_slice(&bytes),
            Ok((Stream::Stderr, Some(bytes))) => stderr.extend_from_slice(&bytes),
            Ok((_, None)) => open -= 1,
            Err(_) => {
                debug!("Gave up waiting for process output pipes");
                break;
            }
        }
    }

    (
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    )
}
