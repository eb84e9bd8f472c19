//! Interrupt and termination handling.
//!
//! Signals are watched on a dedicated thread driving a current-thread tokio
//! runtime. The first signal cancels the shared token; ingestion and the color
//! pass notice it and unwind. The listener keeps running, and a second signal
//! exits the process at once, which also covers a renderer that blocks.

use pcv_data::CancellationToken;
use std::io;
use std::thread;
use tracing::{debug, warn};

/// Exit status of a forced exit, as a shell reports death by SIGINT.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Start watching for SIGINT and SIGTERM.
///
/// Handlers are registered before this returns.
pub fn listen(token: CancellationToken) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut shutdown = {
        let _guard = runtime.enter();
        Shutdown::register()?
    };

    thread::Builder::new()
        .name("pcv-signals".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let mut escalation = Escalation::new(token);
                loop {
                    let name = match shutdown.wait().await {
                        Ok(name) => name,
                        Err(e) => {
                            warn!("Signal listener failed: {}", e);
                            break;
                        }
                    };
                    match escalation.record() {
                        SignalAction::Cancel => {
                            warn!("Received {}, stopping (send again to exit now)", name);
                        }
                        SignalAction::Exit => {
                            warn!("Received {} again, exiting", name);
                            std::process::exit(FORCED_EXIT_CODE);
                        }
                    }
                }
            })
        })?;
    debug!("Registered signal handlers");
    Ok(())
}

/// Response to one received signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    /// Ask the pipeline to stop at its next check.
    Cancel,
    /// Stop waiting on the pipeline.
    Exit,
}

/// Counts received signals: the first cancels, any later one exits.
#[derive(Debug)]
struct Escalation {
    token: CancellationToken,
    received: usize,
}

impl Escalation {
    fn new(token: CancellationToken) -> Self {
        Self { token, received: 0 }
    }

    fn record(&mut self) -> SignalAction {
        self.received += 1;
        if self.received == 1 {
            self.token.cancel();
            SignalAction::Cancel
        } else {
            SignalAction::Exit
        }
    }
}

#[cfg(unix)]
struct Shutdown {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Shutdown {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn wait(&mut self) -> io::Result<&'static str> {
        let received = tokio::select! {
            r = self.interrupt.recv() => r.map(|_| "SIGINT"),
            r = self.terminate.recv() => r.map(|_| "SIGTERM"),
        };
        received.ok_or_else(|| io::Error::other("signal stream closed"))
    }
}

#[cfg(not(unix))]
struct Shutdown;

#[cfg(not(unix))]
impl Shutdown {
    fn register() -> io::Result<Self> {
        Ok(Self)
    }

    async fn wait(&mut self) -> io::Result<&'static str> {
        tokio::signal::ctrl_c().await.map(|_| "Ctrl-C")
    }
}
