//! Shutdown signal for the interactive session

use tokio::sync::watch;
use tracing::debug;

/// Fires once SIGINT (or SIGTERM on unix) is received
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Start listening for OS shutdown signals
    pub fn listen() -> Result<Self, std::io::Error> {
        let (tx, rx) = watch::channel(false);

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;
            tokio::spawn(async move {
                tokio::select! {
                    _ = sigint.recv() => debug!("SIGINT received"),
                    _ = sigterm.recv() => debug!("SIGTERM received"),
                }
                let _ = tx.send(true);
            });
        }

        #[cfg(not(unix))]
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Ctrl-C received");
                let _ = tx.send(true);
            }
        });

        Ok(Self { receiver: rx })
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown is requested
    pub async fn recv(&mut self) {
        // A closed channel means the listener is gone; treat it as never firing
        if self.receiver.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
