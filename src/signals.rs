// src/signals.rs

//! Turns signals aimed at the supervisor into `InterruptRequested` events.
//!
//! Jobs live in their own process groups, so a signal that kills the
//! supervisor never reaches them. Every interrupting signal therefore goes
//! through the control loop, which terminates the jobs and removes the
//! workspace before exiting.

use std::io;

use tokio::sync::mpsc;
use tracing::info;

use crate::engine::SupervisorEvent;

/// Install handlers for SIGINT, SIGTERM and SIGHUP and forward each delivery
/// to `events`.
///
/// Handlers are registered before this returns. Must be called from within
/// a Tokio runtime.
#[cfg(unix)]
pub fn forward_interrupts(events: mpsc::Sender<SupervisorEvent>) -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let kinds = [
        ("SIGINT", SignalKind::interrupt()),
        ("SIGTERM", SignalKind::terminate()),
        ("SIGHUP", SignalKind::hangup()),
    ];

    for (name, kind) in kinds {
        let mut stream = signal(kind)?;
        let tx = events.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                info!(signal = name, "interrupt received");
                if tx.send(SupervisorEvent::InterruptRequested).await.is_err() {
                    return;
                }
            }
        });
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn forward_interrupts(events: mpsc::Sender<SupervisorEvent>) -> io::Result<()> {
    use tracing::warn;

    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("interrupt received");
            if events.send(SupervisorEvent::InterruptRequested).await.is_err() {
                return;
            }
        }
    });
    Ok(())
}
