//! OS interrupt forwarding
//!
//! SIGINT, SIGTERM and SIGQUIT delivered to herd itself become `Interrupt`
//! events on the supervisor queue. Every delivery is forwarded; the
//! supervisor ignores all but the first. Outside unix only Ctrl-C is handled.

use herd_task::{EventSender, SupervisorEvent};
use tokio::task::JoinHandle;
use tracing::debug;

/// Install the handlers and start forwarding.
///
/// Handlers are registered before this returns, so no interrupt that arrives
/// after launch falls through to the default action.
#[cfg(unix)]
pub fn forward_interrupts(events: EventSender) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
                _ = sigquit.recv() => "SIGQUIT",
            };
            debug!("Received {}", name);
            if events.send(SupervisorEvent::Interrupt).is_err() {
                break;
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn forward_interrupts(events: EventSender) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            debug!("Received Ctrl-C");
            if events.send(SupervisorEvent::Interrupt).is_err() {
                break;
            }
        }
    }))
}
