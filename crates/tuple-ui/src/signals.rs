//! Signal handling for graceful shutdown.

use tokio::runtime::Handle;
use tracing::info;

use crate::controller::{EventSender, UiEvent};

/// Forward SIGTERM and SIGINT to the UI loop as [`UiEvent::Shutdown`].
pub fn setup_signal_handlers(runtime: &Handle, events: &EventSender) {
    // Handle SIGTERM
    #[cfg(unix)]
    {
        let tx_term = events.clone();
        runtime.spawn(async move {
            if let Ok(mut stream) =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            {
                stream.recv().await;
                info!("Received SIGTERM");
                let _ = tx_term.send(UiEvent::Shutdown);
            }
        });
    }

    // Handle SIGINT (Ctrl+C)
    let tx_int = events.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT");
            let _ = tx_int.send(UiEvent::Shutdown);
        }
    });
}
