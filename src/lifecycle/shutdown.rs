//! Shutdown coordination.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Hands out futures that resolve once shutdown has been triggered, so the
/// server and any background tasks can drain together.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A future that resolves when [`trigger`] is called.
    ///
    /// [`trigger`]: Shutdown::trigger
    pub fn notified(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    /// Begin shutdown. Safe to call more than once.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notified_resolves_after_trigger() {
        let shutdown = Shutdown::new();
        let notified = shutdown.notified();
        shutdown.trigger();
        notified.await;
    }

    #[tokio::test]
    async fn every_listener_is_woken() {
        let shutdown = Shutdown::new();
        let first = shutdown.notified();
        let second = shutdown.notified();
        shutdown.trigger();
        first.await;
        second.await;
    }
}
