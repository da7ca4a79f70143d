//! Session-wide Ctrl-C handling.
//!
//! tokio keeps its SIGINT handler once installed, so a single listener serves
//! the whole session: an interrupt cancels the analysis in flight, or ends the
//! session when nothing is running.

use std::sync::Arc;

use nyaya_advisor::{Advisor, Outcome};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
struct Router {
    in_flight: Arc<Mutex<Option<CancellationToken>>>,
    idle: mpsc::UnboundedSender<()>,
}

impl Router {
    /// Returns `false` once the session stopped listening.
    async fn interrupt(&self) -> bool {
        match self.in_flight.lock().await.take() {
            Some(token) => {
                tracing::warn!("interrupt received, cancelling analysis");
                token.cancel();
                true
            }
            None => self.idle.send(()).is_ok(),
        }
    }
}

pub struct Interrupts {
    router: Router,
    idle: mpsc::UnboundedReceiver<()>,
    listener: Option<JoinHandle<()>>,
}

impl Interrupts {
    fn new() -> Self {
        let (tx, idle) = mpsc::unbounded_channel();
        Self {
            router: Router {
                in_flight: Arc::new(Mutex::new(None)),
                idle: tx,
            },
            idle,
            listener: None,
        }
    }

    /// Install the process-wide Ctrl-C listener.
    pub fn install() -> Self {
        let mut interrupts = Self::new();
        let router = interrupts.router.clone();
        interrupts.listener = Some(tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !router.interrupt().await {
                    break;
                }
            }
        }));
        interrupts
    }

    /// Submit one incident; an interrupt meanwhile cancels this analysis only.
    pub async fn submit(&self, advisor: &mut Advisor, incident: &str) -> Outcome {
        let cancel = advisor.request_token();
        *self.router.in_flight.lock().await = Some(cancel.clone());
        let outcome = advisor.submit_with(incident, &cancel).await;
        self.router.in_flight.lock().await.take();
        outcome
    }

    /// Resolves on an interrupt received while no analysis is running.
    pub async fn idle_interrupt(&mut self) {
        let _ = self.idle.recv().await;
    }
}

impl Drop for Interrupts {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn interrupt_cancels_analysis_in_flight() {
        let mut interrupts = Interrupts::new();
        let token = CancellationToken::new();
        *interrupts.router.in_flight.lock().await = Some(token.clone());

        assert!(interrupts.router.interrupt().await);
        assert!(token.is_cancelled());
        assert!(interrupts.idle.try_recv().is_err());
    }

    #[tokio::test]
    async fn interrupt_while_idle_ends_session() {
        let mut interrupts = Interrupts::new();
        assert!(interrupts.router.interrupt().await);

        tokio::time::timeout(Duration::from_secs(1), interrupts.idle_interrupt())
            .await
            .expect("idle interrupt delivered");
    }

    #[tokio::test]
    async fn each_interrupt_routed_after_the_first() {
        let mut interrupts = Interrupts::new();
        let first = CancellationToken::new();
        *interrupts.router.in_flight.lock().await = Some(first.clone());
        interrupts.router.interrupt().await;
        assert!(first.is_cancelled());

        // Back at the prompt: the next interrupt is not swallowed.
        interrupts.router.interrupt().await;
        assert!(interrupts.idle.try_recv().is_ok());
    }
}
