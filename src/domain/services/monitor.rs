#[cfg(test)]
#[path = "monitor_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::domain::models::Alert;
use crate::domain::models::FinancialSnapshot;
use crate::domain::models::Notifier;

/// Periodically inspects the latest financial snapshot and raises an alert
/// while profit is negative. Observational only: it never mutates
/// conversation or financial state, and its task dies with the token.
pub struct ProactiveMonitor {
    cancel: CancellationToken,
}

impl ProactiveMonitor {
    pub fn start(
        mut snapshot: watch::Receiver<FinancialSnapshot>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> ProactiveMonitor {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            // The interval's first tick fires immediately; skip it so the
            // monitor only reports settled data.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let snap = snapshot.borrow_and_update().clone();
                        if snap.profit < 0.0 {
                            notifier.notify(Alert {
                                title: "Profit alert".to_string(),
                                body: format!(
                                    "Current profit is negative (${:.2}). Review expenses.",
                                    snap.profit
                                ),
                                tag: "profit-alert".to_string(),
                            });
                        }
                    }
                }
            }
        });

        return ProactiveMonitor { cancel };
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ProactiveMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
