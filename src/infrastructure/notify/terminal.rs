#[cfg(test)]
#[path = "terminal_test.rs"]
mod tests;

use dashmap::DashMap;
use owo_colors::OwoColorize;

use crate::domain::models::Alert;
use crate::domain::models::Notifier;

/// Prints alerts to stderr. Alerts replace by tag: re-raising the same
/// alert body under the same tag stays quiet instead of stacking lines.
#[derive(Default)]
pub struct TerminalNotifier {
    last_by_tag: DashMap<String, String>,
}

impl TerminalNotifier {
    fn should_emit(&self, alert: &Alert) -> bool {
        if let Some(last) = self.last_by_tag.get(&alert.tag) {
            if *last == alert.body {
                return false;
            }
        }

        self.last_by_tag
            .insert(alert.tag.to_string(), alert.body.to_string());
        return true;
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, alert: Alert) {
        if !self.should_emit(&alert) {
            return;
        }

        eprintln!("\n{} {}", alert.title.yellow().bold(), alert.body);
    }
}
