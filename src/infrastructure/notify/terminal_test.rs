use super::TerminalNotifier;
use crate::domain::models::Alert;

fn alert(tag: &str, body: &str) -> Alert {
    return Alert {
        title: "Profit alert".to_string(),
        body: body.to_string(),
        tag: tag.to_string(),
    };
}

#[test]
fn it_replaces_instead_of_stacking() {
    let notifier = TerminalNotifier::default();

    assert!(notifier.should_emit(&alert("profit-alert", "Profit is -250.00")));
    assert!(!notifier.should_emit(&alert("profit-alert", "Profit is -250.00")));
    assert!(notifier.should_emit(&alert("profit-alert", "Profit is -300.00")));
}

#[test]
fn it_tracks_tags_independently() {
    let notifier = TerminalNotifier::default();

    assert!(notifier.should_emit(&alert("profit-alert", "body")));
    assert!(notifier.should_emit(&alert("cash-alert", "body")));
}
