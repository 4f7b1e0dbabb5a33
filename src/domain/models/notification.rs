/// A local notification raised by the proactive monitor. Alerts sharing a
/// tag replace one another instead of stacking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    pub tag: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, alert: Alert);
}
