//! User Feedback Layer
//!
//! Toast presentation is an external collaborator behind [`Notifier`]. The
//! [`ToastChannel`] implementation forwards toasts over a channel to whatever
//! thread renders them; the [`NotificationSequencer`] paces them.

pub mod sequencer;

pub use sequencer::NotificationSequencer;

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Notification collaborator. Calls must not block.
pub trait Notifier: Send + Sync {
    fn show_success(&self, message: &str);
    fn show_info(&self, message: &str);
}

/// Toast flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
}

/// A toast waiting to be presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Notifier that sends toasts to a presenter over a channel
#[derive(Clone)]
pub struct ToastChannel {
    sender: Sender<Toast>,
}

impl ToastChannel {
    /// Create the channel and the receiving end for the presenter
    pub fn new() -> (Self, Receiver<Toast>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }

    fn send(&self, kind: ToastKind, message: &str) {
        let _ = self.sender.send(Toast {
            kind,
            message: message.to_string(),
        });
    }
}

impl Notifier for ToastChannel {
    fn show_success(&self, message: &str) {
        self.send(ToastKind::Success, message);
    }

    fn show_info(&self, message: &str) {
        self.send(ToastKind::Info, message);
    }
}
