//! Paced notification queue
//!
//! Several labels recognized in one frame would otherwise pop toasts on top
//! of each other. The sequencer shows them one at a time with a fixed pause
//! after each. It is a queue plus a step function driven by the clock, and
//! [`NotificationSequencer::notify_all`] drives it with async sleeps so the
//! pause never blocks the thread.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::Notifier;
use crate::analysis::{Classification, ClassifiedValue};

/// What the sequencer wants to happen next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Present this entry now
    Emit(ClassifiedValue),
    /// Nothing may be shown before this instant
    Wait(Instant),
    /// Queue drained and pause elapsed
    Idle,
}

pub struct NotificationSequencer {
    queue: VecDeque<ClassifiedValue>,
    pacing: Duration,
    resume_at: Option<Instant>,
}

impl NotificationSequencer {
    pub fn new(pacing: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            pacing,
            resume_at: None,
        }
    }

    pub fn enqueue<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = ClassifiedValue>,
    {
        self.queue.extend(entries);
    }

    /// Advance the state machine to `now`
    pub fn step(&mut self, now: Instant) -> Step {
        if let Some(at) = self.resume_at {
            if now < at {
                return Step::Wait(at);
            }
            self.resume_at = None;
        }

        match self.queue.pop_front() {
            Some(entry) => {
                self.resume_at = Some(now + self.pacing);
                Step::Emit(entry)
            }
            None => Step::Idle,
        }
    }

    /// Present every entry in order, pausing after each one.
    /// Resolves once the last pause has elapsed.
    pub async fn notify_all(&mut self, notifier: &dyn Notifier, entries: Vec<ClassifiedValue>) {
        self.enqueue(entries);

        loop {
            match self.step(Instant::now()) {
                Step::Emit(entry) => present(notifier, &entry),
                Step::Wait(at) => sleep_until(at).await,
                Step::Idle => break,
            }
        }
    }
}

fn present(notifier: &dyn Notifier, entry: &ClassifiedValue) {
    match entry.classification {
        Classification::New => {
            debug!("Notifying new value {}", entry.value);
            notifier.show_success(&format!("Scanned {}", entry.value));
        }
        Classification::Duplicate => {
            debug!("Notifying duplicate value {}", entry.value);
            notifier.show_info(&format!("{} already scanned", entry.value));
        }
    }
}
