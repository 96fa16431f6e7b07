//! One-shot wake-up timer

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Time left until `deadline`, zero if it already passed.
pub fn until(deadline: DateTime<Utc>) -> Duration {
    (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO)
}

pub struct WakeTimer {
    deadline: DateTime<Utc>,
    fired: oneshot::Receiver<()>,
    task: JoinHandle<()>,
}

impl WakeTimer {
    pub fn arm(deadline: DateTime<Utc>) -> Self {
        let (tx, rx) = oneshot::channel();
        let delay = until(deadline);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(());
        });
        Self {
            deadline,
            fired: rx,
            task,
        }
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    /// `true` once the deadline passes, `false` if the timer was cancelled.
    pub async fn fired(&mut self) -> bool {
        (&mut self.fired).await.is_ok()
    }
}

impl Drop for WakeTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_at_deadline() {
        let mut timer = WakeTimer::arm(Utc::now() + chrono::Duration::minutes(10));
        assert!(timer.fired().await);
    }

    #[tokio::test(start_paused = true)]
    async fn past_deadline_fires_immediately() {
        let mut timer = WakeTimer::arm(Utc::now() - chrono::Duration::minutes(10));
        assert!(timer.fired().await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let mut timer = WakeTimer::arm(Utc::now() + chrono::Duration::minutes(10));
        timer.cancel();
        assert!(!timer.fired().await);
    }
}
