//! Refresh scheduler
//!
//! Drives periodic work on fixed-interval timers. Each registered task gets
//! its own spawned timer loop, so a slow handler or fetch behind one task
//! never delays another task's ticks. The first tick fires immediately at
//! startup.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Scheduled task
pub struct Task {
    pub id: String,
    pub period: Duration,
    pub handler: Arc<dyn Fn() + Send + Sync>,
}

/// Fixed-interval task scheduler
pub struct Scheduler {
    tasks: Vec<Task>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Add a task to the scheduler
    pub fn add_task<F>(&mut self, id: impl Into<String>, period: Duration, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let task = Task {
            id: id.into(),
            period,
            handler: Arc::new(handler),
        };
        info!(id = %task.id, period_secs = period.as_secs(), "Scheduled task added");
        self.tasks.push(task);
    }

    /// Start the scheduler, spawning one independent timer loop per task
    pub fn start(self) {
        info!(tasks = self.tasks.len(), "Starting scheduler");

        for task in self.tasks {
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(task.period);
                loop {
                    ticker.tick().await;
                    debug!(task_id = %task.id, "Executing scheduled task");
                    (task.handler)();
                }
            });
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(scheduler: &mut Scheduler, id: &str, period: Duration) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        scheduler.add_task(id, period, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_fires_immediately() {
        let mut scheduler = Scheduler::new();
        let count = counting_task(&mut scheduler, "servers", Duration::from_secs(5));
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_repeat_on_the_period() {
        let mut scheduler = Scheduler::new();
        let count = counting_task(&mut scheduler, "servers", Duration::from_secs(5));
        scheduler.start();

        // Ticks at 0s, 5s, 10s, 15s
        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tasks_tick_independently() {
        let mut scheduler = Scheduler::new();
        let servers = counting_task(&mut scheduler, "servers", Duration::from_secs(5));
        let tasks = counting_task(&mut scheduler, "tasks", Duration::from_secs(7));
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(servers.load(Ordering::SeqCst), 2); // 0s, 5s
        assert_eq!(tasks.load(Ordering::SeqCst), 2); // 0s, 7s
    }
}
