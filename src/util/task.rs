use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinHandle;

/// Background tasks keyed by purpose. Spawning into an occupied slot
/// aborts whatever was there.
#[derive(Default)]
pub struct TaskSlots {
    tasks: HashMap<&'static str, JoinHandle<()>>,
}

impl TaskSlots {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    pub fn spawn<F>(&mut self, key: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.replace(key, tokio::spawn(future));
    }

    pub fn replace(&mut self, key: &'static str, task: JoinHandle<()>) {
        if let Some(handle) = self.tasks.insert(key, task) {
            handle.abort();
        }
    }

    pub fn abort(&mut self, key: &'static str) -> bool {
        match self.tasks.remove(key) {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    pub fn is_running(&self, key: &'static str) -> bool {
        self.tasks.get(key).is_some_and(|h| !h.is_finished())
    }

    pub fn abort_all(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
        self.tasks.clear();
    }
}

impl Drop for TaskSlots {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn spawning_into_a_slot_aborts_the_previous_task() {
        let mut slots = TaskSlots::new();
        let (tx, rx) = flume::unbounded();

        let first = tx.clone();
        slots.spawn("seek", async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let _ = first.send(1);
        });
        slots.spawn("seek", async move {
            let _ = tx.send(2);
        });

        assert_eq!(rx.recv_async().await.unwrap(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn abort_reports_running_tasks() {
        let mut slots = TaskSlots::new();
        slots.spawn("auth", std::future::pending());
        assert!(slots.is_running("auth"));
        assert!(slots.abort("auth"));
        assert!(!slots.abort("auth"));
        assert!(!slots.is_running("auth"));
    }
}
