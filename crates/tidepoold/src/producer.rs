//! Synthetic producers — random-sized work at a fixed cadence.

use std::sync::Arc;

use rand::Rng;
use tidepool_core::config::ProducerConfig;
use tidepool_pool::WorkQueue;
use tokio::sync::watch;
use tracing::{debug, info};

pub struct Producer {
    id: usize,
    config: ProducerConfig,
    queue: Arc<WorkQueue>,
}

impl Producer {
    pub fn new(id: usize, config: ProducerConfig, queue: Arc<WorkQueue>) -> Self {
        Self { id, config, queue }
    }

    /// Push one item of magnitude in `[0, max_work)`, idle, repeat.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        debug!(
            producer = self.id,
            idle_ms = self.config.idle_ms,
            max_work = self.config.max_work,
            "producer started"
        );

        let mut produced: u64 = 0;
        loop {
            let magnitude = rand::rng().random_range(0..self.config.max_work.max(1));
            self.queue.push(magnitude);
            produced += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.config.idle()) => {}
                _ = shutdown.changed() => {
                    info!(producer = self.id, produced, "producer stopped");
                    return produced;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn pushes_one_item_per_idle_period() {
        let queue = Arc::new(WorkQueue::new());
        let config = ProducerConfig {
            idle_ms: 10,
            max_work: 5,
        };
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(Producer::new(0, config, Arc::clone(&queue)).run(rx));

        tokio::time::sleep(Duration::from_millis(95)).await;
        tx.send(true).unwrap();
        let produced = task.await.unwrap();

        // t = 0, 10, ..., 90
        assert_eq!(produced, 10);
        assert_eq!(queue.len(), 10);
        while let Some(item) = queue.pop() {
            assert!(item.magnitude() < 5);
        }
    }
}
