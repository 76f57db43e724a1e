//! Identifier-affinity lanes.
//!
//! Each lane is a worker task draining its own bounded queue. An order is
//! always routed to the lane picked by hashing its identifier, so one
//! identifier never has two writes in flight.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info_span, warn, Instrument};

use super::{acknowledge, ConsumerStats, OrderConsumer};
use crate::order::{CachedOrder, Order};
use crate::stream::Acknowledge;

/// A decoded order queued for persistence.
pub(super) struct LaneJob {
    pub order: Order,
    pub cached: CachedOrder,
    /// Original payload, kept for dead letters.
    pub payload: Vec<u8>,
    pub ack: Option<Box<dyn Acknowledge>>,
}

/// Lane index for an identifier.
pub(super) fn lane_index(order_uid: &str, lanes: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    order_uid.hash(&mut hasher);
    (hasher.finish() % lanes as u64) as usize
}

pub(super) struct Lanes {
    consumer: OrderConsumer,
    senders: Vec<mpsc::Sender<LaneJob>>,
    workers: Vec<JoinHandle<ConsumerStats>>,
}

impl Lanes {
    /// Start `count` lane workers, each with a queue of `capacity` jobs.
    ///
    /// Zero values are raised to one.
    pub fn spawn(consumer: &OrderConsumer, count: usize, capacity: usize) -> Self {
        let count = count.max(1);
        let capacity = capacity.max(1);

        let mut senders = Vec::with_capacity(count);
        let mut workers = Vec::with_capacity(count);

        for index in 0..count {
            let (sender, receiver) = mpsc::channel(capacity);
            let worker = run_lane(consumer.clone(), receiver).instrument(info_span!("lane", index));
            senders.push(sender);
            workers.push(tokio::spawn(worker));
        }

        Self {
            consumer: consumer.clone(),
            senders,
            workers,
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Queue a job on its identifier's lane, waiting while the lane is full.
    ///
    /// If the lane worker is gone the job is processed inline.
    pub async fn dispatch(&self, job: LaneJob, stats: &mut ConsumerStats) {
        let index = lane_index(&job.order.order_uid, self.senders.len());
        debug!(order_uid = %job.order.order_uid, lane = index, "Dispatching order");

        if let Err(mpsc::error::SendError(job)) = self.senders[index].send(job).await {
            warn!(lane = index, "Lane closed, processing inline");
            process(&self.consumer, job, stats).await;
        }
    }

    /// Close every lane and wait for queued work to finish.
    pub async fn shutdown(self) -> ConsumerStats {
        drop(self.senders);

        let mut stats = ConsumerStats::default();
        for worker in self.workers {
            match worker.await {
                Ok(lane_stats) => stats.merge(lane_stats),
                Err(e) => error!(error = %e, "Lane worker failed"),
            }
        }
        stats
    }
}

async fn process(consumer: &OrderConsumer, job: LaneJob, stats: &mut ConsumerStats) {
    let result = consumer.persist(job.order, job.cached).await;
    let settled = consumer.settle(result, &job.payload, stats).await;
    acknowledge(job.ack, settled).await;
}

async fn run_lane(consumer: OrderConsumer, mut receiver: mpsc::Receiver<LaneJob>) -> ConsumerStats {
    let mut stats = ConsumerStats::default();

    while let Some(job) = receiver.recv().await {
        process(&consumer, job, &mut stats).await;
    }

    debug!(
        persisted = stats.persisted,
        duplicates = stats.duplicates,
        failed = stats.failed,
        "Lane drained"
    );
    stats
}
