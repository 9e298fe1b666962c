//! FIFO task queue shared by the pool's workers.
//!
//! Backed by an unbounded crossbeam channel: every host is received by
//! exactly one worker. Once [`TaskQueue::close`] has run, a dequeue on an
//! empty queue returns immediately instead of waiting out its timeout.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::error::QueueError;
use crate::types::Host;

#[derive(Debug)]
pub struct TaskQueue {
    sender: Option<Sender<Host>>,
    receiver: Receiver<Host>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender: Some(sender),
            receiver,
        }
    }

    /// Build a sealed queue holding `hosts` in order.
    pub fn from_hosts(hosts: impl IntoIterator<Item = Host>) -> Result<Self, QueueError> {
        let mut queue = Self::new();
        for host in hosts {
            queue.enqueue(host)?;
        }
        queue.close();
        Ok(queue)
    }

    /// Append a host to the tail.
    ///
    /// Hosts with an empty required field never enter the queue.
    pub fn enqueue(&self, host: Host) -> Result<(), QueueError> {
        if let Some(field) = host.missing_field() {
            return Err(QueueError::InvalidHost {
                hostname: host.hostname,
                field,
            });
        }
        match &self.sender {
            Some(sender) => sender.send(host).map_err(|e| QueueError::Closed {
                hostname: e.into_inner().hostname,
            }),
            None => Err(QueueError::Closed {
                hostname: host.hostname,
            }),
        }
    }

    /// Seal the queue; further enqueues fail.
    pub fn close(&mut self) {
        self.sender = None;
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }

    /// Remove and return the head, waiting at most `timeout`.
    ///
    /// `None` means empty (or timed out); it is the only signal a worker
    /// may exit on.
    pub fn dequeue(&self, timeout: Duration) -> Option<Host> {
        match self.receiver.recv_timeout(timeout) {
            Ok(host) => Some(host),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Advisory: a concurrent dequeue may change the answer immediately.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Remove every pending host without delivering it to a worker.
    pub fn drain(&self) -> Vec<Host> {
        self.receiver.try_iter().collect()
    }
}
