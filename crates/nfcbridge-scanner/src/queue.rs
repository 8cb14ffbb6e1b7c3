//! Pending tag commands, fed by the broker task and drained by the scan
//! loop one command per presented tag.

use crate::commands::TagCommand;
use nfcbridge_core::TagRecord;
use nfcbridge_mqtt::{ControlCommand, ControlHandler, WriteRequest};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Shared FIFO of commands awaiting a tag. Clones share the same queue;
/// the broker task holds one clone as producer, the scan loop another as
/// consumer. Nothing here survives a restart.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<TagCommand>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_write(&self, record: TagRecord, authenticate_password: Option<String>) {
        self.inner.lock().unwrap().push_back(TagCommand::Write {
            record,
            authenticate_password,
        });
    }

    pub fn enqueue_wipe(&self) {
        self.inner.lock().unwrap().push_back(TagCommand::Wipe);
    }

    /// Take the oldest pending command, if any.
    pub fn try_dequeue(&self) -> Option<TagCommand> {
        self.inner.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

/// Bridges parsed control messages into the command queue, filling in the
/// defaults a write request may omit.
#[derive(Debug, Clone)]
pub struct CommandEnqueuer {
    queue: CommandQueue,
    id_length: usize,
}

impl CommandEnqueuer {
    pub fn new(queue: CommandQueue, id_length: usize) -> Self {
        Self { queue, id_length }
    }

    fn record_from_request(&self, request: WriteRequest) -> TagRecord {
        // Generated only when the field is absent; an explicit id is kept
        // as given, blank included.
        let id = request.id.unwrap_or_else(|| generate_id(self.id_length));
        let mut record = TagRecord::new(id).with_valid_till(request.valid_till.unwrap_or(0));
        if let Some(data) = request.data {
            record = record.with_data(data);
        }
        record
    }
}

impl ControlHandler for CommandEnqueuer {
    fn handle(&self, command: ControlCommand) {
        match command {
            ControlCommand::Write(request) => {
                let password = request.authenticate_password.clone();
                let record = self.record_from_request(request);
                info!(id = %record.id, "write command queued");
                self.queue.enqueue_write(record, password);
            }
            ControlCommand::Wipe => {
                info!("wipe command queued");
                self.queue.enqueue_wipe();
            }
        }
    }
}

/// Random payload id: ASCII letters and digits.
fn generate_id(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
