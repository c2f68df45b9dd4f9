//! An in-order command queue.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use crossbeam::channel::{self, Sender};
use crate::command::{Command, CommandKind};
use crate::context::Context;
use crate::device::{Device, VirtualDevice};
use crate::error::ClResult;
use crate::{CommandType, Status};

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);


struct QueueInner {
    id: u64,
    context: Context,
    device: Device,
    sender: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl Drop for QueueInner {
    fn drop(&mut self) {
        // Disconnecting the channel ends the worker loop once it drains.
        self.sender.take();

        if let Some(worker) = self.worker.take() {
            // The last handle can be released by a command on the worker
            // itself, which must not join its own thread.
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                error!("CommandQueue {}: worker thread panicked.", self.id);
            }
        }
        debug!("CommandQueue {}: destroyed.", self.id);
    }
}


/// A command queue.
///
/// Commands execute one at a time, in submission order, on a worker thread
/// owned by the queue. Dropping the last handle waits for every submitted
/// command to finish.
#[derive(Clone)]
pub struct CommandQueue(Arc<QueueInner>);

impl CommandQueue {
    /// Creates a queue executing on `device`, which must belong to `context`.
    pub(crate) fn new(context: &Context, device: &Device) -> ClResult<CommandQueue> {
        if !context.contains_device(device) {
            return Err(Status::CL_INVALID_DEVICE);
        }

        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = channel::unbounded::<Command>();

        let worker = thread::Builder::new()
            .name(format!("ocl-runtime-queue-{}", id))
            .spawn(move || {
                for command in receiver.iter() {
                    command.execute();
                }
            })
            .map_err(|_| Status::CL_OUT_OF_RESOURCES)?;

        debug!("CommandQueue {}: created on device {}.", id, device.id().as_usize());

        Ok(CommandQueue(Arc::new(QueueInner {
            id,
            context: context.clone(),
            device: device.clone(),
            sender: Some(sender),
            worker: Some(worker),
        })))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn context(&self) -> &Context {
        &self.0.context
    }

    pub fn device(&self) -> &Device {
        &self.0.device
    }

    /// The execution context recorded on persistently mapped objects.
    pub fn virtual_device(&self) -> VirtualDevice {
        VirtualDevice { queue: self.0.id, device: self.0.device.id() }
    }

    pub(crate) fn submit(&self, command: Command) -> ClResult<()> {
        let sender = self.0.sender.as_ref().ok_or(Status::CL_INVALID_COMMAND_QUEUE)?;
        trace!("CommandQueue {}: submitting {:?}.", self.0.id, command.command_type());
        sender.send(command).map_err(|_| Status::CL_INVALID_COMMAND_QUEUE)
    }

    /// Commands are handed to the worker as they are enqueued, so there is
    /// nothing to flush.
    pub fn flush(&self) -> ClResult<()> {
        Ok(())
    }

    /// Blocks until every command enqueued so far has finished.
    ///
    /// Failures of individual commands are reported through their events,
    /// not here.
    pub fn finish(&self) -> ClResult<()> {
        let marker = Command::new(self, CommandType::Marker, None, CommandKind::Marker)?;
        marker.enqueue()?;
        marker.await_completion()
    }
}

impl PartialEq for CommandQueue {
    fn eq(&self, other: &CommandQueue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for CommandQueue {}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CommandQueue")
            .field("id", &self.0.id)
            .field("context", &self.0.context.id())
            .field("device", &self.0.device)
            .finish()
    }
}
