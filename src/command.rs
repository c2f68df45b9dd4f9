//! Commands executed by a `CommandQueue`.
//!
//! A command captures its memory objects, its wait list and a fresh event
//! when it is built. `validate_memory` allocates every object on the
//! queue's device up front so capacity failures are reported to the caller
//! rather than through the event. Execution waits for the wait list, runs
//! the transfer and completes the event.

use std::fmt;
use std::sync::Arc;
use crate::device::{Device, DeviceMemory};
use crate::error::ClResult;
use crate::event::{self, Event};
use crate::memory::{MapEntry, Memory};
use crate::queue::CommandQueue;
use crate::util::{self, Rect};
use crate::{CommandExecutionStatus, CommandType, MapFlags, MemMigrationFlags, Status};


/// A raw host address handed to a transfer command.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HostPtr(pub *mut u8);

unsafe impl Send for HostPtr {}
unsafe impl Sync for HostPtr {}


/// What a command does.
pub(crate) enum CommandKind {
    /// Device to host.
    Read { mem: Arc<Memory>, rect: Rect, host: HostPtr, host_rect: Rect },
    /// Host to device. `covers_all` skips bringing the old contents over.
    Write { mem: Arc<Memory>, rect: Rect, host: HostPtr, host_rect: Rect, covers_all: bool },
    Copy { src: Arc<Memory>, src_rect: Rect, dst: Arc<Memory>, dst_rect: Rect },
    Fill { mem: Arc<Memory>, rect: Rect, pattern: Vec<u8> },
    Map { mem: Arc<Memory>, entry: MapEntry },
    Unmap { mem: Arc<Memory>, entry: MapEntry },
    Migrate { mems: Vec<Arc<Memory>>, flags: MemMigrationFlags },
    AcquireInterop { mems: Vec<Arc<Memory>> },
    ReleaseInterop { mems: Vec<Arc<Memory>> },
    Marker,
}

impl CommandKind {
    fn mems(&self) -> Vec<&Arc<Memory>> {
        match *self {
            CommandKind::Read { ref mem, .. } | CommandKind::Write { ref mem, .. }
                | CommandKind::Fill { ref mem, .. } | CommandKind::Map { ref mem, .. }
                | CommandKind::Unmap { ref mem, .. } => vec![mem],
            CommandKind::Copy { ref src, ref dst, .. } => vec![src, dst],
            CommandKind::Migrate { ref mems, .. } | CommandKind::AcquireInterop { ref mems }
                | CommandKind::ReleaseInterop { ref mems } => mems.iter().collect(),
            CommandKind::Marker => Vec::new(),
        }
    }
}


struct CommandData {
    command_type: CommandType,
    queue: CommandQueue,
    wait_list: Vec<Event>,
    event: Event,
    kind: CommandKind,
}


/// A command bound to a queue.
#[derive(Clone)]
pub(crate) struct Command(Arc<CommandData>);

impl Command {
    /// Builds a command, validating the wait list against the queue's
    /// context.
    pub fn new(queue: &CommandQueue, command_type: CommandType, wait_list: Option<&[Event]>,
            kind: CommandKind) -> ClResult<Command> {
        let wait_list = event::validate_wait_list(queue.context(), wait_list)?;
        let event = Event::new(queue.context(), command_type, Some(queue.id()));

        Ok(Command(Arc::new(CommandData {
            command_type,
            queue: queue.clone(),
            wait_list,
            event,
            kind,
        })))
    }

    /// Allocates every memory object of the command on the queue's device.
    pub fn validate_memory(&self) -> ClResult<()> {
        let device = self.0.queue.device();
        for mem in self.0.kind.mems() {
            device_memory(mem, device)?;
        }
        Ok(())
    }

    /// Submits the command to its queue.
    pub fn enqueue(&self) -> ClResult<()> {
        self.0.event.set_status(CommandExecutionStatus::Submitted);
        self.0.queue.submit(self.clone())
    }

    /// Blocks until the command has executed, returning its failure status.
    pub fn await_completion(&self) -> ClResult<()> {
        self.0.event.wait()
    }

    pub fn event(&self) -> Event {
        self.0.event.clone()
    }

    pub fn command_type(&self) -> CommandType {
        self.0.command_type
    }

    /// Runs the command on the queue's worker thread.
    pub(crate) fn execute(&self) {
        let data = &*self.0;

        if event::wait_for_events(&data.wait_list).is_err() {
            data.event.complete(Err(Status::CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST));
            return;
        }

        data.event.set_status(CommandExecutionStatus::Running);
        let result = self.run(data.queue.device());
        if let Err(status) = result {
            warn!("Command: {:?} on queue {} failed: {}.", data.command_type,
                data.queue.id(), status);
        }
        data.event.complete(result);
    }

    fn run(&self, device: &Device) -> ClResult<()> {
        match self.0.kind {
            CommandKind::Read { ref mem, ref rect, host, ref host_rect } => {
                mem.sync_for_device(device)?;
                let (dev_mem, base) = device_memory(mem, device)?;
                dev_mem.check_rect(base, rect)?;
                unsafe { util::copy_rect(dev_mem.as_ptr().add(base), rect, host.0, host_rect); }
            },
            CommandKind::Write { ref mem, ref rect, host, ref host_rect, covers_all } => {
                if covers_all {
                    mem.discard_for_device(device)?;
                } else {
                    mem.sync_for_device(device)?;
                }
                let (dev_mem, base) = device_memory(mem, device)?;
                dev_mem.check_rect(base, rect)?;
                unsafe { util::copy_rect(host.0, host_rect, dev_mem.as_ptr().add(base), rect); }
                mem.signal_write(device.id());
            },
            CommandKind::Copy { ref src, ref src_rect, ref dst, ref dst_rect } => {
                src.sync_for_device(device)?;
                dst.sync_for_device(device)?;
                let (src_mem, src_base) = device_memory(src, device)?;
                let (dst_mem, dst_base) = device_memory(dst, device)?;
                src_mem.check_rect(src_base, src_rect)?;
                dst_mem.check_rect(dst_base, dst_rect)?;
                unsafe {
                    util::copy_rect(src_mem.as_ptr().add(src_base), src_rect,
                        dst_mem.as_ptr().add(dst_base), dst_rect);
                }
                dst.signal_write(device.id());
            },
            CommandKind::Fill { ref mem, ref rect, ref pattern } => {
                mem.sync_for_device(device)?;
                let (dev_mem, base) = device_memory(mem, device)?;
                dev_mem.check_rect(base, rect)?;
                unsafe { util::fill_rect(dev_mem.as_ptr().add(base), rect, pattern); }
                mem.signal_write(device.id());
            },
            CommandKind::Map { ref mem, ref entry } => {
                mem.sync_for_device(device)?;
                if entry.needs_copy() && !entry.flags.contains(MapFlags::WRITE_INVALIDATE_REGION) {
                    entry.dev_mem.check_rect(entry.dev_base, &entry.rect)?;
                    unsafe {
                        util::copy_rect(entry.dev_mem.as_ptr().add(entry.dev_base), &entry.rect,
                            entry.target.ptr.as_ptr(), &entry.rect.rebased());
                    }
                }
            },
            CommandKind::Unmap { ref mem, ref entry } => {
                let result = unmap(mem, entry, device);
                if entry.target.staged && !entry.host_backed {
                    entry.dev_mem.release_map_target(&entry.target);
                }
                mem.dec_map_count();
                result?;
            },
            CommandKind::Migrate { ref mems, flags } => {
                let discard = flags.contains(MemMigrationFlags::OBJECT_CONTENT_UNDEFINED);
                for mem in mems {
                    if flags.contains(MemMigrationFlags::OBJECT_HOST) {
                        mem.reallocate(device, discard)?;
                    } else if discard {
                        mem.discard_for_device(device)?;
                    } else {
                        mem.sync_for_device(device)?;
                    }
                }
            },
            CommandKind::AcquireInterop { ref mems } => {
                for binding in mems.iter().filter_map(|m| m.interop()) {
                    binding.as_sync().copy_orig_to_shared();
                }
            },
            CommandKind::ReleaseInterop { ref mems } => {
                for binding in mems.iter().filter_map(|m| m.interop()) {
                    binding.as_sync().copy_shared_to_orig();
                }
            },
            CommandKind::Marker => (),
        }

        trace!("Command: {:?} executed on device {}.", self.0.command_type,
            device.id().as_usize());
        Ok(())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Command")
            .field("command_type", &self.0.command_type)
            .field("queue", &self.0.queue.id())
            .field("event", &self.0.event.id())
            .finish()
    }
}


fn device_memory(mem: &Memory, device: &Device) -> ClResult<(Arc<DeviceMemory>, usize)> {
    mem.get_device_memory(device, true)?.ok_or(Status::CL_MEM_OBJECT_ALLOCATION_FAILURE)
}

fn unmap(mem: &Memory, entry: &MapEntry, device: &Device) -> ClResult<()> {
    if !entry.flags.is_write() {
        return Ok(());
    }
    if entry.needs_copy() {
        entry.dev_mem.check_rect(entry.dev_base, &entry.rect)?;
        unsafe {
            util::copy_rect(entry.target.ptr.as_ptr(), &entry.rect.rebased(),
                entry.dev_mem.as_ptr().add(entry.dev_base), &entry.rect);
        }
    }
    mem.signal_write(device.id());
    Ok(())
}
