//! Events.
//!
//! An event tracks one command (or a user-controlled condition) from
//! submission to completion. Terminal states are `Complete` and an error
//! status; both wake every waiter and run the registered callbacks once.

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::{Condvar, Mutex};
use crate::context::Context;
use crate::error::ClResult;
use crate::{CommandExecutionStatus, CommandType, Status};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

type EventCallback = Box<dyn FnOnce(ClResult<()>) + Send>;


struct EventState {
    status: Result<CommandExecutionStatus, Status>,
    callbacks: Vec<EventCallback>,
}

impl EventState {
    fn is_terminal(&self) -> bool {
        match self.status {
            Ok(CommandExecutionStatus::Complete) | Err(_) => true,
            Ok(_) => false,
        }
    }

    fn result(&self) -> ClResult<()> {
        self.status.map(|_| ())
    }
}


struct EventInner {
    id: u64,
    context: Context,
    command_type: CommandType,
    queue_id: Option<u64>,
    state: Mutex<EventState>,
    cond: Condvar,
}


/// An event.
#[derive(Clone)]
pub struct Event(Arc<EventInner>);

impl Event {
    pub(crate) fn new(context: &Context, command_type: CommandType, queue_id: Option<u64>)
            -> Event {
        let status = match command_type {
            CommandType::User => CommandExecutionStatus::Submitted,
            _ => CommandExecutionStatus::Queued,
        };

        Event(Arc::new(EventInner {
            id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
            context: context.clone(),
            command_type,
            queue_id,
            state: Mutex::new(EventState { status: Ok(status), callbacks: Vec::new() }),
            cond: Condvar::new(),
        }))
    }

    /// Creates a user event, completed through `set_user_status`.
    pub(crate) fn user(context: &Context) -> Event {
        Event::new(context, CommandType::User, None)
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn context(&self) -> &Context {
        &self.0.context
    }

    pub fn command_type(&self) -> CommandType {
        self.0.command_type
    }

    pub fn queue_id(&self) -> Option<u64> {
        self.0.queue_id
    }

    /// Current execution status, or the error status of a failed command.
    pub fn status(&self) -> Result<CommandExecutionStatus, Status> {
        self.0.state.lock().status
    }

    /// Returns true once the event completed or failed.
    pub fn is_complete(&self) -> bool {
        self.0.state.lock().is_terminal()
    }

    /// Advances a pending event to a non-terminal status.
    pub(crate) fn set_status(&self, status: CommandExecutionStatus) {
        let mut state = self.0.state.lock();
        if !state.is_terminal() {
            state.status = Ok(status);
        }
    }

    /// Moves the event to its terminal state, waking waiters and running
    /// callbacks. Later calls are ignored.
    pub(crate) fn complete(&self, result: ClResult<()>) {
        let callbacks = {
            let mut state = self.0.state.lock();
            if state.is_terminal() {
                return;
            }
            state.status = result.map(|_| CommandExecutionStatus::Complete);
            mem::replace(&mut state.callbacks, Vec::new())
        };
        self.0.cond.notify_all();

        #[cfg(feature = "event_debug_print")]
        println!("Event::complete: event {} ({:?}) finished with {:?}.", self.0.id,
            self.0.command_type, result);

        trace!("Event {}: {:?} finished ({:?}).", self.0.id, self.0.command_type, result);
        for callback in callbacks {
            callback(result);
        }
    }

    /// Blocks until the event completes. Returns the error status of a
    /// failed command.
    pub fn wait(&self) -> ClResult<()> {
        let mut state = self.0.state.lock();
        while !state.is_terminal() {
            self.0.cond.wait(&mut state);
        }
        state.result()
    }

    /// Registers a callback run once when the event completes, immediately
    /// if it already has.
    pub fn set_callback<F>(&self, callback: F)
            where F: FnOnce(ClResult<()>) + Send + 'static {
        let result = {
            let mut state = self.0.state.lock();
            if !state.is_terminal() {
                state.callbacks.push(Box::new(callback));
                return;
            }
            state.result()
        };
        callback(result);
    }

    /// Completes a user event with `result`.
    pub(crate) fn set_user_status(&self, result: ClResult<()>) -> ClResult<()> {
        if self.0.command_type != CommandType::User {
            return Err(Status::CL_INVALID_EVENT);
        }
        if self.is_complete() {
            return Err(Status::CL_INVALID_OPERATION);
        }
        self.complete(result);
        Ok(())
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Event) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Event {}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.0.id)
            .field("command_type", &self.0.command_type)
            .field("status", &self.status())
            .finish()
    }
}


/// Checks a wait list and returns its events.
///
/// `Some` with no events is `CL_INVALID_EVENT_WAIT_LIST`; an event from
/// another context is `CL_INVALID_CONTEXT`.
pub(crate) fn validate_wait_list(context: &Context, wait_list: Option<&[Event]>)
        -> ClResult<Vec<Event>> {
    match wait_list {
        None => Ok(Vec::new()),
        Some(events) if events.is_empty() => Err(Status::CL_INVALID_EVENT_WAIT_LIST),
        Some(events) => {
            if events.iter().any(|e| e.context() != context) {
                return Err(Status::CL_INVALID_CONTEXT);
            }
            Ok(events.to_vec())
        },
    }
}

/// Blocks until every event completes.
///
/// Fails with `CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST` if any of them
/// failed.
pub(crate) fn wait_for_events(events: &[Event]) -> ClResult<()> {
    let mut failed = false;
    for event in events {
        failed |= event.wait().is_err();
    }
    if failed {
        Err(Status::CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST)
    } else {
        Ok(())
    }
}
