use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use rst_common::with_logging::log::{debug, warn};
use rst_common::with_tokio::tokio::sync::oneshot;
use rst_common::with_tokio::tokio::time;

use super::types::{
    CommandError, CommandHandle, ErrorCode, FromReply, Reply, ReplyPayload, Resolution,
};

type Outcome = Result<ReplyPayload, ErrorCode>;
type Completion = oneshot::Sender<Outcome>;

#[derive(Default)]
struct Table {
    next: u32,
    pending: HashMap<CommandHandle, Completion>,
}

impl Table {
    // zero is never handed out, and neither is a handle still waiting for its reply
    fn allocate(&mut self) -> CommandHandle {
        loop {
            let candidate = self.next;
            self.next = self.next.wrapping_add(1);

            if candidate == 0 {
                continue;
            }

            let handle = CommandHandle::from(candidate);
            if !self.pending.contains_key(&handle) {
                return handle;
            }
        }
    }
}

#[derive(Default)]
struct CommandTable {
    inner: Mutex<Table>,
}

impl CommandTable {
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn register(&self) -> (CommandHandle, oneshot::Receiver<Outcome>) {
        let (sender, receiver) = oneshot::channel();

        let mut table = self.lock();
        let handle = table.allocate();
        table.pending.insert(handle, sender);

        (handle, receiver)
    }

    fn take(&self, handle: CommandHandle) -> Option<Completion> {
        self.lock().pending.remove(&handle)
    }

    fn len(&self) -> usize {
        self.lock().pending.len()
    }
}

/// `Correlator` owns the table of outstanding commands
///
/// Every asynchronous operation registers a single-use completion here before
/// the command is forwarded to the engine. The engine resumes it later through
/// a [`Notifier`], and the completion is consumed by removing it from the table,
/// so a reply can never resolve the same command twice.
#[derive(Clone, Default)]
pub struct Correlator {
    table: Arc<CommandTable>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `notifier` builds the channel the engine uses to deliver its replies
    pub fn notifier(&self) -> Notifier {
        Notifier {
            table: self.table.clone(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    /// `submit` registers a new command and forwards it through `dispatch`
    ///
    /// When `dispatch` fails, the engine never accepted the command: its entry
    /// is removed again and the failure is returned right away.
    pub fn submit<T, F>(&self, dispatch: F) -> Result<PendingResult<T>, CommandError>
    where
        T: FromReply,
        F: FnOnce(CommandHandle) -> Result<(), ErrorCode>,
    {
        let (handle, receiver) = self.table.register();
        debug!("[command:submit] registered command: {handle}");

        if let Err(code) = dispatch(handle) {
            let _ = self.table.take(handle);
            debug!("[command:submit] command {handle} rejected by engine: {code}");
            return Err(CommandError::Submission(code));
        }

        Ok(PendingResult {
            handle,
            receiver,
            table: self.table.clone(),
            _output: PhantomData,
        })
    }

    /// `cancel` drops the completion of an outstanding command. Its caller
    /// observes [`CommandError::Canceled`] and any later reply is discarded
    pub fn cancel(&self, handle: CommandHandle) -> bool {
        let canceled = self.table.take(handle).is_some();
        if canceled {
            debug!("[command:cancel] command canceled: {handle}");
        }

        canceled
    }
}

/// `Notifier` is handed to the engine so it can resume pending commands
#[derive(Clone)]
pub struct Notifier {
    table: Arc<CommandTable>,
}

impl Notifier {
    pub fn notify(&self, reply: Reply) -> Resolution {
        let (handle, code, payload) = reply.into_parts();

        let Some(completion) = self.table.take(handle) else {
            warn!("[command:notify] protocol anomaly: no pending command for handle {handle}");
            return Resolution::Dropped;
        };

        let outcome = if code.is_success() {
            Ok(payload)
        } else {
            Err(code)
        };

        match completion.send(outcome) {
            Ok(_) => {
                debug!("[command:notify] command resolved: {handle} | code: {code}");
                Resolution::Resolved
            }
            Err(_) => {
                warn!("[command:notify] caller stopped waiting for command {handle}");
                Resolution::Abandoned
            }
        }
    }

    pub fn complete(&self, handle: CommandHandle, payload: ReplyPayload) -> Resolution {
        self.notify(Reply::success(handle, payload))
    }

    pub fn fail(&self, handle: CommandHandle, code: ErrorCode) -> Resolution {
        self.notify(Reply::failure(handle, code))
    }
}

/// `PendingResult` is returned immediately by a submission and resolves once
/// the engine replies
///
/// Awaiting it has no deadline. Use [`PendingResult::wait_timeout`] to bound
/// the wait.
pub struct PendingResult<T> {
    handle: CommandHandle,
    receiver: oneshot::Receiver<Outcome>,
    table: Arc<CommandTable>,
    _output: PhantomData<fn() -> T>,
}

impl<T: FromReply> PendingResult<T> {
    pub fn command_handle(&self) -> CommandHandle {
        self.handle
    }

    pub async fn wait_timeout(mut self, duration: Duration) -> Result<T, T::Error> {
        match time::timeout(duration, &mut self).await {
            Ok(result) => result,
            Err(_) => match self.table.take(self.handle) {
                Some(_) => {
                    warn!("[command:wait] command timed out: {}", self.handle);
                    Err(CommandError::Timeout(self.handle).into())
                }
                // the notifier already took the completion, its outcome is on the way
                None => (&mut self).await,
            },
        }
    }
}

impl<T: FromReply> Future for PendingResult<T> {
    type Output = Result<T, T::Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let handle = self.handle;

        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Ok(payload))) => Poll::Ready(T::from_reply(handle, payload)),
            Poll::Ready(Ok(Err(code))) => Poll::Ready(Err(CommandError::Engine(code).into())),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CommandError::Canceled(handle).into())),
        }
    }
}
