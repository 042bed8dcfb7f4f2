//! Deadline race for engine calls that cannot be cancelled.
//!
//! The operation runs on its own task. Losing the race only stops us from
//! waiting: the task is detached and keeps running. Whichever side claims
//! the race first decides it; a value produced after the deadline claimed
//! it goes to the `on_late` hook and never reaches the caller.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::task::JoinError;

const PENDING: u8 = 0;
const SETTLED: u8 = 1;
const EXPIRED: u8 = 2;

/// How a deadline race was decided.
#[derive(Debug, PartialEq, Eq)]
pub enum Race<T> {
    /// The operation finished before the deadline.
    Settled(T),
    /// The operation's task died (panic or runtime shutdown).
    Faulted(String),
    /// The deadline fired first.
    Expired,
}

/// Race `operation` against `deadline`. When both are ready at once the
/// operation wins.
///
/// If the deadline wins, the operation's eventual value is handed to
/// `on_late` on the detached task.
pub async fn race_deadline<F, L, C>(operation: F, deadline: Duration, on_late: L) -> Race<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
    L: FnOnce(F::Output) -> C + Send + 'static,
    C: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AtomicU8::new(PENDING));
    let claim = Arc::clone(&state);
    let mut handle = tokio::spawn(async move {
        let value = operation.await;
        if claim
            .compare_exchange(PENDING, SETTLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return Some(value);
        }
        tracing::debug!("operation settled after the deadline; handing result to late hook");
        on_late(value).await;
        None
    });

    tokio::select! {
        biased;
        joined = &mut handle => settle(joined),
        () = tokio::time::sleep(deadline) => {
            if state
                .compare_exchange(PENDING, EXPIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                Race::Expired
            } else {
                // the operation claimed first; its value is already on the way
                settle(handle.await)
            }
        }
    }
}

fn settle<T>(joined: Result<Option<T>, JoinError>) -> Race<T> {
    match joined {
        Ok(Some(value)) => Race::Settled(value),
        Ok(None) => Race::Expired,
        Err(e) => Race::Faulted(join_error_message(e)),
    }
}

/// Run `operation` on its own task so a panicking engine cannot unwind
/// into the caller. Task failures come back as a message.
pub async fn isolated<F>(operation: F) -> Result<F::Output, String>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(operation).await.map_err(join_error_message)
}

fn join_error_message(e: JoinError) -> String {
    if e.is_panic() {
        format!("engine task panicked: {}", panic_message(e.into_panic()))
    } else {
        "engine task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
