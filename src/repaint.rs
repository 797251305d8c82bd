//! Coalesced redraw signaling from engine threads to the host.
//!
//! The engine's update callback may fire from any of its internal threads,
//! arbitrarily often, including while the host is mid-paint. The contract on
//! that callback is: bounded time, no engine or GPU calls, coalesce. This
//! module implements it as one atomic flag; repeat notifications before the
//! host drains collapse into a single pending repaint, so the queue can never
//! grow.
//!
//! Hosts pick whichever delivery style their toolkit wants:
//! - poll `take_pending` from the event loop,
//! - `subscribe` and select on the bounded channel,
//! - `set_waker` to post into the toolkit's own event queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

type Waker = Box<dyn Fn() + Send + Sync>;

struct Shared {
  pending: AtomicBool,
  subscriber: Mutex<Option<Sender<()>>>,
  waker: Mutex<Option<Waker>>,
}

/// The repaint flag shared between the engine's update callback and the host.
///
/// Clones share state; the surface keeps one clone wired into the engine
/// callback and hands the host another through `PlaybackSurface::repaint`.
#[derive(Clone)]
pub struct RepaintSignal {
  shared: Arc<Shared>,
}

impl RepaintSignal {
  pub(crate) fn new() -> Self {
    Self {
      shared: Arc::new(Shared {
        pending: AtomicBool::new(false),
        subscriber: Mutex::new(None),
        waker: Mutex::new(None),
      }),
    }
  }

  /// Mark a repaint as wanted. Safe from any thread.
  ///
  /// Only the empty-to-pending edge wakes the host; notifications while a
  /// repaint is already pending are absorbed by the flag.
  pub fn notify(&self) {
    if !self.shared.pending.swap(true, Ordering::AcqRel) {
      if let Some(tx) = self.shared.subscriber.lock().as_ref() {
        // bounded(1): a full queue means a wake is already in flight
        let _ = tx.try_send(());
      }
      if let Some(waker) = self.shared.waker.lock().as_ref() {
        waker();
      }
    }
  }

  /// Consume the pending flag. Returns true if a repaint was wanted since
  /// the last call.
  pub fn take_pending(&self) -> bool {
    self.shared.pending.swap(false, Ordering::AcqRel)
  }

  /// Peek at the pending flag without consuming it.
  pub fn is_pending(&self) -> bool {
    self.shared.pending.load(Ordering::Acquire)
  }

  /// Get a bounded channel that receives at most one message per pending
  /// repaint. Replaces any previous subscription.
  pub fn subscribe(&self) -> Receiver<()> {
    let (tx, rx) = bounded(1);
    *self.shared.subscriber.lock() = Some(tx);
    rx
  }

  /// Install a closure invoked on the empty-to-pending edge, from whichever
  /// thread notified. Meant for posting a repaint request into the host
  /// toolkit's event queue. Replaces any previous waker.
  pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
    *self.shared.waker.lock() = Some(Box::new(waker));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize;
  use std::thread;

  #[test]
  fn test_notifications_coalesce() {
    let signal = RepaintSignal::new();
    for _ in 0..100 {
      signal.notify();
    }
    assert!(signal.take_pending());
    assert!(!signal.take_pending());
  }

  #[test]
  fn test_subscription_is_bounded() {
    let signal = RepaintSignal::new();
    let rx = signal.subscribe();
    for _ in 0..100 {
      signal.notify();
    }
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn test_waker_fires_once_per_edge() {
    let signal = RepaintSignal::new();
    let wakes = Arc::new(AtomicUsize::new(0));
    let counter = wakes.clone();
    signal.set_waker(move || {
      counter.fetch_add(1, Ordering::SeqCst);
    });

    signal.notify();
    signal.notify();
    signal.notify();
    assert_eq!(wakes.load(Ordering::SeqCst), 1);

    assert!(signal.take_pending());
    signal.notify();
    assert_eq!(wakes.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn test_cross_thread_notify() {
    let signal = RepaintSignal::new();
    let mut handles = Vec::new();
    for _ in 0..8 {
      let signal = signal.clone();
      handles.push(thread::spawn(move || {
        for _ in 0..1000 {
          signal.notify();
        }
      }));
    }
    for handle in handles {
      handle.join().unwrap();
    }
    assert!(signal.take_pending());
    assert!(!signal.is_pending());
  }
}
