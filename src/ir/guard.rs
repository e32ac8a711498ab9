//! Traversal guard for the structural encoder.
//!
//! Serde walks a node tree by plain recursion, so a reference cycle would
//! recurse until the stack overflows and a very deep tree would do the same.
//! Child links that can recurse are routed through this module: [`Shared`]
//! handles and fields tagged `#[serde(serialize_with = "guard::nested")]`.
//! Each guarded edge is counted against the depth limit of the running
//! encode, and shared handles are additionally checked against the chain of
//! shared nodes currently open, which is how cycles are detected.
//!
//! A shared node whose write guard is held by the encoding thread cannot be
//! read without deadlocking, so reaching one fails with
//! [`EncodingError::Locked`]. This is what happens when a cyclic node is
//! encoded through its own [`Shared::write`] guard.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::EncodingError;

/// Default limit on guarded edges between the root and the deepest node.
///
/// Kept below serde_json's 128-level recursion limit on parsing, so an
/// expression tree that encodes with the defaults also decodes again.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Why the guard stopped a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trip {
    Cycle { depth: usize },
    TooDeep { limit: usize },
    Locked { depth: usize },
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trip::Cycle { depth } => write!(f, "cycle detected at depth {}", depth),
            Trip::TooDeep { limit } => write!(f, "depth limit of {} exceeded", limit),
            Trip::Locked { depth } => write!(f, "shared node at depth {} is write-locked by this thread", depth),
        }
    }
}

impl From<Trip> for EncodingError {
    fn from(trip: Trip) -> Self {
        match trip {
            Trip::Cycle { depth } => EncodingError::Cycle { depth },
            Trip::TooDeep { limit } => EncodingError::DepthExceeded { limit },
            Trip::Locked { depth } => EncodingError::Locked { depth },
        }
    }
}

struct Traversal {
    depth: usize,
    max_depth: usize,
    /// Addresses of the shared nodes between the root and the current node.
    open_shared: Vec<usize>,
    trip: Option<Trip>,
}

impl Traversal {
    fn with_limit(max_depth: usize) -> Self {
        Traversal {
            depth: 0,
            max_depth,
            open_shared: Vec::new(),
            trip: None,
        }
    }
}

thread_local! {
    static TRAVERSAL: RefCell<Traversal> = RefCell::new(Traversal::with_limit(DEFAULT_MAX_DEPTH));
    /// Addresses of the shared nodes this thread holds a write guard on.
    static WRITE_HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

fn held_for_write(addr: usize) -> bool {
    WRITE_HELD.with(|held| held.borrow().contains(&addr))
}

/// Records `trip` as the reason the running traversal stopped.
fn record(trip: Trip) -> Trip {
    debug!("Traversal guard tripped: {}", trip);
    TRAVERSAL.with(|t| t.borrow_mut().trip = Some(trip));
    trip
}

/// Runs `f` under a fresh traversal state limited to `max_depth` guarded edges.
///
/// Returns the result of `f` together with the trip that aborted it, if any.
/// The enclosing state is restored afterwards, also on unwind, so encodes
/// may nest.
pub(crate) fn scoped<R>(max_depth: usize, f: impl FnOnce() -> R) -> (R, Option<Trip>) {
    let previous = TRAVERSAL.with(|t| t.replace(Traversal::with_limit(max_depth)));
    let _restore = scopeguard::guard(previous, |previous| {
        TRAVERSAL.with(|t| {
            t.replace(previous);
        });
    });
    let result = f();
    let trip = TRAVERSAL.with(|t| t.borrow().trip);
    (result, trip)
}

/// An open guarded edge; closing it happens on drop.
struct Edge {
    shared: bool,
}

impl Edge {
    fn open(shared_addr: Option<usize>) -> Result<Edge, Trip> {
        TRAVERSAL.with(|t| {
            let mut t = t.borrow_mut();
            let trip = if shared_addr.is_some_and(|addr| t.open_shared.contains(&addr)) {
                Some(Trip::Cycle { depth: t.depth + 1 })
            } else if t.depth >= t.max_depth {
                Some(Trip::TooDeep { limit: t.max_depth })
            } else {
                None
            };
            if let Some(trip) = trip {
                drop(t);
                return Err(record(trip));
            }
            t.depth += 1;
            if let Some(addr) = shared_addr {
                t.open_shared.push(addr);
            }
            Ok(Edge { shared: shared_addr.is_some() })
        })
    }
}

impl Drop for Edge {
    fn drop(&mut self) {
        TRAVERSAL.with(|t| {
            let mut t = t.borrow_mut();
            t.depth = t.depth.saturating_sub(1);
            if self.shared {
                t.open_shared.pop();
            }
        });
    }
}

/// Serde helper for owned child links (`Box<Expr>`, `Vec<Node>` ...).
///
/// Counts the edge against the depth limit, then serializes the child as is.
pub fn nested<S, T>(child: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let _edge = Edge::open(None).map_err(S::Error::custom)?;
    child.serialize(serializer)
}

/// A child that may be referenced from several parents and mutated in place.
///
/// Serializes as the wrapped value. Sharing is invisible in the text: a node
/// reachable twice is written twice. A handle that leads back to one of its
/// own ancestors makes the encode fail with [`EncodingError::Cycle`].
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Shared(Arc::new(RwLock::new(value)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    /// Locks the node for writing.
    ///
    /// While the guard is alive, encoding anything that reaches this node on
    /// the same thread fails with [`EncodingError::Locked`] instead of
    /// blocking.
    pub fn write(&self) -> SharedWriteGuard<'_, T> {
        let guard = self.0.write();
        let addr = self.addr();
        WRITE_HELD.with(|held| held.borrow_mut().push(addr));
        SharedWriteGuard { guard, addr }
    }

    /// True if both handles point at the same node.
    pub fn ptr_eq(&self, other: &Shared<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

/// Write access to a [`Shared`] node, registered with the traversal guard.
pub struct SharedWriteGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    addr: usize,
}

impl<T> Deref for SharedWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for SharedWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for SharedWriteGuard<'_, T> {
    fn drop(&mut self) {
        WRITE_HELD.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|&addr| addr == self.addr) {
                held.swap_remove(pos);
            }
        });
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(Arc::clone(&self.0))
    }
}

// Printing the pointee could recurse forever on a cycle.
impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&Arc::as_ptr(&self.0)).finish()
    }
}

impl<T: Serialize> Serialize for Shared<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let addr = self.addr();
        let _edge = Edge::open(Some(addr)).map_err(S::Error::custom)?;
        let value = match self.0.try_read_recursive() {
            Some(value) => value,
            None if held_for_write(addr) => {
                let depth = TRAVERSAL.with(|t| t.borrow().depth);
                return Err(S::Error::custom(record(Trip::Locked { depth })));
            }
            // Another thread is writing; wait for it.
            None => self.0.read_recursive(),
        };
        value.serialize(serializer)
    }
}
