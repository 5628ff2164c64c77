//! First-settled combinator and a once-only navigation guard.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::future::{select_all, BoxFuture};

/// Await the first of `operations` to settle and drop the rest.
///
/// Returns the winning output and its index. Losers are dropped, which cancels them.
///
/// # Panics
///
/// Panics if `operations` is empty.
pub async fn first_settled<T>(operations: Vec<BoxFuture<'_, T>>) -> (T, usize) {
    let (output, index, _losers) = select_all(operations).await;
    (output, index)
}

/// Something that can move the client to a new URL, replacing the current history entry.
pub trait Navigator: Send + Sync {
    fn replace(&self, url: &str);
}

/// Lets exactly one navigation through, however many outcomes arrive.
pub struct NavigationGuard<N> {
    navigator: N,
    fired: AtomicBool,
    attempts: AtomicUsize,
}

impl<N: Navigator> NavigationGuard<N> {
    pub fn new(navigator: N) -> Self {
        Self {
            navigator,
            fired: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Navigate if nothing has navigated yet. Returns whether this call won.
    pub fn replace(&self, url: &str) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.navigator.replace(url);
        true
    }

    pub fn has_navigated(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Number of navigation attempts, including the ignored ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }
}
