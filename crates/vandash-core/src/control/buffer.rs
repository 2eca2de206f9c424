// Local edit buffer: Uninitialized until seeded from the first successful
// server read, then owned by local edits only.

use tokio::sync::watch;

#[derive(Debug)]
pub struct EditBuffer<S> {
    state: watch::Sender<Option<S>>,
}

impl<S> Default for EditBuffer<S> {
    fn default() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }
}

impl<S: Clone> EditBuffer<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Seed with server values. Only the first call has any effect.
    pub fn seed(&self, initial: S) -> bool {
        self.state.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(initial);
            true
        })
    }

    /// Apply a local edit and return the new snapshot, or `None` while the
    /// buffer is still uninitialized.
    pub fn edit(&self, f: impl FnOnce(&mut S)) -> Option<S> {
        let mut snapshot = None;
        self.state.send_if_modified(|slot| match slot {
            Some(value) => {
                f(value);
                snapshot = Some(value.clone());
                true
            }
            None => false,
        });
        snapshot
    }

    pub fn snapshot(&self) -> Option<S> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<S>> {
        self.state.subscribe()
    }
}
