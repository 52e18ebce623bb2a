use tokio::sync::watch;

/// Handle used to request cancellation of a running decode.
///
/// Cloning the handle shares the same underlying flag; any clone can abort.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Creates a fresh, not-yet-aborted handle.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Requests cancellation.
    ///
    /// The decoder notices at its next suspension point (awaiting the next
    /// chunk) and returns `StreamError::Cancelled`.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    /// Returns true once `abort` has been called.
    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Returns a signal to hand to a decode call.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of an `AbortHandle`.
#[derive(Clone, Debug)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// Returns true once the paired handle has aborted.
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the paired handle aborts.
    ///
    /// If every `AbortHandle` is dropped without aborting, this never
    /// resolves.
    pub async fn aborted(&mut self) {
        let fired = self.rx.wait_for(|aborted| *aborted).await.map(|_| ());
        if fired.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
