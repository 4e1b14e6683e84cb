use tracing::warn;

/// Where the one-shot geometry load currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Open,
    Failed(String),
}

/// Holds region-dependent work until geometry has loaded.
///
/// Key properties:
/// - While pending, submitted work is queued in FIFO order.
/// - Opening the gate hands the queue back exactly once, in submission order.
/// - After a failure the gate stays closed for good; queued and later work is dropped.
#[derive(Debug)]
pub struct LoadGate<T> {
    state: GateState,
    queued: Vec<T>,
}

impl<T> Default for LoadGate<T> {
    fn default() -> Self {
        Self {
            state: GateState::Pending,
            queued: Vec::new(),
        }
    }
}

impl<T> LoadGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == GateState::Open
    }

    pub fn is_pending(&self) -> bool {
        self.state == GateState::Pending
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            GateState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Returns the work back when it may run immediately.
    pub fn submit(&mut self, work: T) -> Option<T> {
        match self.state {
            GateState::Open => Some(work),
            GateState::Pending => {
                self.queued.push(work);
                None
            }
            GateState::Failed(_) => {
                warn!("geometry failed to load; dropping deferred work");
                None
            }
        }
    }

    /// Opens a pending gate and returns the queued work in submission order.
    ///
    /// Opening twice, or opening a failed gate, returns nothing.
    pub fn open(&mut self) -> Vec<T> {
        if !self.is_pending() {
            return Vec::new();
        }
        self.state = GateState::Open;
        std::mem::take(&mut self.queued)
    }

    /// Marks a pending load as failed. Returns the number of dropped items.
    pub fn fail(&mut self, reason: impl Into<String>) -> usize {
        if !self.is_pending() {
            return 0;
        }
        self.state = GateState::Failed(reason.into());
        let dropped = self.queued.len();
        self.queued.clear();
        dropped
    }
}
