use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter shared by everyone issuing layout requests for one diagram. Each
/// request takes a ticket; a ticket stops being current once a newer one exists,
/// which lets the caller drop results of hierarchical runs that finished late.
#[derive(Debug, Clone, Default)]
pub struct LayoutGeneration {
    latest: Arc<AtomicU64>,
}

#[derive(Debug, Clone)]
pub struct LayoutTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl LayoutGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> LayoutTicket {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        LayoutTicket {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }
}

impl LayoutTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let generation = LayoutGeneration::new();
        let first = generation.begin();
        assert!(first.is_current());
        let second = generation.clone().begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(second.generation(), first.generation() + 1);
    }
}
