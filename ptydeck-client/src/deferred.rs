use std::collections::BTreeMap;
use std::time::Instant;

/// Work the client runs once a deadline passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeferredTask {
    Fit { id: String },
    Submit { id: String, data: String },
}

impl DeferredTask {
    fn id(&self) -> &str {
        match self {
            Self::Fit { id } | Self::Submit { id, .. } => id,
        }
    }
}

/// Deadline-ordered queue; ties run in scheduling order.
#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    tasks: BTreeMap<(Instant, u64), DeferredTask>,
    next_seq: u64,
}

impl DeferredQueue {
    pub(crate) fn schedule(&mut self, deadline: Instant, task: DeferredTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert((deadline, seq), task);
    }

    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<DeferredTask> {
        let mut due = Vec::new();
        while let Some(entry) = self.tasks.first_entry() {
            if entry.key().0 > now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    pub(crate) fn cancel(&mut self, id: &str) {
        self.tasks.retain(|_, task| task.id() != id);
    }

    pub(crate) fn clear(&mut self) {
        self.tasks.clear();
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.tasks.keys().next().map(|(deadline, _)| *deadline)
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }
}
