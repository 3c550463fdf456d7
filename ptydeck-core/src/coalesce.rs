/// Accumulates output chunks until a scheduled flush takes them.
///
/// At most one flush is pending at a time. [`take`](Self::take) swaps the
/// buffer out and clears the pending flag, so anything pushed afterwards
/// starts a fresh batch and schedules its own flush.
#[derive(Debug, Default, Clone)]
pub struct OutputCoalescer {
    buffer: String,
    flush_scheduled: bool,
}

impl OutputCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Returns true when the caller must schedule a flush.
    pub fn push(&mut self, chunk: &str) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.buffer.push_str(chunk);
        if self.flush_scheduled {
            false
        } else {
            self.flush_scheduled = true;
            true
        }
    }

    /// Drain the batch for a flush. `None` when nothing accumulated.
    pub fn take(&mut self) -> Option<String> {
        self.flush_scheduled = false;
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.flush_scheduled = false;
    }

    pub fn is_flush_scheduled(&self) -> bool {
        self.flush_scheduled
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn only_first_push_schedules_a_flush() {
        let mut coalescer = OutputCoalescer::new();
        assert!(coalescer.push("a"));
        assert!(!coalescer.push("b"));
        assert!(coalescer.is_flush_scheduled());
        assert_eq!(coalescer.take().as_deref(), Some("ab"));
        assert!(!coalescer.is_flush_scheduled());
        assert_eq!(coalescer.take(), None);
    }

    #[test]
    fn empty_chunks_never_schedule() {
        let mut coalescer = OutputCoalescer::new();
        assert!(!coalescer.push(""));
        assert!(!coalescer.is_flush_scheduled());
    }

    #[test]
    fn push_after_take_starts_new_batch() {
        let mut coalescer = OutputCoalescer::new();
        coalescer.push("first");
        let drained = coalescer.take();
        assert!(coalescer.push("second"));
        assert_eq!(drained.as_deref(), Some("first"));
        assert_eq!(coalescer.pending(), "second");
    }

    proptest! {
        #[test]
        fn flushed_batches_concatenate_to_input(
            steps in proptest::collection::vec((".{0,8}", any::<bool>()), 0..40)
        ) {
            let mut coalescer = OutputCoalescer::new();
            let mut expected = String::new();
            let mut flushed = String::new();
            let mut scheduled = 0usize;
            let mut taken = 0usize;

            for (chunk, flush) in &steps {
                expected.push_str(chunk);
                if coalescer.push(chunk) {
                    scheduled += 1;
                }
                if *flush && coalescer.is_flush_scheduled() {
                    taken += 1;
                    if let Some(batch) = coalescer.take() {
                        flushed.push_str(&batch);
                    }
                }
            }
            if coalescer.is_flush_scheduled() {
                taken += 1;
            }
            if let Some(rest) = coalescer.take() {
                flushed.push_str(&rest);
            }

            prop_assert_eq!(flushed, expected);
            prop_assert_eq!(scheduled, taken);
        }
    }
}
