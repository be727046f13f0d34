//! Per-format sequence allocation
//!
//! Each format owns one counter. Reserving a block takes that format's
//! lock only, so allocations for different formats never contend, and the
//! lock is released before any code is minted or stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use wellplated_core::{
    BoundaryKey, OverflowError, StorageError, ValidationError, WellplatedConfig, WellplatedError,
    WellplatedResult,
};

/// A contiguous run of reserved sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceBlock {
    start: u64,
    count: u64,
}

impl SequenceBlock {
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Last sequence in the block, inclusive.
    pub fn last(&self) -> u64 {
        self.start + self.count - 1
    }

    pub fn contains(&self, sequence: u64) -> bool {
        (self.start..=self.last()).contains(&sequence)
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u64> {
        self.start..=self.last()
    }
}

impl IntoIterator for SequenceBlock {
    type Item = u64;
    type IntoIter = std::ops::RangeInclusive<u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Hands out unique, increasing internal sequence numbers per format.
#[derive(Debug)]
pub struct SequenceAllocator {
    counters: RwLock<HashMap<BoundaryKey, Arc<Mutex<u64>>>>,
    first_sequence: u64,
    max_batch_size: u64,
}

impl SequenceAllocator {
    pub fn new(config: &WellplatedConfig) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            first_sequence: config.first_sequence,
            max_batch_size: config.max_batch_size,
        }
    }

    /// Whether a counter exists for this format yet.
    pub fn is_tracking(&self, key: &BoundaryKey) -> bool {
        self.counters
            .read()
            .map(|counters| counters.contains_key(key))
            .unwrap_or(false)
    }

    /// Get the counter for `key`, creating it if needed.
    ///
    /// A new counter starts after whatever `last_stored` reports, decided
    /// under the map's write lock so no caller can observe it unseeded.
    fn counter(
        &self,
        key: &BoundaryKey,
        last_stored: impl FnOnce() -> WellplatedResult<Option<u64>>,
    ) -> WellplatedResult<Arc<Mutex<u64>>> {
        if let Some(counter) = self.existing(key)? {
            return Ok(counter);
        }
        let mut counters = self
            .counters
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        if let Some(counter) = counters.get(key) {
            return Ok(Arc::clone(counter));
        }
        let next = match last_stored()? {
            Some(last) => last.saturating_add(1).max(self.first_sequence),
            None => self.first_sequence,
        };
        tracing::debug!(boundary_key = %key, next, "Started sequence counter");
        let counter = Arc::new(Mutex::new(next));
        counters.insert(key.clone(), Arc::clone(&counter));
        Ok(counter)
    }

    fn existing(&self, key: &BoundaryKey) -> WellplatedResult<Option<Arc<Mutex<u64>>>> {
        let counters = self
            .counters
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(counters.get(key).map(Arc::clone))
    }

    /// Reserve `count` consecutive sequence numbers for `key`.
    ///
    /// Fails without moving the counter when `count` is out of range or the
    /// block would not fit the format's sequence width.
    pub fn allocate(&self, key: &BoundaryKey, count: u64) -> WellplatedResult<SequenceBlock> {
        self.allocate_after(key, count, || Ok(None))
    }

    /// Like [`allocate`](Self::allocate), but a counter created by this call
    /// starts after the highest sequence `last_stored` reports.
    ///
    /// `last_stored` runs at most once per format, only when the counter
    /// does not exist yet.
    pub fn allocate_after(
        &self,
        key: &BoundaryKey,
        count: u64,
        last_stored: impl FnOnce() -> WellplatedResult<Option<u64>>,
    ) -> WellplatedResult<SequenceBlock> {
        if count == 0 || count > self.max_batch_size {
            return Err(ValidationError::BatchSize {
                requested: count,
                max: self.max_batch_size,
            }
            .into());
        }

        let counter = self.counter(key, last_stored)?;
        let block = {
            let mut next = counter.lock().map_err(|_| StorageError::LockPoisoned)?;
            let start = *next;
            match start.checked_add(count - 1).filter(|last| *last <= key.capacity()) {
                Some(last) => {
                    *next = last + 1;
                    SequenceBlock { start, count }
                }
                None => {
                    tracing::warn!(
                        boundary_key = %key,
                        next = start,
                        requested = count,
                        capacity = key.capacity(),
                        "Sequence space exhausted"
                    );
                    return Err(WellplatedError::Overflow(OverflowError {
                        boundary_key: key.to_string(),
                        sequence: start.saturating_add(count - 1),
                        width: key.sequence_width(),
                    }));
                }
            }
        };

        tracing::debug!(
            boundary_key = %key,
            start = block.start,
            count = block.count,
            "Reserved sequence block"
        );
        Ok(block)
    }

    /// Move the counter past `last_used`. Never moves it backwards.
    pub fn resume_after(&self, key: &BoundaryKey, last_used: u64) -> WellplatedResult<()> {
        let counter = self.counter(key, || Ok(Some(last_used)))?;
        let mut next = counter.lock().map_err(|_| StorageError::LockPoisoned)?;
        let resumed = last_used.saturating_add(1);
        if resumed > *next {
            tracing::debug!(boundary_key = %key, next = resumed, "Resumed sequence counter");
            *next = resumed;
        }
        Ok(())
    }

    /// Hand back `block` if nothing was reserved after it.
    ///
    /// Returns whether the counter moved back. A later block, or a counter
    /// that was never started, leaves everything as is.
    pub fn release(&self, key: &BoundaryKey, block: SequenceBlock) -> WellplatedResult<bool> {
        let Some(counter) = self.existing(key)? else {
            return Ok(false);
        };
        let mut next = counter.lock().map_err(|_| StorageError::LockPoisoned)?;
        if *next == block.last() + 1 {
            *next = block.start;
            tracing::debug!(boundary_key = %key, next = block.start, "Released sequence block");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// The sequence the next allocation for `key` would start at, or `None`
    /// if no counter has been started for it. Never starts one.
    pub fn peek_next(&self, key: &BoundaryKey) -> WellplatedResult<Option<u64>> {
        match self.existing(key)? {
            Some(counter) => {
                let next = counter.lock().map_err(|_| StorageError::LockPoisoned)?;
                Ok(Some(*next))
            }
            None => Ok(None),
        }
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new(&WellplatedConfig::default())
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Blocks from one allocator never overlap and never skip.
        #[test]
        fn prop_blocks_are_contiguous(counts in prop::collection::vec(1u64..100, 1..20)) {
            let allocator = SequenceAllocator::default();
            let key = BoundaryKey::derive('H', 12, "PLATE").unwrap();
            let mut expected = 1u64;
            for count in counts {
                let block = allocator.allocate(&key, count).unwrap();
                prop_assert_eq!(block.start(), expected);
                expected = block.last() + 1;
            }
        }
    }
}
