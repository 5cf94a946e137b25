// hartirq/src/trap/collections/slot_pool.rs

//! # Fixed-Capacity Slot Pool
//!
//! A pool of optional entries over borrowed storage. The pool never grows:
//! its capacity is exactly the number of slots in the storage it was built
//! on. Entries are small `Copy` records, so mutation is read-modify-write of
//! a whole slot, which keeps every update indivisible with respect to a
//! reader that is excluded by the caller's critical-section discipline.

use core::cell::Cell;

/// A fixed-capacity pool of optional entries.
pub struct SlotPool<T: Copy> {
    ptr: *mut Option<T>,
    capacity: usize,
    count: Cell<usize>,
}

impl<T: Copy> SlotPool<T> {
    /// Builds a pool over `capacity` slots starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to `capacity` initialized `Option<T>` values (all
    /// `None` for an empty pool) that outlive the pool and are accessed
    /// through no other path.
    pub(crate) unsafe fn from_raw(ptr: *mut Option<T>, capacity: usize) -> Self {
        Self {
            ptr,
            capacity,
            count: Cell::new(0),
        }
    }

    fn cells(&self) -> &[Cell<Option<T>>] {
        // SAFETY: Cell<U> has the same layout as U, and from_raw's contract
        // gives the pool sole access to the storage.
        unsafe { core::slice::from_raw_parts(self.ptr as *const Cell<Option<T>>, self.capacity) }
    }

    /// Returns the total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.count.get()
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.count.get() == 0
    }

    /// Returns `true` if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.count.get() == self.capacity
    }

    /// Stores `item` in the first free slot. Returns the item back when the
    /// pool is full.
    pub fn insert(&self, item: T) -> Result<(), T> {
        for cell in self.cells() {
            if cell.get().is_none() {
                cell.set(Some(item));
                self.count.set(self.count.get() + 1);
                return Ok(());
            }
        }
        Err(item)
    }

    /// Returns a copy of the first entry matching `pred`.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        for cell in self.cells() {
            if let Some(entry) = cell.get() {
                if pred(&entry) {
                    return Some(entry);
                }
            }
        }
        None
    }

    /// Rewrites the first entry matching `pred` in place. Returns `false`
    /// if no entry matched.
    pub fn update(&self, mut pred: impl FnMut(&T) -> bool, f: impl FnOnce(&mut T)) -> bool {
        for cell in self.cells() {
            if let Some(mut entry) = cell.get() {
                if pred(&entry) {
                    f(&mut entry);
                    cell.set(Some(entry));
                    return true;
                }
            }
        }
        false
    }

    /// Removes and returns the first entry matching `pred`.
    pub fn take(&self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        for cell in self.cells() {
            if let Some(entry) = cell.get() {
                if pred(&entry) {
                    cell.set(None);
                    self.count.set(self.count.get() - 1);
                    return Some(entry);
                }
            }
        }
        None
    }

    /// Visits every occupied slot in storage order.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        for cell in self.cells() {
            if let Some(entry) = cell.get() {
                f(&entry);
            }
        }
    }

    /// Empties the pool.
    pub fn clear(&self) {
        for cell in self.cells() {
            cell.set(None);
        }
        self.count.set(0);
    }
}
