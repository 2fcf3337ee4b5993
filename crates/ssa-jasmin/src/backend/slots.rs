// Local-variable slot allocation for one function.
//
// Slots are handed out by a bump counter in request order and memoized by
// value identity. Wide values (i64, double) take two consecutive slots.

use std::collections::HashMap;

use crate::ir::ValueId;

#[derive(Debug, Default)]
pub struct SlotAllocator {
    slots: HashMap<ValueId, u32>,
    next: u32,
    variadic: Option<u32>,
    scratch: Option<u32>,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot of `id`, allocating `1` or `2` slots on first request.
    pub fn slot_of(&mut self, id: ValueId, wide: bool) -> u32 {
        if let Some(&slot) = self.slots.get(&id) {
            return slot;
        }
        let slot = self.next;
        self.next += if wide { 2 } else { 1 };
        self.slots.insert(id, slot);
        slot
    }

    /// Reserve the slot holding the variadic-argument-list pointer.
    /// Repeated calls return the same slot.
    pub fn reserve_variadic_slot(&mut self) -> u32 {
        if let Some(slot) = self.variadic {
            return slot;
        }
        let slot = self.next;
        self.next += 1;
        self.variadic = Some(slot);
        slot
    }

    pub fn variadic_slot(&self) -> Option<u32> {
        self.variadic
    }

    /// Reserve `width` consecutive untyped slots for staging phi copies.
    /// Returns the first one.
    pub fn reserve_scratch(&mut self, width: u32) -> u32 {
        let base = self.next;
        self.next += width;
        self.scratch = Some(base);
        base
    }

    pub fn scratch_base(&self) -> Option<u32> {
        self.scratch
    }

    /// Number of slots in use, i.e. the method's locals limit.
    pub fn used(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_values_take_one_slot() {
        let mut slots = SlotAllocator::new();
        assert_eq!(slots.slot_of(ValueId(0), false), 0);
        assert_eq!(slots.slot_of(ValueId(1), false), 1);
        assert_eq!(slots.slot_of(ValueId(2), false), 2);
        assert_eq!(slots.used(), 3);
    }

    #[test]
    fn wide_values_take_two_slots() {
        let mut slots = SlotAllocator::new();
        assert_eq!(slots.slot_of(ValueId(0), true), 0);
        assert_eq!(slots.slot_of(ValueId(1), false), 2);
        assert_eq!(slots.used(), 3);
    }

    #[test]
    fn repeated_requests_do_not_advance_the_counter() {
        let mut slots = SlotAllocator::new();
        let a = slots.slot_of(ValueId(7), true);
        assert_eq!(slots.slot_of(ValueId(7), true), a);
        assert_eq!(slots.slot_of(ValueId(7), true), a);
        assert_eq!(slots.used(), 2);
    }

    #[test]
    fn variadic_slot_is_reserved_once() {
        let mut slots = SlotAllocator::new();
        slots.slot_of(ValueId(0), false);
        let va = slots.reserve_variadic_slot();
        assert_eq!(va, 1);
        assert_eq!(slots.reserve_variadic_slot(), 1);
        assert_eq!(slots.variadic_slot(), Some(1));
        assert_eq!(slots.used(), 2);
    }

    #[test]
    fn scratch_follows_every_assigned_slot() {
        let mut slots = SlotAllocator::new();
        slots.slot_of(ValueId(0), true);
        slots.slot_of(ValueId(1), false);
        assert_eq!(slots.scratch_base(), None);
        assert_eq!(slots.reserve_scratch(3), 3);
        assert_eq!(slots.scratch_base(), Some(3));
        assert_eq!(slots.used(), 6);
    }
}
