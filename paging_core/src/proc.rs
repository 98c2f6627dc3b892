pub mod proc {
    use std::fmt;
    use std::io::{Error, ErrorKind};

    use crate::clock::clock::SimClock;

    /// Pages in every process address space.
    pub const PAGE_COUNT: usize = 32;
    /// Bytes per page; addresses are `page * PAGE_SIZE + offset`.
    pub const PAGE_SIZE: u32 = 1024;
    /// Hard ceiling on concurrently admitted processes.
    pub const MAX_PROCESSES: usize = 18;

    /// Identity the manager hands out on admission.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Pid(pub u32);

    impl fmt::Display for Pid {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "P{}", self.0)
        }
    }

    pub type PageTable = [Option<usize>; PAGE_COUNT];

    pub struct ProcessSlot {
        pub pid: Pid,
        pub created_at: SimClock,
        pub page_table: PageTable,
        /// accesses resolved for this process so far.
        pub requests: u64,
    }

    impl ProcessSlot {
        fn new(pid: Pid, created_at: SimClock) -> ProcessSlot {
            ProcessSlot {
                pid,
                created_at,
                page_table: [None; PAGE_COUNT],
                requests: 0,
            }
        }

        // frame holding `page`, if it is resident.
        pub fn frame_of(&self, page: usize) -> Option<usize> {
            self.page_table.get(page).copied().flatten()
        }

        pub fn mapped_pages(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
            self.page_table
                .iter()
                .enumerate()
                .filter_map(|(page, frame)| frame.map(|f| (page, f)))
        }

        pub fn clear_page_table(&mut self) {
            self.page_table = [None; PAGE_COUNT];
        }
    }

    /// Fixed-capacity table of process slots. A `None` entry is a free slot.
    pub struct ProcessTable {
        slots: Vec<Option<ProcessSlot>>,
    }

    impl ProcessTable {
        pub fn new(capacity: usize) -> Result<ProcessTable, Error> {
            if capacity == 0 || capacity > MAX_PROCESSES {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("process table capacity must be within 1..={MAX_PROCESSES}"),
                ));
            }

            let mut slots = Vec::with_capacity(capacity);
            slots.resize_with(capacity, || None);
            Ok(ProcessTable { slots })
        }

        pub fn capacity(&self) -> usize {
            self.slots.len()
        }

        pub fn first_free_slot(&self) -> Option<usize> {
            self.slots.iter().position(|slot| slot.is_none())
        }

        pub fn active_count(&self) -> usize {
            self.slots.iter().filter(|slot| slot.is_some()).count()
        }

        pub fn get(&self, slot: usize) -> Option<&ProcessSlot> {
            self.slots.get(slot)?.as_ref()
        }

        pub fn get_mut(&mut self, slot: usize) -> Option<&mut ProcessSlot> {
            self.slots.get_mut(slot)?.as_mut()
        }

        /// Occupy a free slot with a fresh, fully unmapped page table.
        pub fn admit(&mut self, slot: usize, pid: Pid, now: SimClock) -> Result<(), Error> {
            let entry = self
                .slots
                .get_mut(slot)
                .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "slot index out of range"))?;

            if entry.is_some() {
                return Err(Error::new(ErrorKind::AddrInUse, "slot already occupied"));
            }

            *entry = Some(ProcessSlot::new(pid, now));
            Ok(())
        }

        /// Vacate a slot, handing back what it held.
        pub fn free(&mut self, slot: usize) -> Option<ProcessSlot> {
            self.slots.get_mut(slot)?.take()
        }

        pub fn iter_active(&self) -> impl Iterator<Item = (usize, &ProcessSlot)> + '_ {
            self.slots
                .iter()
                .enumerate()
                .filter_map(|(idx, slot)| slot.as_ref().map(|s| (idx, s)))
        }

        pub fn clear(&mut self) {
            self.slots.iter_mut().for_each(|slot| *slot = None);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn capacity_is_bounded_by_ceiling() {
            assert!(ProcessTable::new(0).is_err());
            assert!(ProcessTable::new(MAX_PROCESSES + 1).is_err());
            assert_eq!(ProcessTable::new(MAX_PROCESSES).unwrap().capacity(), MAX_PROCESSES);
        }

        #[test]
        fn admit_starts_unmapped() {
            let mut table = ProcessTable::new(2).unwrap();
            table.admit(1, Pid(5), SimClock::new(0, 10)).unwrap();
            let slot = table.get(1).unwrap();
            assert_eq!(slot.pid, Pid(5));
            assert_eq!(slot.created_at, SimClock::new(0, 10));
            assert_eq!(slot.requests, 0);
            assert!(slot.page_table.iter().all(|entry| entry.is_none()));
            assert_eq!(table.first_free_slot(), Some(0));
        }

        #[test]
        fn admit_into_occupied_slot_fails() {
            let mut table = ProcessTable::new(1).unwrap();
            table.admit(0, Pid(1), SimClock::ZERO).unwrap();
            let err = table.admit(0, Pid(2), SimClock::ZERO).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AddrInUse);
        }

        #[test]
        fn free_makes_slot_reusable() {
            let mut table = ProcessTable::new(1).unwrap();
            table.admit(0, Pid(1), SimClock::ZERO).unwrap();
            assert_eq!(table.first_free_slot(), None);
            let old = table.free(0).unwrap();
            assert_eq!(old.pid, Pid(1));
            assert_eq!(table.first_free_slot(), Some(0));
            table.admit(0, Pid(2), SimClock::ZERO).unwrap();
            assert_eq!(table.active_count(), 1);
        }

        #[test]
        fn mapped_pages_skips_holes() {
            let mut table = ProcessTable::new(1).unwrap();
            table.admit(0, Pid(1), SimClock::ZERO).unwrap();
            let slot = table.get_mut(0).unwrap();
            slot.page_table[3] = Some(7);
            slot.page_table[30] = Some(1);
            assert_eq!(slot.mapped_pages().collect::<Vec<_>>(), vec![(3, 7), (30, 1)]);
            assert_eq!(slot.frame_of(3), Some(7));
            assert_eq!(slot.frame_of(PAGE_COUNT), None);
        }
    }
}
