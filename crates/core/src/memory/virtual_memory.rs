//! Sparse address space assembled from attached memory units.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::{check_access, FixedMemory, MemoryUnit};
use crate::{NesError, Result};

/// A memory unit that can be attached to a [`VirtualMemory`] while the caller
/// keeps its own handle to it.
pub type SharedMemory = Rc<RefCell<dyn MemoryUnit>>;

/// Notification sent to the memory-map observer after the map changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMapEvent {
    Attached { start: usize, len: usize },
    Detached { start: usize, len: usize },
}

type MapObserver = Box<dyn FnMut(MemoryMapEvent)>;

/// Maps memory units at fixed offsets.
///
/// Regions never overlap. Bytes not covered by any region read as zero, and
/// writing to them fails. The length is the end of the highest region, so it
/// shrinks if that region is detached.
#[derive(Default)]
pub struct VirtualMemory {
    regions: BTreeMap<usize, SharedMemory>,
    len: usize,
    observer: Option<MapObserver>,
}

impl VirtualMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked after every attach and detach.
    pub fn set_observer(&mut self, observer: impl FnMut(MemoryMapEvent) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Attaches `unit` at `offset`.
    pub fn attach(&mut self, offset: usize, unit: SharedMemory) -> Result<()> {
        let unit_len = unit.borrow().len();
        let end = offset
            .checked_add(unit_len)
            .ok_or(NesError::OffsetOutOfRange {
                offset,
                length: unit_len,
            })?;

        for (&start, existing) in &self.regions {
            if start > end {
                break;
            }
            let existing_end = start + existing.borrow().len();
            if start == offset || (start < end && offset < existing_end) {
                log::error!(
                    "Failed to attach memory unit at ${:04X}-${:04X}: overlaps existing unit at ${:04X}-${:04X}",
                    offset,
                    end,
                    start,
                    existing_end
                );
                return Err(NesError::Overlap {
                    start: offset,
                    end,
                    existing_start: start,
                    existing_end,
                });
            }
        }

        self.regions.insert(offset, unit);
        self.recompute_len();

        log::info!(
            "Attached memory unit at ${:04X}-${:04X} ({} bytes). Total length is now {} bytes",
            offset,
            end,
            unit_len,
            self.len
        );
        self.log_memory_map();
        self.notify(MemoryMapEvent::Attached {
            start: offset,
            len: unit_len,
        });
        Ok(())
    }

    /// Attaches an owned unit and returns the shared handle to it.
    pub fn attach_unit<M: MemoryUnit + 'static>(
        &mut self,
        offset: usize,
        unit: M,
    ) -> Result<Rc<RefCell<M>>> {
        let shared = Rc::new(RefCell::new(unit));
        self.attach(offset, shared.clone())?;
        Ok(shared)
    }

    /// Attaches a writable [`FixedMemory`] holding `contents`.
    pub fn attach_bytes(&mut self, offset: usize, contents: &[u8]) -> Result<()> {
        self.attach_unit(offset, FixedMemory::from_bytes(contents))
            .map(|_| ())
    }

    /// Detaches `unit`, identified by pointer rather than by contents.
    pub fn detach<M: MemoryUnit + ?Sized>(&mut self, unit: &Rc<RefCell<M>>) -> Result<()> {
        let target = Rc::as_ptr(unit).cast::<()>();
        let start = self
            .regions
            .iter()
            .find(|(_, existing)| Rc::as_ptr(*existing).cast::<()>() == target)
            .map(|(&start, _)| start)
            .ok_or(NesError::NotAttached)?;

        let removed = self.regions.remove(&start).ok_or(NesError::NotAttached)?;
        let len = removed.borrow().len();
        self.recompute_len();

        log::info!(
            "Detached memory unit at ${:04X}-${:04X}. Total length is now {} bytes",
            start,
            start + len,
            self.len
        );
        self.log_memory_map();
        self.notify(MemoryMapEvent::Detached { start, len });
        Ok(())
    }

    /// Attached regions as `(start, length)`, in address order.
    pub fn regions(&self) -> Vec<(usize, usize)> {
        self.regions
            .iter()
            .map(|(&start, unit)| (start, unit.borrow().len()))
            .collect()
    }

    fn recompute_len(&mut self) {
        self.len = self
            .regions
            .iter()
            .map(|(&start, unit)| start + unit.borrow().len())
            .max()
            .unwrap_or(0);
    }

    fn notify(&mut self, event: MemoryMapEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(event);
        }
    }

    fn log_memory_map(&self) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        log::trace!("Dumping memory map.");
        for (start, len) in self.regions() {
            log::trace!("  ${:04X}-${:04X} ({} bytes)", start, start + len, len);
        }
    }
}

impl MemoryUnit for VirtualMemory {
    fn len(&self) -> usize {
        self.len
    }

    fn read(&mut self, offset: usize, buffer: &mut [u8]) -> Result<()> {
        let end = check_access(offset, buffer.len(), self.len)?;
        buffer.fill(0);

        for (&start, unit) in self.regions.range(..end) {
            let mut unit = unit.borrow_mut();
            let region_end = start + unit.len();
            if region_end <= offset {
                continue;
            }
            let from = offset.max(start);
            let to = end.min(region_end);
            unit.read(from - start, &mut buffer[from - offset..to - offset])?;
        }
        Ok(())
    }

    fn write(&mut self, offset: usize, buffer: &[u8]) -> Result<()> {
        let end = check_access(offset, buffer.len(), self.len)?;
        let mut cursor = offset;

        for (&start, unit) in self.regions.range(..end) {
            let mut unit = unit.borrow_mut();
            let region_end = start + unit.len();
            if region_end <= cursor {
                continue;
            }
            // Everything before `cursor` has already been written.
            if start > cursor {
                return Err(NesError::UnmappedWrite(cursor));
            }
            let to = end.min(region_end);
            unit.write(cursor - start, &buffer[cursor - offset..to - offset])?;
            cursor = to;
        }

        if cursor < end {
            return Err(NesError::UnmappedWrite(cursor));
        }
        Ok(())
    }
}

impl fmt::Debug for VirtualMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualMemory")
            .field("len", &self.len)
            .field("regions", &self.regions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(size: u8) -> FixedMemory {
        FixedMemory::from_bytes((1..=size).collect::<Vec<_>>())
    }

    fn shared(unit: FixedMemory) -> Rc<RefCell<FixedMemory>> {
        Rc::new(RefCell::new(unit))
    }

    #[test]
    fn test_initial_length_is_zero() {
        let mem = VirtualMemory::new();
        assert_eq!(mem.len(), 0);
        assert!(mem.is_empty());
    }

    #[test]
    fn test_attach_and_detach_update_length() {
        let mut mem = VirtualMemory::new();
        let ram1 = shared(FixedMemory::new(10));
        let ram2 = shared(FixedMemory::new(5));
        mem.attach(10, ram1.clone()).unwrap();
        mem.attach(20, ram2.clone()).unwrap();
        assert_eq!(mem.len(), 25);

        mem.detach(&ram2).unwrap();
        assert_eq!(mem.len(), 20);

        mem.detach(&ram1).unwrap();
        assert_eq!(mem.len(), 0);
    }

    #[test]
    fn test_detach_unknown_unit_fails() {
        let mut mem = VirtualMemory::new();
        mem.attach_bytes(0, &[1, 2, 3]).unwrap();
        let stranger = shared(FixedMemory::from_bytes(vec![1, 2, 3]));
        assert!(matches!(mem.detach(&stranger), Err(NesError::NotAttached)));
    }

    #[test]
    fn test_attach_rejects_overlap() {
        let mut mem = VirtualMemory::new();
        mem.attach_unit(10, FixedMemory::new(10)).unwrap();

        // Dangling off the end
        assert!(matches!(
            mem.attach_unit(18, FixedMemory::new(5)),
            Err(NesError::Overlap { .. })
        ));
        // Fully contained within
        assert!(matches!(
            mem.attach_unit(11, FixedMemory::new(5)),
            Err(NesError::Overlap { .. })
        ));
        // Dangling off the start
        assert!(matches!(
            mem.attach_unit(9, FixedMemory::new(5)),
            Err(NesError::Overlap { .. })
        ));
        // Same start
        assert!(matches!(
            mem.attach_unit(10, FixedMemory::new(1)),
            Err(NesError::Overlap { .. })
        ));

        assert_eq!(mem.regions(), vec![(10, 10)]);
        assert!(mem.attach_unit(20, FixedMemory::new(5)).is_ok());
        assert!(mem.attach_unit(5, FixedMemory::new(5)).is_ok());
    }

    #[test]
    fn test_read_outside_of_any_memory_produces_zeros() {
        let mut mem = VirtualMemory::new();
        mem.attach_unit(0, counting(5)).unwrap();
        mem.attach_unit(20, counting(5)).unwrap();

        let mut buf = [0xAA; 5];
        mem.read(10, &mut buf).unwrap();
        assert_eq!(buf, [0; 5]);
    }

    #[test]
    fn test_read_contained_in_one_memory() {
        let mut mem = VirtualMemory::new();
        mem.attach_unit(0, counting(10)).unwrap();

        let mut buf = [0; 5];
        mem.read(1, &mut buf).unwrap();
        assert_eq!(buf, [2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_read_spanning_two_adjacent_memories() {
        let mut mem = VirtualMemory::new();
        mem.attach_unit(0, counting(10)).unwrap();
        mem.attach_unit(10, counting(10)).unwrap();

        let mut buf = [0; 5];
        mem.read(8, &mut buf).unwrap();
        assert_eq!(buf, [9, 10, 1, 2, 3]);
    }

    #[test]
    fn test_read_spanning_two_memories_with_a_gap() {
        let mut mem = VirtualMemory::new();
        mem.attach_unit(0, counting(10)).unwrap();
        mem.attach_unit(15, counting(10)).unwrap();

        let mut buf = [0; 15];
        mem.read(5, &mut buf).unwrap();
        assert_eq!(buf, [6, 7, 8, 9, 10, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_read_over_the_end_fails() {
        let mut mem = VirtualMemory::new();
        let mut buf = [0; 20];
        assert!(matches!(
            mem.read(0, &mut buf),
            Err(NesError::OutOfBounds { .. })
        ));

        mem.attach_unit(0, FixedMemory::new(5)).unwrap();
        mem.attach_unit(5, FixedMemory::new(5)).unwrap();

        assert!(mem.read(0, &mut buf).is_err());
        assert!(mem.read(7, &mut buf).is_err());
        assert!(mem.read(15, &mut buf).is_err());
    }

    #[test]
    fn test_read_does_not_include_detached_memory() {
        let mut mem = VirtualMemory::new();
        let ram1 = mem.attach_unit(0, counting(10)).unwrap();
        mem.attach_unit(15, counting(10)).unwrap();
        mem.detach(&ram1).unwrap();

        let mut buf = [0; 15];
        mem.read(5, &mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_write_outside_of_any_memory_fails() {
        let mut mem = VirtualMemory::new();
        mem.attach_unit(0, FixedMemory::new(5)).unwrap();
        mem.attach_unit(20, FixedMemory::new(5)).unwrap();

        assert!(matches!(
            mem.write(10, &[1, 2, 3, 4, 5]),
            Err(NesError::UnmappedWrite(10))
        ));
    }

    #[test]
    fn test_write_contained_in_one_memory() {
        let mut mem = VirtualMemory::new();
        let ram = mem.attach_unit(0, FixedMemory::new(10)).unwrap();

        mem.write(1, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(ram.borrow().data(), &[0, 1, 2, 3, 4, 5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_write_spanning_two_adjacent_memories() {
        let mut mem = VirtualMemory::new();
        let ram1 = mem.attach_unit(0, FixedMemory::new(10)).unwrap();
        let ram2 = mem.attach_unit(10, FixedMemory::new(10)).unwrap();

        let data: Vec<u8> = (1..=10).collect();
        mem.write(5, &data).unwrap();
        assert_eq!(ram1.borrow().data(), &[0, 0, 0, 0, 0, 1, 2, 3, 4, 5]);
        assert_eq!(ram2.borrow().data(), &[6, 7, 8, 9, 10, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_write_into_gap_fails_after_writing_everything_before_it() {
        let mut mem = VirtualMemory::new();
        let ram1 = mem.attach_unit(0, FixedMemory::new(10)).unwrap();
        let ram2 = mem.attach_unit(15, FixedMemory::new(10)).unwrap();

        let data: Vec<u8> = (1..=15).collect();
        assert!(matches!(
            mem.write(5, &data),
            Err(NesError::UnmappedWrite(10))
        ));

        assert_eq!(ram1.borrow().data(), &[0, 0, 0, 0, 0, 1, 2, 3, 4, 5]);
        assert_eq!(ram2.borrow().data(), &[0; 10]);
    }

    #[test]
    fn test_write_over_the_end_fails() {
        let mut mem = VirtualMemory::new();
        let data = [0; 20];
        assert!(mem.write(0, &data).is_err());

        mem.attach_unit(0, FixedMemory::new(5)).unwrap();
        mem.attach_unit(5, FixedMemory::new(5)).unwrap();

        assert!(matches!(
            mem.write(0, &data),
            Err(NesError::OutOfBounds { .. })
        ));
        assert!(mem.write(7, &data).is_err());
        assert!(mem.write(15, &data).is_err());
    }

    #[test]
    fn test_write_over_detached_memory_fails() {
        let mut mem = VirtualMemory::new();
        let ram1 = mem.attach_unit(0, counting(10)).unwrap();
        mem.attach_unit(15, counting(10)).unwrap();
        mem.detach(&ram1).unwrap();

        assert!(matches!(
            mem.write(5, &[0; 15]),
            Err(NesError::UnmappedWrite(5))
        ));
    }

    #[test]
    fn test_write_to_read_only_region_fails() {
        let mut mem = VirtualMemory::new();
        mem.attach_unit(0, FixedMemory::read_only(vec![1, 2, 3])).unwrap();
        assert!(matches!(
            mem.write(1, &[9]),
            Err(NesError::WriteNotPermitted)
        ));
    }

    #[test]
    fn test_observer_sees_map_changes() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();

        let mut mem = VirtualMemory::new();
        mem.set_observer(move |event| sink.borrow_mut().push(event));
        let ram = mem.attach_unit(0x10, FixedMemory::new(4)).unwrap();
        mem.detach(&ram).unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                MemoryMapEvent::Attached { start: 0x10, len: 4 },
                MemoryMapEvent::Detached { start: 0x10, len: 4 },
            ]
        );
    }
}
