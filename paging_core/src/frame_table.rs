pub mod frame_table {
    use std::io::{Error, ErrorKind};

    use crate::proc::proc::Pid;

    /// The default physical memory size, in frames.
    pub const DEFAULT_FRAMES: usize = 256;

    /// Which process page a frame currently holds.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct FrameOwner {
        pub pid: Pid,
        pub slot: usize,
        pub page: usize,
    }

    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct Frame {
        pub owner: Option<FrameOwner>,
        pub reference: bool,
        pub dirty: bool,
    }

    impl Frame {
        /// the allocator only ever consults this to find free space.
        pub fn occupied(&self) -> bool {
            self.owner.is_some()
        }
    }

    /// Fixed pool of physical frame descriptors.
    ///
    /// Allocation is first-fit over ascending frame index so that which
    /// frame a fault lands in is reproducible. No bytes are modelled; a
    /// frame only records its occupant and the reference/dirty bits.
    pub struct FrameTable {
        frames: Vec<Frame>,
    }

    impl FrameTable {
        pub fn new(count: usize) -> Result<FrameTable, Error> {
            if count == 0 {
                return Err(Error::new(ErrorKind::InvalidInput, "frame count must be > 0"));
            }

            Ok(FrameTable {
                frames: vec![Frame::default(); count],
            })
        }

        pub fn len(&self) -> usize {
            self.frames.len()
        }

        pub fn is_empty(&self) -> bool {
            self.frames.is_empty()
        }

        pub fn get(&self, index: usize) -> Option<&Frame> {
            self.frames.get(index)
        }

        pub fn get_mut(&mut self, index: usize) -> Option<&mut Frame> {
            self.frames.get_mut(index)
        }

        pub fn iter(&self) -> impl Iterator<Item = &Frame> + '_ {
            self.frames.iter()
        }

        /// Lowest-indexed frame that is not occupied, if any.
        pub fn first_free(&self) -> Option<usize> {
            self.frames.iter().position(|frame| !frame.occupied())
        }

        pub fn occupied_count(&self) -> usize {
            self.frames.iter().filter(|frame| frame.occupied()).count()
        }

        /// Frames currently holding pages of `pid`, in ascending order.
        pub fn owned_by(&self, pid: Pid) -> Vec<usize> {
            self.frames
                .iter()
                .enumerate()
                .filter(|(_, frame)| frame.owner.map(|o| o.pid) == Some(pid))
                .map(|(idx, _)| idx)
                .collect()
        }

        /// Load `owner`'s page into `index`. The reference bit starts set;
        /// the dirty bit comes from whether the loading access was a write.
        pub fn bind(&mut self, index: usize, owner: FrameOwner, dirty: bool) -> Result<(), Error> {
            let frame = self
                .frames
                .get_mut(index)
                .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "frame index out of range"))?;

            frame.owner = Some(owner);
            frame.reference = true;
            frame.dirty = dirty;
            Ok(())
        }

        /// Clear a frame entirely, returning who held it.
        pub fn release(&mut self, index: usize) -> Option<FrameOwner> {
            let frame = self.frames.get_mut(index)?;
            let owner = frame.owner.take();
            frame.reference = false;
            frame.dirty = false;
            owner
        }

        pub fn reset(&mut self) {
            self.frames.iter_mut().for_each(|frame| *frame = Frame::default());
        }
    }

}
