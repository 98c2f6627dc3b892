pub mod eviction_queue {
    use std::collections::VecDeque;

    /// FIFO of frame indices used by the second-chance scan.
    ///
    /// A frame enters the queue when it is populated and re-enters at the
    /// tail whenever the scan spares it. Capacity equals the frame count,
    /// so a full queue holds every frame exactly once.
    #[derive(Debug, Clone)]
    pub struct EvictionQueue {
        frames: VecDeque<usize>,
        capacity: usize,
    }

    impl EvictionQueue {
        pub fn with_capacity(capacity: usize) -> EvictionQueue {
            EvictionQueue {
                frames: VecDeque::with_capacity(capacity),
                capacity,
            }
        }

        /// Append a frame at the tail.
        ///
        /// Panics if the frame is already queued or the queue is full; either
        /// means a frame was enqueued outside population or reinsertion.
        pub fn push(&mut self, frame: usize) {
            assert!(
                self.frames.len() < self.capacity,
                "eviction queue overflow pushing frame {frame}"
            );
            assert!(
                !self.frames.contains(&frame),
                "frame {frame} enqueued twice"
            );
            self.frames.push_back(frame);
        }

        pub fn pop(&mut self) -> Option<usize> {
            self.frames.pop_front()
        }

        /// Drop a released frame from wherever it sits, keeping the order of
        /// the others. Returns whether it was queued.
        pub fn remove(&mut self, frame: usize) -> bool {
            match self.frames.iter().position(|&f| f == frame) {
                Some(pos) => {
                    self.frames.remove(pos);
                    true
                }
                None => false,
            }
        }

        pub fn len(&self) -> usize {
            self.frames.len()
        }

        pub fn is_empty(&self) -> bool {
            self.frames.is_empty()
        }

        pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
            self.frames.iter().copied()
        }

        pub fn clear(&mut self) {
            self.frames.clear();
        }
    }

}
