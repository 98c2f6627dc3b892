pub mod clock {
    use std::fmt;

    pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

    /// Logical (seconds, nanoseconds) clock owned by the memory manager.
    ///
    /// nanoseconds always stays below one second; overflow carries into
    /// seconds. The derived ordering compares seconds first, which is the
    /// chronological order because of that invariant.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct SimClock {
        seconds: u64,
        nanoseconds: u64,
    }

    impl SimClock {
        pub const ZERO: SimClock = SimClock { seconds: 0, nanoseconds: 0 };

        pub fn new(seconds: u64, nanoseconds: u64) -> SimClock {
            let mut clock = SimClock { seconds, nanoseconds: 0 };
            clock.advance(nanoseconds);
            clock
        }

        pub fn from_nanos(total: u64) -> SimClock {
            SimClock::new(0, total)
        }

        pub fn seconds(&self) -> u64 {
            self.seconds
        }

        pub fn nanoseconds(&self) -> u64 {
            self.nanoseconds
        }

        pub fn as_nanos(&self) -> u128 {
            self.seconds as u128 * NANOS_PER_SECOND as u128 + self.nanoseconds as u128
        }

        /// Move the clock forward by `delta` nanoseconds, carrying into seconds.
        pub fn advance(&mut self, delta: u64) {
            let total = self.nanoseconds + delta % NANOS_PER_SECOND;
            self.seconds += delta / NANOS_PER_SECOND + total / NANOS_PER_SECOND;
            self.nanoseconds = total % NANOS_PER_SECOND;
        }

        /// A copy of this clock moved forward by `delta` nanoseconds.
        pub fn after(&self, delta: u64) -> SimClock {
            let mut later = *self;
            later.advance(delta);
            later
        }

        // never moves backwards; used to fast-forward to a future target.
        pub fn advance_to(&mut self, target: SimClock) {
            if target > *self {
                *self = target;
            }
        }
    }

    impl fmt::Display for SimClock {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}:{:09}", self.seconds, self.nanoseconds)
        }
    }

}
