use paging_core::clock::clock::SimClock;
use paging_core::frame_table::frame_table::FrameOwner;
use paging_core::memory_manager::memory_manager::{AccessCosts, Handled, MemoryManager};
use paging_core::proc::proc::{Pid, PAGE_SIZE};
use paging_core::request::request::{AccessOutcome, MemoryRequest, RequestKind};
use paging_core::scheduler::scheduler::{AdmissionPolicy, Scheduler};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn new_manager(frames: usize, slots: usize) -> MemoryManager {
    MemoryManager::new(frames, slots, AccessCosts::default()).unwrap()
}

fn access(pid: u32, slot: usize, page: u32, kind: RequestKind) -> MemoryRequest {
    MemoryRequest::access(Pid(pid), slot, page * PAGE_SIZE, kind)
}

fn granted(handled: Handled) -> AccessOutcome {
    match handled {
        Handled::Granted { outcome, .. } => outcome,
        other => panic!("expected a granted access, got {other:?}"),
    }
}

#[test]
fn cold_start_read_claims_frame_zero() {
    let mut m = new_manager(4, 1);
    m.admit(0, Pid(1)).unwrap();

    let outcome = granted(m.handle(access(1, 0, 0, RequestKind::Read)).unwrap());
    assert_eq!(outcome, AccessOutcome::FaultFreeFrame { frame: 0 });

    let frame = m.frames().get(0).unwrap();
    assert!(frame.occupied());
    assert!(frame.reference);
    assert!(!frame.dirty);
    assert_eq!(m.queue().iter().collect::<Vec<_>>(), vec![0]);
    assert_eq!(m.stats().page_faults, 1);
    assert_eq!(m.clock(), SimClock::from_nanos(m.costs().fault_free_frame));
}

#[test]
fn repeated_hit_then_write_sets_dirty_without_fault() {
    let mut m = new_manager(4, 1);
    m.admit(0, Pid(1)).unwrap();
    m.handle(access(1, 0, 0, RequestKind::Read)).unwrap();

    let outcome = granted(m.handle(access(1, 0, 0, RequestKind::Write)).unwrap());
    assert_eq!(outcome, AccessOutcome::Hit { frame: 0, dirty_read: false });
    assert!(m.frames().get(0).unwrap().dirty);
    assert_eq!(m.stats().page_faults, 1);
    assert_eq!(m.stats().hits, 1);
    assert_eq!(m.queue().len(), 1);
}

#[test]
fn eviction_with_single_busy_frame() {
    let mut m = new_manager(1, 2);
    m.admit(0, Pid(1)).unwrap();
    m.admit(1, Pid(2)).unwrap();
    m.handle(access(1, 0, 3, RequestKind::Read)).unwrap();
    assert!(m.frames().get(0).unwrap().reference);

    let outcome = granted(m.handle(access(2, 1, 5, RequestKind::Read)).unwrap());
    assert_eq!(
        outcome,
        AccessOutcome::FaultEviction { frame: 0, victim: Pid(1), victim_page: 3, passes: 1 }
    );

    let frame = m.frames().get(0).unwrap();
    assert_eq!(frame.owner, Some(FrameOwner { pid: Pid(2), slot: 1, page: 5 }));
    assert!(frame.reference);
    assert_eq!(m.procs().get(0).unwrap().frame_of(3), None);
    assert_eq!(m.procs().get(1).unwrap().frame_of(5), Some(0));
    assert_eq!(m.queue().iter().collect::<Vec<_>>(), vec![0]);
    assert_eq!(m.stats().evictions, 1);
    assert_eq!(m.stats().second_chances, 1);
    assert_eq!(m.audit(), Ok(()));
}

#[test]
fn referenced_frame_at_head_survives_the_pass() {
    let mut m = new_manager(2, 2);
    m.admit(0, Pid(1)).unwrap();
    m.admit(1, Pid(2)).unwrap();
    m.handle(access(1, 0, 0, RequestKind::Read)).unwrap();
    m.handle(access(1, 0, 1, RequestKind::Read)).unwrap();

    // both referenced: frame 0 is spared, then frame 1, then frame 0 goes
    m.handle(access(2, 1, 7, RequestKind::Read)).unwrap();
    assert_eq!(m.queue().iter().collect::<Vec<_>>(), vec![1, 0]);

    // frame 1 is referenced again; it is spared on this pass and only
    // evicted once it comes back round with its bit cleared
    m.handle(access(1, 0, 1, RequestKind::Read)).unwrap();
    let outcome = granted(m.handle(access(2, 1, 8, RequestKind::Read)).unwrap());
    assert_eq!(
        outcome,
        AccessOutcome::FaultEviction { frame: 1, victim: Pid(1), victim_page: 1, passes: 2 }
    );
    assert_eq!(m.procs().get(1).unwrap().frame_of(7), Some(0));
    assert_eq!(m.procs().get(1).unwrap().frame_of(8), Some(1));
    assert_eq!(m.queue().iter().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn termination_mid_stream_frees_frames_and_slot() {
    let mut m = new_manager(4, 2);
    m.admit(0, Pid(1)).unwrap();
    m.admit(1, Pid(3)).unwrap();
    m.handle(access(1, 0, 0, RequestKind::Read)).unwrap();
    m.handle(access(3, 1, 2, RequestKind::Write)).unwrap();
    m.handle(access(3, 1, 6, RequestKind::Read)).unwrap();

    let handled = m.handle(MemoryRequest::terminate(Pid(3), 1)).unwrap();
    assert_eq!(
        handled,
        Handled::Terminated { pid: Pid(3), slot: 1, released: vec![1, 2], requests: 2 }
    );

    for index in [1, 2] {
        let frame = m.frames().get(index).unwrap();
        assert!(!frame.occupied());
        assert!(!frame.reference);
        assert!(!frame.dirty);
        assert_eq!(frame.owner, None);
    }
    assert!(m.procs().get(1).is_none());
    assert_eq!(m.queue().iter().collect::<Vec<_>>(), vec![0]);
    assert_eq!(m.stats().terminations, 1);
    assert_eq!(m.audit(), Ok(()));

    // the freed slot is the next one admission hands out
    let policy = AdmissionPolicy { max_concurrent: 2, max_total: 10, interval_ns: 0..1 };
    let mut scheduler = Scheduler::new(policy, StdRng::seed_from_u64(1), m.clock());
    assert_eq!(scheduler.try_admit(m.clock(), m.procs()), Some(1));
    m.admit(1, Pid(4)).unwrap();

    // and released frames are reused lowest-first without double queueing
    let outcome = granted(m.handle(access(4, 1, 9, RequestKind::Read)).unwrap());
    assert_eq!(outcome, AccessOutcome::FaultFreeFrame { frame: 1 });
    assert_eq!(m.queue().iter().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(m.audit(), Ok(()));
}
