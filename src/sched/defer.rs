// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Bounded deferred-execution queue.
//!
//! Interrupt handlers push work here and return immediately; the main loop drains the queue with
//! [`DeferQueue::run_pending`]. Pushing is O(1), never allocates and never blocks. When the queue
//! is full the newest request is dropped and counted.
//!
//! ```ignore
//! static DEFERRED: DeferQueue<8> = DeferQueue::new();
//!
//! loop {
//!     DEFERRED.run_pending();
//!     cortex_m::asm::wfi();
//! }
//! ```

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use heapless::Deque;
use log::warn;

/// Work that runs in the normal execution context.
pub trait Task: Sync {
    fn run(&self);
}

/// Accepts deferred work from interrupt context.
pub trait Scheduler: Sync {
    /// Queue `task`. Returns `false` if the request was dropped.
    fn schedule(&self, task: &'static dyn Task) -> bool;
}

/// One queued request.
#[derive(Copy, Clone)]
pub enum Job {
    Task(&'static dyn Task),
    /// Plain function plus an opaque argument.
    Call(fn(usize), usize),
}

impl Job {
    fn run(self) {
        match self {
            Job::Task(task) => task.run(),
            Job::Call(func, arg) => func(arg),
        }
    }
}

pub struct DeferQueue<const DEPTH: usize> {
    jobs: Mutex<RefCell<Deque<Job, DEPTH>>>,
    dropped: Mutex<Cell<usize>>,
    reported: Mutex<Cell<usize>>,
}

impl<const DEPTH: usize> Default for DeferQueue<DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DEPTH: usize> DeferQueue<DEPTH> {
    pub const fn new() -> Self {
        Self {
            jobs: Mutex::new(RefCell::new(Deque::new())),
            dropped: Mutex::new(Cell::new(0)),
            reported: Mutex::new(Cell::new(0)),
        }
    }

    fn push(&self, job: Job) -> bool {
        critical_section::with(|cs| {
            if self.jobs.borrow_ref_mut(cs).push_back(job).is_ok() {
                true
            } else {
                let dropped = self.dropped.borrow(cs);
                dropped.set(dropped.get().wrapping_add(1));
                false
            }
        })
    }

    /// Queue `func(arg)`. Safe to call from interrupt context.
    #[inline]
    pub fn enqueue(&self, func: fn(usize), arg: usize) -> bool {
        self.push(Job::Call(func, arg))
    }

    /// Run the jobs that are queued right now, oldest first, and return how many ran.
    ///
    /// Jobs queued while the drain is in progress are left for the next call. Each job is popped
    /// inside a critical section and executed with interrupts enabled.
    pub fn run_pending(&self) -> usize {
        let (pending, missed) = critical_section::with(|cs| {
            let total = self.dropped.borrow(cs).get();
            let seen = self.reported.borrow(cs).replace(total);
            (self.jobs.borrow_ref(cs).len(), total.wrapping_sub(seen))
        });

        if missed > 0 {
            warn!("deferred queue full, dropped {} requests", missed);
        }

        let mut ran = 0;
        while ran < pending {
            let job = critical_section::with(|cs| self.jobs.borrow_ref_mut(cs).pop_front());
            match job {
                Some(job) => job.run(),
                None => break,
            }
            ran += 1;
        }
        ran
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.jobs.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        DEPTH
    }

    /// Total number of requests dropped because the queue was full.
    pub fn dropped(&self) -> usize {
        critical_section::with(|cs| self.dropped.borrow(cs).get())
    }
}

impl<const DEPTH: usize> Scheduler for DeferQueue<DEPTH> {
    #[inline]
    fn schedule(&self, task: &'static dyn Task) -> bool {
        self.push(Job::Task(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::vec::Vec;

    #[test]
    fn runs_in_fifo_order() {
        static QUEUE: DeferQueue<4> = DeferQueue::new();
        static LOG: StdMutex<Vec<usize>> = StdMutex::new(Vec::new());

        fn record(arg: usize) {
            LOG.lock().unwrap().push(arg);
        }

        assert!(QUEUE.enqueue(record, 1));
        assert!(QUEUE.enqueue(record, 2));
        assert!(QUEUE.enqueue(record, 3));
        assert!(LOG.lock().unwrap().is_empty());

        assert_eq!(QUEUE.run_pending(), 3);
        assert_eq!(*LOG.lock().unwrap(), [1, 2, 3]);
        assert!(QUEUE.is_empty());
    }

    #[test]
    fn full_queue_drops_newest() {
        static QUEUE: DeferQueue<2> = DeferQueue::new();
        static LOG: StdMutex<Vec<usize>> = StdMutex::new(Vec::new());

        fn record(arg: usize) {
            LOG.lock().unwrap().push(arg);
        }

        assert!(QUEUE.enqueue(record, 10));
        assert!(QUEUE.enqueue(record, 20));
        assert!(!QUEUE.enqueue(record, 30));
        assert_eq!(QUEUE.dropped(), 1);
        assert_eq!(QUEUE.len(), 2);

        assert_eq!(QUEUE.run_pending(), 2);
        assert_eq!(*LOG.lock().unwrap(), [10, 20]);
        assert_eq!(QUEUE.dropped(), 1);
    }

    #[test]
    fn work_queued_during_drain_waits() {
        static QUEUE: DeferQueue<4> = DeferQueue::new();
        static RUNS: AtomicUsize = AtomicUsize::new(0);

        fn requeue(depth: usize) {
            RUNS.fetch_add(1, Ordering::SeqCst);
            if depth > 0 {
                QUEUE.enqueue(requeue, depth - 1);
            }
        }

        QUEUE.enqueue(requeue, 2);
        assert_eq!(QUEUE.run_pending(), 1);
        assert_eq!(QUEUE.len(), 1);
        assert_eq!(QUEUE.run_pending(), 1);
        assert_eq!(QUEUE.run_pending(), 1);
        assert_eq!(QUEUE.run_pending(), 0);
        assert_eq!(RUNS.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn schedules_tasks() {
        struct Counter(AtomicUsize);

        impl Task for Counter {
            fn run(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        static QUEUE: DeferQueue<4> = DeferQueue::new();
        static COUNTER: Counter = Counter(AtomicUsize::new(0));

        assert!(QUEUE.schedule(&COUNTER));
        assert!(QUEUE.schedule(&COUNTER));
        assert_eq!(COUNTER.0.load(Ordering::SeqCst), 0);
        assert_eq!(QUEUE.run_pending(), 2);
        assert_eq!(COUNTER.0.load(Ordering::SeqCst), 2);
    }
}
