//! Coalescing update queues.
//!
//! Each queue holds a deduplicated pending set and at most one armed timer.
//! Time is passed in by the caller, which keeps the queues deterministic; a
//! driver only has to call [`UpdateScheduler::take_due`] or
//! [`UpdateScheduler::run_due`] once [`UpdateScheduler::next_deadline`]
//! passes.

use core::time::Duration;
use std::time::Instant;

use smallvec::SmallVec;

use crate::config::SchedulerConfig;

/// Queue selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueId {
    /// Runs on the next tick.
    Immediate,
    /// Runs after a quiet period.
    Debounced,
}

/// Pending set plus one timer.
#[derive(Clone, Debug)]
pub struct CoalescingQueue<T> {
    id: QueueId,
    delay: Duration,
    pending: Vec<T>,
    deadline: Option<Instant>,
}

impl<T> CoalescingQueue<T>
where
    T: PartialEq + core::fmt::Debug,
{
    pub fn new(id: QueueId, delay: Duration) -> Self {
        Self {
            id,
            delay,
            pending: Vec::new(),
            deadline: None,
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Add `task` unless already pending; arm the timer if idle.
    ///
    /// Returns whether the task was added.
    pub fn enqueue(&mut self, task: T, now: Instant) -> bool {
        let added = if self.pending.contains(&task) {
            false
        } else {
            log::trace!("{:?} queue: enqueue {:?}", self.id, task);
            self.pending.push(task);
            true
        };
        if self.deadline.is_none() {
            let deadline = now + self.delay;
            log::trace!("{:?} queue: timer armed for {:?}", self.id, self.delay);
            self.deadline = Some(deadline);
        }
        added
    }

    /// Remove `task`; disarm the timer when nothing is left.
    pub fn cancel(&mut self, task: &T) -> bool {
        let Some(pos) = self.pending.iter().position(|pending| pending == task) else {
            return false;
        };
        self.pending.remove(pos);
        if self.pending.is_empty() && self.deadline.take().is_some() {
            log::trace!("{:?} queue: timer cancelled", self.id);
        }
        true
    }

    /// Drop every pending task and the timer.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }

    pub fn pending(&self) -> &[T] {
        &self.pending
    }

    /// Fire the timer if due: disarm it and hand back the batch in enqueue order.
    ///
    /// The pending set is empty before any task of the batch runs, so a task
    /// enqueued from inside the batch starts a new one.
    pub fn drain_due(&mut self, now: Instant) -> Vec<T> {
        if !self.is_due(now) {
            return Vec::new();
        }
        self.deadline = None;
        let batch = core::mem::take(&mut self.pending);
        log::trace!("{:?} queue: draining {} task(s)", self.id, batch.len());
        batch
    }
}

/// Immediate and debounced queues of one element.
#[derive(Clone, Debug)]
pub struct UpdateScheduler<T> {
    immediate: CoalescingQueue<T>,
    debounced: CoalescingQueue<T>,
}

impl<T> UpdateScheduler<T>
where
    T: PartialEq + core::fmt::Debug,
{
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            immediate: CoalescingQueue::new(QueueId::Immediate, config.immediate_delay()),
            debounced: CoalescingQueue::new(QueueId::Debounced, config.debounce_delay()),
        }
    }

    pub fn queue(&self, id: QueueId) -> &CoalescingQueue<T> {
        match id {
            QueueId::Immediate => &self.immediate,
            QueueId::Debounced => &self.debounced,
        }
    }

    fn queue_mut(&mut self, id: QueueId) -> &mut CoalescingQueue<T> {
        match id {
            QueueId::Immediate => &mut self.immediate,
            QueueId::Debounced => &mut self.debounced,
        }
    }

    pub fn enqueue(&mut self, queue: QueueId, task: T, now: Instant) -> bool {
        self.queue_mut(queue).enqueue(task, now)
    }

    pub fn cancel(&mut self, queue: QueueId, task: &T) -> bool {
        self.queue_mut(queue).cancel(task)
    }

    /// Remove `task` from both queues.
    pub fn cancel_everywhere(&mut self, task: &T) -> bool {
        let immediate = self.immediate.cancel(task);
        let debounced = self.debounced.cancel(task);
        immediate || debounced
    }

    pub fn clear(&mut self) {
        self.immediate.clear();
        self.debounced.clear();
    }

    /// Earliest armed deadline across both queues.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.immediate.deadline(), self.debounced.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.immediate.is_armed() && !self.debounced.is_armed()
    }

    /// Fire every due queue, earliest deadline first.
    ///
    /// All due batches are drained before the caller runs any of them.
    pub fn take_due(&mut self, now: Instant) -> Vec<(QueueId, T)> {
        let mut due: SmallVec<[(Instant, QueueId); 2]> = SmallVec::new();
        for queue in [&self.immediate, &self.debounced] {
            if let Some(deadline) = queue.deadline().filter(|&deadline| deadline <= now) {
                due.push((deadline, queue.id()));
            }
        }
        due.sort_by_key(|&(deadline, _)| deadline);

        let mut out = Vec::new();
        for (_, id) in due {
            out.extend(self.queue_mut(id).drain_due(now).into_iter().map(|task| (id, task)));
        }
        out
    }

    /// Fire due queues and run each task with access to the scheduler.
    ///
    /// Tasks enqueued by `run` go to a fresh batch and are not run by this
    /// call. Returns the number of tasks run.
    pub fn run_due<F>(&mut self, now: Instant, mut run: F) -> usize
    where
        F: FnMut(&mut Self, QueueId, T),
    {
        let batch = self.take_due(now);
        let ran = batch.len();
        for (queue, task) in batch {
            run(self, queue, task);
        }
        ran
    }
}

impl<T> Default for UpdateScheduler<T>
where
    T: PartialEq + core::fmt::Debug,
{
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Task {
        Build,
        Check,
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn duplicate_enqueue_runs_once() {
        let t0 = Instant::now();
        let mut sched = UpdateScheduler::default();
        assert!(sched.enqueue(QueueId::Immediate, Task::Build, t0));
        assert!(!sched.enqueue(QueueId::Immediate, Task::Build, t0));
        let mut runs = Vec::new();
        let ran = sched.run_due(t0, |_, queue, task| runs.push((queue, task)));
        assert_eq!(ran, 1);
        assert_eq!(runs, vec![(QueueId::Immediate, Task::Build)]);
        assert!(sched.is_idle());
    }

    #[test]
    fn debounced_queue_waits_for_its_delay() {
        let t0 = Instant::now();
        let mut sched = UpdateScheduler::default();
        sched.enqueue(QueueId::Debounced, Task::Check, t0);
        // Later enqueues do not push the deadline out.
        sched.enqueue(QueueId::Debounced, Task::Build, t0 + ms(50));
        assert_eq!(sched.next_deadline(), Some(t0 + ms(75)));
        assert!(sched.take_due(t0 + ms(74)).is_empty());
        assert_eq!(
            sched.take_due(t0 + ms(75)),
            vec![
                (QueueId::Debounced, Task::Check),
                (QueueId::Debounced, Task::Build)
            ]
        );
    }

    #[test]
    fn self_requeue_lands_in_next_batch() {
        let t0 = Instant::now();
        let mut sched = UpdateScheduler::default();
        sched.enqueue(QueueId::Immediate, Task::Build, t0);
        let ran = sched.run_due(t0, |sched, queue, task| {
            assert!(sched.enqueue(queue, task, t0));
        });
        assert_eq!(ran, 1);
        assert_eq!(sched.queue(QueueId::Immediate).pending(), &[Task::Build]);
        assert!(sched.queue(QueueId::Immediate).is_armed());
        assert_eq!(sched.run_due(t0, |_, _, _| {}), 1);
        assert!(sched.is_idle());
    }

    #[test]
    fn cancelling_last_task_disarms_timer() {
        let t0 = Instant::now();
        let mut sched = UpdateScheduler::default();
        sched.enqueue(QueueId::Debounced, Task::Build, t0);
        sched.enqueue(QueueId::Debounced, Task::Check, t0);
        assert!(sched.cancel(QueueId::Debounced, &Task::Build));
        assert!(sched.queue(QueueId::Debounced).is_armed());
        assert!(sched.cancel(QueueId::Debounced, &Task::Check));
        assert!(!sched.queue(QueueId::Debounced).is_armed());
        assert!(!sched.cancel(QueueId::Debounced, &Task::Check));
        assert_eq!(sched.run_due(t0 + ms(500), |_, _, _| {}), 0);
    }

    #[test]
    fn cancel_everywhere_clears_both_queues() {
        let t0 = Instant::now();
        let mut sched = UpdateScheduler::default();
        sched.enqueue(QueueId::Immediate, Task::Build, t0);
        sched.enqueue(QueueId::Debounced, Task::Build, t0);
        assert!(sched.cancel_everywhere(&Task::Build));
        assert!(sched.is_idle());
        assert_eq!(sched.next_deadline(), None);
    }

    #[test]
    fn panicking_task_leaves_queue_disarmed() {
        let t0 = Instant::now();
        let mut sched = UpdateScheduler::default();
        sched.enqueue(QueueId::Immediate, Task::Build, t0);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            sched.run_due(t0, |_, _, _| panic!("measurement failed"));
        }));
        assert!(outcome.is_err());
        assert!(sched.is_idle());
        assert!(sched.queue(QueueId::Immediate).pending().is_empty());
    }

    #[test]
    fn earlier_deadline_runs_first() {
        let t0 = Instant::now();
        let mut sched = UpdateScheduler::default();
        sched.enqueue(QueueId::Debounced, Task::Check, t0);
        sched.enqueue(QueueId::Immediate, Task::Build, t0 + ms(100));
        let order: Vec<QueueId> = sched
            .take_due(t0 + ms(100))
            .into_iter()
            .map(|(queue, _)| queue)
            .collect();
        assert_eq!(order, vec![QueueId::Debounced, QueueId::Immediate]);
    }
}
