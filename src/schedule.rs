//! Cancellable periodic scheduling for tick-driven components.
//!
//! A [`Scheduler`] hands out a [`TickHandle`] for every periodic schedule it
//! arms. The handle is the only way to cancel that schedule, and [`Scheduler::cancel`]
//! consumes it, so whoever holds the handle owns the tick. Ticks arrive as
//! [`TickMsg`]s tagged with the handle id that produced them.
//!
//! Two schedulers are provided:
//!
//! - [`RuntimeScheduler`] drives ticks through bubbletea-rs commands. Each pending
//!   delivery is disarmed on cancel, so a cancelled schedule produces no message.
//! - [`ManualScheduler`] fires ticks only when asked, for headless hosts and tests.

use bubbletea_rs::{Cmd, Msg};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

static LAST_HANDLE: AtomicU64 = AtomicU64::new(0);

fn next_handle_id() -> u64 {
    LAST_HANDLE.fetch_add(1, Ordering::SeqCst) + 1
}

/// Ownership token for one armed periodic schedule.
///
/// Neither `Clone` nor `Copy`: exactly one owner can cancel it.
#[derive(Debug, PartialEq, Eq)]
pub struct TickHandle {
    id: u64,
}

impl TickHandle {
    /// The id carried by ticks of this schedule.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One periodic tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickMsg {
    handle: u64,
}

impl TickMsg {
    /// Id of the handle whose schedule produced this tick.
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Whether this tick belongs to `handle`.
    pub fn is_from(&self, handle: &TickHandle) -> bool {
        self.handle == handle.id
    }
}

/// Arms, re-arms and cancels periodic ticks.
pub trait Scheduler {
    /// Arms a tick every `period`. Returns the owning handle and the command that
    /// delivers the first tick, if the scheduler delivers through commands.
    fn schedule_periodic(&mut self, period: Duration) -> (TickHandle, Option<Cmd>);

    /// Called after a tick of `handle` was consumed; returns the command for the
    /// next delivery.
    fn rearm(&mut self, handle: &TickHandle) -> Option<Cmd>;

    /// Disarms the schedule. No tick of this handle is delivered afterwards.
    fn cancel(&mut self, handle: TickHandle);

    /// Number of schedules currently armed.
    fn active(&self) -> usize;
}

#[derive(Debug)]
struct Slot {
    period: Duration,
    deadline: Instant,
    disarmed: Arc<AtomicBool>,
}

/// Scheduler backed by the bubbletea-rs runtime's tokio timers.
///
/// Deadlines advance from the moment the schedule was armed rather than from
/// when each tick was processed, so a slow update loop catches up instead of
/// drifting.
#[derive(Debug, Default)]
pub struct RuntimeScheduler {
    slots: HashMap<u64, Slot>,
}

impl RuntimeScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    fn delivery(id: u64, deadline: Instant, disarmed: Arc<AtomicBool>) -> Cmd {
        Box::pin(async move {
            tokio::time::sleep_until(deadline).await;
            if disarmed.load(Ordering::Acquire) {
                return None;
            }
            Some(Box::new(TickMsg { handle: id }) as Msg)
        })
    }
}

impl Scheduler for RuntimeScheduler {
    fn schedule_periodic(&mut self, period: Duration) -> (TickHandle, Option<Cmd>) {
        let id = next_handle_id();
        let slot = Slot {
            period,
            deadline: Instant::now() + period,
            disarmed: Arc::new(AtomicBool::new(false)),
        };
        let cmd = Self::delivery(id, slot.deadline, Arc::clone(&slot.disarmed));
        self.slots.insert(id, slot);
        tracing::trace!(handle = id, ?period, "armed periodic tick");
        (TickHandle { id }, Some(cmd))
    }

    fn rearm(&mut self, handle: &TickHandle) -> Option<Cmd> {
        let slot = self.slots.get_mut(&handle.id)?;
        slot.deadline += slot.period;
        Some(Self::delivery(
            handle.id,
            slot.deadline,
            Arc::clone(&slot.disarmed),
        ))
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(slot) = self.slots.remove(&handle.id) {
            slot.disarmed.store(true, Ordering::Release);
            tracing::trace!(handle = handle.id, "cancelled periodic tick");
        }
    }

    fn active(&self) -> usize {
        self.slots.len()
    }
}

impl Drop for RuntimeScheduler {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            slot.disarmed.store(true, Ordering::Release);
        }
    }
}

/// Scheduler that only ticks when [`ManualScheduler::fire`] is called.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    armed: BTreeMap<u64, Duration>,
    total_armed: usize,
}

impl ManualScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// One tick for every armed schedule, in arming order.
    pub fn fire(&self) -> Vec<TickMsg> {
        self.armed
            .keys()
            .map(|&handle| TickMsg { handle })
            .collect()
    }

    /// How many schedules were ever armed.
    pub fn total_armed(&self) -> usize {
        self.total_armed
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_periodic(&mut self, period: Duration) -> (TickHandle, Option<Cmd>) {
        let id = next_handle_id();
        self.armed.insert(id, period);
        self.total_armed += 1;
        (TickHandle { id }, None)
    }

    fn rearm(&mut self, _handle: &TickHandle) -> Option<Cmd> {
        None
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.armed.remove(&handle.id);
    }

    fn active(&self) -> usize {
        self.armed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_fire_and_cancel() {
        let mut s = ManualScheduler::new();
        let (a, cmd) = s.schedule_periodic(Duration::from_secs(1));
        assert!(cmd.is_none());
        let (b, _) = s.schedule_periodic(Duration::from_secs(1));
        assert_ne!(a.id(), b.id());
        assert_eq!(s.active(), 2);

        let ticks = s.fire();
        assert_eq!(ticks.len(), 2);
        assert!(ticks[0].is_from(&a));

        s.cancel(a);
        let ticks = s.fire();
        assert_eq!(ticks.len(), 1);
        assert!(ticks[0].is_from(&b));
        assert_eq!(s.total_armed(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_delivers_tagged_tick() {
        let mut s = RuntimeScheduler::new();
        let (handle, cmd) = s.schedule_periodic(Duration::from_secs(1));
        let msg = cmd.expect("runtime scheduler returns a command").await;
        let tick = msg
            .as_ref()
            .and_then(|m| m.downcast_ref::<TickMsg>())
            .cloned()
            .expect("tick message");
        assert!(tick.is_from(&handle));

        let next = s.rearm(&handle).expect("rearm while armed");
        assert!(next.await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_cancel_disarms_pending_delivery() {
        let mut s = RuntimeScheduler::new();
        let (handle, cmd) = s.schedule_periodic(Duration::from_secs(1));
        let pending = cmd.expect("command");
        s.cancel(handle);
        assert_eq!(s.active(), 0);
        assert!(pending.await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_after_cancel_is_none() {
        let mut s = RuntimeScheduler::new();
        let (handle, _cmd) = s.schedule_periodic(Duration::from_secs(1));
        let stale = TickHandle { id: handle.id() };
        s.cancel(handle);
        assert!(s.rearm(&stale).is_none());
    }
}
