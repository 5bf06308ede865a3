//! Cancellable timers feeding the event queue
//!
//! A [`TimerHandle`] owns at most one spawned task. Arming it again, calling
//! [`TimerHandle::cancel`] or dropping it aborts the previous task, so no two
//! ticks of the same timer can ever be pending from different arms. Every arm
//! bumps a generation number that the task stamps on its events; the loop
//! drops events whose generation is no longer current.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::event::Event;

/// Owner of one background timer task
#[derive(Debug, Default)]
pub struct TimerHandle {
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl TimerHandle {
    /// An unarmed timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the running task with the future built by `build`.
    ///
    /// `build` receives the new generation. Returns that generation.
    pub fn spawn_with<F, Fut>(&mut self, build: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        self.task = Some(tokio::spawn(build(self.generation)));
        self.generation
    }

    /// Send `make(generation)` every `period`, the first time after one period
    pub fn arm_interval<F>(&mut self, period: Duration, events: UnboundedSender<Event>, make: F) -> u64
    where
        F: Fn(u64) -> Event + Send + 'static,
    {
        self.spawn_with(move |generation| async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(make(generation)).is_err() {
                    break;
                }
            }
        })
    }

    /// Send `make(generation)` once after `delay`
    pub fn arm_once<F>(&mut self, delay: Duration, events: UnboundedSender<Event>, make: F) -> u64
    where
        F: FnOnce(u64) -> Event + Send + 'static,
    {
        self.spawn_with(move |generation| async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(make(generation));
        })
    }

    /// Abort the task, returning whether it was still running
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                let running = !task.is_finished();
                task.abort();
                running
            }
            None => false,
        }
    }

    /// A task is armed and has not finished
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// Whether `generation` belongs to the currently armed task
    pub fn is_current(&self, generation: u64) -> bool {
        self.task.is_some() && generation == self.generation
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
