use std::time::Duration;

use tokio::time::Instant;

use uamon_types::StatusCode;

/// Identifies one registered repeated callback.
pub type CallbackId = u64;

struct RepeatedCallback<C> {
    id: CallbackId,
    interval: Duration,
    next_due: Instant,
    callback: Box<dyn FnMut(&mut C) + Send>,
}

/// A repeating-timer registry driving periodic sampling.
///
/// Callbacks receive mutable access to a context of type `C`, never to
/// the scheduler itself, so firing cannot re-enter the registry. Once
/// `remove_repeated_callback` returns, no further invocation of that
/// callback will start; together with the engine serializing all calls
/// on one `&mut` path, a removed callback can never observe state torn
/// down after its removal.
pub struct SamplingScheduler<C> {
    callbacks: Vec<RepeatedCallback<C>>,
    next_id: CallbackId,
}

impl<C> Default for SamplingScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SamplingScheduler<C> {
    /// An empty scheduler.
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            next_id: 0,
        }
    }

    /// Register `callback` to run every `interval_ms` milliseconds,
    /// first firing one interval from now.
    pub fn add_repeated_callback(
        &mut self,
        callback: impl FnMut(&mut C) + Send + 'static,
        interval_ms: f64,
    ) -> Result<CallbackId, StatusCode> {
        if !interval_ms.is_finite() || interval_ms < 0.0 {
            return Err(StatusCode::BadInvalidArgument);
        }
        let interval = Duration::from_secs_f64(interval_ms / 1000.0);
        self.next_id += 1;
        let id = self.next_id;
        self.callbacks.push(RepeatedCallback {
            id,
            interval,
            next_due: Instant::now() + interval,
            callback: Box::new(callback),
        });
        Ok(id)
    }

    /// Remove a registered callback. After this returns the callback
    /// will not be invoked again.
    pub fn remove_repeated_callback(&mut self, id: CallbackId) -> Result<(), StatusCode> {
        let Some(index) = self.callbacks.iter().position(|cb| cb.id == id) else {
            return Err(StatusCode::BadNotFound);
        };
        self.callbacks.remove(index);
        Ok(())
    }

    /// Run every callback whose deadline has passed, re-arming each for
    /// its next interval. Ticks missed while the caller was away are
    /// coalesced into a single firing rather than replayed.
    ///
    /// Returns the number of callbacks fired.
    pub fn run_due(&mut self, now: Instant, ctx: &mut C) -> usize {
        let mut fired = 0;
        for cb in &mut self.callbacks {
            if cb.next_due > now {
                continue;
            }
            (cb.callback)(ctx);
            fired += 1;
            cb.next_due += cb.interval;
            if cb.next_due <= now {
                cb.next_due = now + cb.interval;
            }
        }
        fired
    }

    /// The earliest deadline among registered callbacks, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.callbacks.iter().map(|cb| cb.next_due).min()
    }

    /// The number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// True when no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove() {
        let mut scheduler: SamplingScheduler<u32> = SamplingScheduler::new();
        let id = scheduler.add_repeated_callback(|count| *count += 1, 100.0).unwrap();
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.remove_repeated_callback(id).is_ok());
        assert!(scheduler.is_empty());
        assert_eq!(
            scheduler.remove_repeated_callback(id),
            Err(StatusCode::BadNotFound)
        );
    }

    #[test]
    fn rejects_invalid_interval() {
        let mut scheduler: SamplingScheduler<u32> = SamplingScheduler::new();
        assert_eq!(
            scheduler
                .add_repeated_callback(|_| {}, -1.0)
                .unwrap_err(),
            StatusCode::BadInvalidArgument
        );
        assert_eq!(
            scheduler
                .add_repeated_callback(|_| {}, f64::NAN)
                .unwrap_err(),
            StatusCode::BadInvalidArgument
        );
    }

    #[test]
    fn fires_when_due() {
        let mut scheduler: SamplingScheduler<u32> = SamplingScheduler::new();
        scheduler.add_repeated_callback(|count| *count += 1, 50.0).unwrap();
        let mut count = 0u32;

        // Not yet due
        assert_eq!(scheduler.run_due(Instant::now(), &mut count), 0);
        assert_eq!(count, 0);

        let later = Instant::now() + Duration::from_millis(55);
        assert_eq!(scheduler.run_due(later, &mut count), 1);
        assert_eq!(count, 1);

        // Re-armed relative to the last firing
        assert_eq!(scheduler.run_due(later, &mut count), 0);
        assert_eq!(
            scheduler.run_due(later + Duration::from_millis(55), &mut count),
            1
        );
        assert_eq!(count, 2);
    }

    #[test]
    fn missed_ticks_coalesce() {
        let mut scheduler: SamplingScheduler<u32> = SamplingScheduler::new();
        scheduler.add_repeated_callback(|count| *count += 1, 10.0).unwrap();
        let mut count = 0u32;
        let much_later = Instant::now() + Duration::from_secs(10);
        assert_eq!(scheduler.run_due(much_later, &mut count), 1);
        assert_eq!(count, 1);
        let deadline = scheduler.next_deadline().unwrap();
        assert!(deadline > much_later);
    }

    #[test]
    fn next_deadline_tracks_earliest() {
        let mut scheduler: SamplingScheduler<u32> = SamplingScheduler::new();
        assert!(scheduler.next_deadline().is_none());
        scheduler.add_repeated_callback(|_| {}, 500.0).unwrap();
        scheduler.add_repeated_callback(|_| {}, 20.0).unwrap();
        let deadline = scheduler.next_deadline().unwrap();
        assert!(deadline <= Instant::now() + Duration::from_millis(20));
    }
}
