//! Decides when the renderer draws.
//!
//! [`AnimationDriver`] is a small state machine sitting between whatever
//! produces display-refresh callbacks (a winit window, a test harness) and the
//! thing that actually draws. It keeps at most one frame request in flight,
//! cancels that request before issuing another, and drops callbacks carrying
//! a token it no longer expects.

use std::collections::VecDeque;

/// Identifies one outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Source of "draw on the next display refresh" callbacks.
pub trait FrameScheduler {
    /// Asks for one callback. The returned token comes back through
    /// [`AnimationDriver::on_frame`] when the frame fires.
    fn request_frame(&mut self) -> FrameToken;
    /// Withdraws a request. Cancelling a token that already fired is a no-op.
    fn cancel(&mut self, token: FrameToken);
}

/// Something that can draw one frame.
pub trait FrameSink {
    type Error;

    fn draw(&mut self) -> Result<(), Self::Error>;
}

/// Inputs that decide whether the surface has to keep redrawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverInputs {
    pub animated_gradient: bool,
    pub shimmer_speed: f32,
    pub paused: bool,
}

impl DriverInputs {
    pub fn wants_animation(&self) -> bool {
        !self.paused && (self.animated_gradient || self.shimmer_speed != 0.0)
    }
}

impl Default for DriverInputs {
    fn default() -> Self {
        Self {
            animated_gradient: false,
            shimmer_speed: 0.0,
            paused: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Draws once per change and never schedules on its own.
    Static,
    /// Requests a new frame after every draw.
    Animating,
    /// Torn down; every entry point is a no-op.
    Stopped,
}

pub struct AnimationDriver<S: FrameScheduler> {
    scheduler: S,
    inputs: DriverInputs,
    state: DriverState,
    pending: Option<FrameToken>,
}

impl<S: FrameScheduler> AnimationDriver<S> {
    /// Creates a driver that has not drawn yet. Call [`start`](Self::start)
    /// once the sink is ready.
    pub fn new(scheduler: S, inputs: DriverInputs) -> Self {
        Self {
            scheduler,
            inputs,
            state: state_for(&inputs),
            pending: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn inputs(&self) -> DriverInputs {
        self.inputs
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Performs the initial draw.
    pub fn start<K: FrameSink>(&mut self, sink: &mut K) -> Result<(), K::Error> {
        self.redraw(sink)
    }

    /// Applies new inputs and redraws.
    ///
    /// Identical inputs still redraw; callers use this for geometry and noise
    /// changes too, which the driver cannot observe itself.
    pub fn update<K: FrameSink>(
        &mut self,
        inputs: DriverInputs,
        sink: &mut K,
    ) -> Result<(), K::Error> {
        if self.state == DriverState::Stopped {
            return Ok(());
        }
        let next = state_for(&inputs);
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, "animation driver transition");
        }
        self.inputs = inputs;
        self.state = next;
        self.redraw(sink)
    }

    /// Redraws with unchanged inputs, e.g. after a resize.
    pub fn invalidate<K: FrameSink>(&mut self, sink: &mut K) -> Result<(), K::Error> {
        self.redraw(sink)
    }

    /// Handles a fired frame request.
    ///
    /// Returns `Ok(false)` when the token is stale and nothing was drawn. A
    /// failed draw still schedules the next frame while animating, so one bad
    /// frame does not stop the animation.
    pub fn on_frame<K: FrameSink>(
        &mut self,
        token: FrameToken,
        sink: &mut K,
    ) -> Result<bool, K::Error> {
        if self.state == DriverState::Stopped || self.pending != Some(token) {
            tracing::trace!(token = token.id(), "ignoring stale frame callback");
            return Ok(false);
        }
        self.pending = None;
        let result = sink.draw();
        self.schedule_if_animating();
        result.map(|()| true)
    }

    /// Cancels any outstanding request and refuses further work.
    pub fn stop(&mut self) {
        self.cancel_pending();
        if self.state != DriverState::Stopped {
            tracing::debug!(from = ?self.state, "animation driver stopped");
        }
        self.state = DriverState::Stopped;
    }

    fn redraw<K: FrameSink>(&mut self, sink: &mut K) -> Result<(), K::Error> {
        if self.state == DriverState::Stopped {
            return Ok(());
        }
        self.cancel_pending();
        let result = sink.draw();
        self.schedule_if_animating();
        result
    }

    fn schedule_if_animating(&mut self) {
        if self.state != DriverState::Animating {
            return;
        }
        self.cancel_pending();
        self.pending = Some(self.scheduler.request_frame());
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(token);
        }
    }
}

impl<S: FrameScheduler> Drop for AnimationDriver<S> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn state_for(inputs: &DriverInputs) -> DriverState {
    if inputs.wants_animation() {
        DriverState::Animating
    } else {
        DriverState::Static
    }
}

/// Scheduler that only fires when told to.
///
/// Used by tests and by headless runs that step frames explicitly.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    outstanding: VecDeque<FrameToken>,
    requested: usize,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the oldest outstanding request.
    pub fn fire_next(&mut self) -> Option<FrameToken> {
        self.outstanding.pop_front()
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Total number of requests ever issued.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Total number of requests withdrawn before firing.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        self.requested += 1;
        let token = FrameToken::new(self.next_id);
        self.outstanding.push_back(token);
        token
    }

    fn cancel(&mut self, token: FrameToken) {
        let before = self.outstanding.len();
        self.outstanding.retain(|pending| *pending != token);
        if self.outstanding.len() != before {
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSink {
        draws: usize,
        fail_next: bool,
    }

    impl FrameSink for CountingSink {
        type Error = &'static str;

        fn draw(&mut self) -> Result<(), Self::Error> {
            self.draws += 1;
            if std::mem::take(&mut self.fail_next) {
                Err("bad gradient")
            } else {
                Ok(())
            }
        }
    }

    fn animated() -> DriverInputs {
        DriverInputs {
            animated_gradient: true,
            ..DriverInputs::default()
        }
    }

    #[test]
    fn static_draws_once_and_never_schedules() {
        let mut driver = AnimationDriver::new(ManualScheduler::new(), DriverInputs::default());
        let mut sink = CountingSink::default();
        driver.start(&mut sink).unwrap();
        assert_eq!(sink.draws, 1);
        assert_eq!(driver.scheduler().requested(), 0);
        assert_eq!(driver.state(), DriverState::Static);
    }

    #[test]
    fn animating_reschedules_after_every_frame() {
        let mut driver = AnimationDriver::new(ManualScheduler::new(), animated());
        let mut sink = CountingSink::default();
        driver.start(&mut sink).unwrap();
        for _ in 0..5 {
            let token = driver.scheduler_mut().fire_next().unwrap();
            assert!(driver.on_frame(token, &mut sink).unwrap());
            assert_eq!(driver.scheduler().outstanding(), 1);
        }
        assert_eq!(sink.draws, 6);
        assert_eq!(driver.scheduler().requested(), 6);
    }

    #[test]
    fn shimmer_change_starts_scheduling() {
        let mut driver = AnimationDriver::new(ManualScheduler::new(), DriverInputs::default());
        let mut sink = CountingSink::default();
        driver.start(&mut sink).unwrap();
        assert_eq!(driver.scheduler().outstanding(), 0);

        let shimmering = DriverInputs {
            shimmer_speed: 1.0,
            ..DriverInputs::default()
        };
        driver.update(shimmering, &mut sink).unwrap();
        assert_eq!(driver.state(), DriverState::Animating);
        assert_eq!(driver.scheduler().outstanding(), 1);
        assert_eq!(sink.draws, 2);
    }

    #[test]
    fn pausing_cancels_the_pending_frame() {
        let mut driver = AnimationDriver::new(ManualScheduler::new(), animated());
        let mut sink = CountingSink::default();
        driver.start(&mut sink).unwrap();
        let stale = driver.pending().unwrap();

        let paused = DriverInputs {
            paused: true,
            ..animated()
        };
        driver.update(paused, &mut sink).unwrap();
        assert_eq!(driver.state(), DriverState::Static);
        assert_eq!(driver.scheduler().outstanding(), 0);
        assert_eq!(driver.scheduler().cancelled(), 1);
        assert_eq!(sink.draws, 2);

        // a callback that raced the cancellation is ignored
        assert!(!driver.on_frame(stale, &mut sink).unwrap());
        assert_eq!(sink.draws, 2);
    }

    #[test]
    fn at_most_one_request_in_flight() {
        let mut driver = AnimationDriver::new(ManualScheduler::new(), animated());
        let mut sink = CountingSink::default();
        driver.start(&mut sink).unwrap();
        driver.invalidate(&mut sink).unwrap();
        driver.update(animated(), &mut sink).unwrap();
        assert_eq!(driver.scheduler().outstanding(), 1);
        assert_eq!(driver.scheduler().cancelled(), 2);
    }

    #[test]
    fn stale_tokens_are_ignored() {
        let mut driver = AnimationDriver::new(ManualScheduler::new(), animated());
        let mut sink = CountingSink::default();
        driver.start(&mut sink).unwrap();
        let first = driver.pending().unwrap();
        driver.invalidate(&mut sink).unwrap();
        assert!(!driver.on_frame(first, &mut sink).unwrap());
        assert!(!driver.on_frame(FrameToken::new(999), &mut sink).unwrap());
        assert_eq!(sink.draws, 2);
    }

    #[test]
    fn failed_frame_keeps_animating() {
        let mut driver = AnimationDriver::new(ManualScheduler::new(), animated());
        let mut sink = CountingSink::default();
        driver.start(&mut sink).unwrap();
        sink.fail_next = true;
        let token = driver.scheduler_mut().fire_next().unwrap();
        assert_eq!(driver.on_frame(token, &mut sink), Err("bad gradient"));
        assert_eq!(driver.scheduler().outstanding(), 1);
    }

    #[test]
    fn stop_cancels_and_ignores_everything_after() {
        let mut driver = AnimationDriver::new(ManualScheduler::new(), animated());
        let mut sink = CountingSink::default();
        driver.start(&mut sink).unwrap();
        let token = driver.pending().unwrap();
        driver.stop();
        assert_eq!(driver.state(), DriverState::Stopped);
        assert_eq!(driver.scheduler().outstanding(), 0);

        assert!(!driver.on_frame(token, &mut sink).unwrap());
        driver.update(animated(), &mut sink).unwrap();
        driver.invalidate(&mut sink).unwrap();
        assert_eq!(sink.draws, 1);
        assert_eq!(driver.scheduler().outstanding(), 0);
    }

    #[test]
    fn paused_animated_gradient_is_static() {
        let inputs = DriverInputs {
            animated_gradient: true,
            shimmer_speed: 2.0,
            paused: true,
        };
        assert!(!inputs.wants_animation());
        let driver = AnimationDriver::new(ManualScheduler::new(), inputs);
        assert_eq!(driver.state(), DriverState::Static);
    }
}
