use serde::{Deserialize, Serialize};

pub const FOCUS_SECONDS: u32 = 25 * 60;
pub const BREAK_SECONDS: u32 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Focus,
    Break,
}

impl TimerMode {
    pub fn duration_seconds(self) -> u32 {
        match self {
            Self::Focus => FOCUS_SECONDS,
            Self::Break => BREAK_SECONDS,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Focus => Self::Break,
            Self::Break => Self::Focus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Break => "break",
        }
    }
}

/// One-shot permit for a single scheduled decrement. Every transition bumps
/// the timer epoch, so a token issued before a pause or mode switch reports
/// stale instead of decrementing twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken {
    epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerExpiry {
    pub ended_mode: TimerMode,
    pub next_mode: TimerMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The token no longer matches the timer epoch or the timer is paused.
    Stale,
    /// Counter decremented; the token for the next second.
    Ticked(TickToken),
    /// Counter reached zero: mode flipped, counter reset, timer paused.
    Expired(TimerExpiry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTimer {
    mode: TimerMode,
    remaining_seconds: u32,
    running: bool,
    epoch: u64,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusTimer {
    pub fn new() -> Self {
        Self {
            mode: TimerMode::Focus,
            remaining_seconds: FOCUS_SECONDS,
            running: false,
            epoch: 0,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Share of the current interval already elapsed, in [0, 1].
    pub fn progress(&self) -> f64 {
        let duration = self.mode.duration_seconds();
        f64::from(duration - self.remaining_seconds.min(duration)) / f64::from(duration)
    }

    /// Transitions to running and hands out the tick permit. Returns None
    /// when already running: the existing permit chain keeps the countdown.
    pub fn start(&mut self) -> Option<TickToken> {
        if self.running {
            return None;
        }
        self.running = true;
        self.epoch += 1;
        Some(TickToken { epoch: self.epoch })
    }

    /// Halts the countdown, preserving the counter exactly.
    pub fn pause(&mut self) {
        self.running = false;
        self.epoch += 1;
    }

    /// Back to paused with the current mode's full duration.
    pub fn reset(&mut self) {
        self.running = false;
        self.epoch += 1;
        self.remaining_seconds = self.mode.duration_seconds();
    }

    /// Paused in `target` with `target`'s full duration. Switching while
    /// running stops the countdown.
    pub fn switch_mode(&mut self, target: TimerMode) {
        self.mode = target;
        self.running = false;
        self.epoch += 1;
        self.remaining_seconds = target.duration_seconds();
    }

    pub fn tick(&mut self, token: TickToken) -> TickOutcome {
        if !self.running || token.epoch != self.epoch {
            return TickOutcome::Stale;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Ticked(TickToken { epoch: self.epoch });
        }

        let ended_mode = self.mode;
        let next_mode = ended_mode.flipped();
        self.running = false;
        self.epoch += 1;
        self.mode = next_mode;
        self.remaining_seconds = next_mode.duration_seconds();
        TickOutcome::Expired(TimerExpiry {
            ended_mode,
            next_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run_ticks(timer: &mut FocusTimer, mut token: TickToken, count: u32) -> TickOutcome {
        let mut outcome = TickOutcome::Ticked(token);
        for _ in 0..count {
            outcome = timer.tick(token);
            match outcome {
                TickOutcome::Ticked(next) => token = next,
                _ => break,
            }
        }
        outcome
    }

    #[test]
    fn initial_state_is_paused_focus_at_full_duration() {
        let timer = FocusTimer::new();
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS);
        assert!(!timer.is_running());
        assert_eq!(timer.progress(), 0.0);
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let mut timer = FocusTimer::new();
        assert!(timer.start().is_some());
        assert!(timer.start().is_none());
        assert!(timer.is_running());
    }

    #[test]
    fn full_focus_interval_expires_into_paused_break() {
        let mut timer = FocusTimer::new();
        let token = timer.start().expect("start issues a token");

        let outcome = run_ticks(&mut timer, token, FOCUS_SECONDS);
        assert_eq!(
            outcome,
            TickOutcome::Expired(TimerExpiry {
                ended_mode: TimerMode::Focus,
                next_mode: TimerMode::Break,
            })
        );
        assert_eq!(timer.mode(), TimerMode::Break);
        assert_eq!(timer.remaining_seconds(), BREAK_SECONDS);
        assert!(!timer.is_running());
    }

    #[test]
    fn break_expiry_flips_back_to_focus() {
        let mut timer = FocusTimer::new();
        timer.switch_mode(TimerMode::Break);
        let token = timer.start().expect("start issues a token");

        let outcome = run_ticks(&mut timer, token, BREAK_SECONDS);
        assert_eq!(
            outcome,
            TickOutcome::Expired(TimerExpiry {
                ended_mode: TimerMode::Break,
                next_mode: TimerMode::Focus,
            })
        );
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS);
    }

    #[test]
    fn pause_then_start_preserves_the_counter() {
        let mut timer = FocusTimer::new();
        let token = timer.start().expect("start issues a token");
        run_ticks(&mut timer, token, 10);
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS - 10);

        timer.pause();
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS - 10);
        let resumed = timer.start().expect("resume issues a token");
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS - 10);

        run_ticks(&mut timer, resumed, 5);
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS - 15);
    }

    #[test]
    fn stale_token_after_pause_does_not_decrement() {
        let mut timer = FocusTimer::new();
        let token = timer.start().expect("start issues a token");
        timer.pause();
        assert_eq!(timer.tick(token), TickOutcome::Stale);
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS);
    }

    #[test]
    fn stale_token_after_mode_switch_does_not_decrement() {
        let mut timer = FocusTimer::new();
        let token = timer.start().expect("start issues a token");
        timer.switch_mode(TimerMode::Break);
        assert_eq!(timer.tick(token), TickOutcome::Stale);
        assert_eq!(timer.remaining_seconds(), BREAK_SECONDS);
        assert!(!timer.is_running());
    }

    #[test]
    fn old_token_is_stale_after_pause_resume() {
        let mut timer = FocusTimer::new();
        let first = timer.start().expect("start issues a token");
        timer.pause();
        let second = timer.start().expect("resume issues a token");

        assert_eq!(timer.tick(first), TickOutcome::Stale);
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS);
        assert!(matches!(timer.tick(second), TickOutcome::Ticked(_)));
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS - 1);
    }

    #[test]
    fn reset_restores_current_mode_duration() {
        let mut timer = FocusTimer::new();
        let token = timer.start().expect("start issues a token");
        run_ticks(&mut timer, token, 100);

        timer.reset();
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS);
        assert!(!timer.is_running());

        timer.switch_mode(TimerMode::Break);
        let token = timer.start().expect("start issues a token");
        run_ticks(&mut timer, token, 30);
        timer.reset();
        assert_eq!(timer.mode(), TimerMode::Break);
        assert_eq!(timer.remaining_seconds(), BREAK_SECONDS);
    }

    #[test]
    fn expiry_invalidates_the_expired_token() {
        let mut timer = FocusTimer::new();
        timer.switch_mode(TimerMode::Break);
        let token = timer.start().expect("start issues a token");
        run_ticks(&mut timer, token, BREAK_SECONDS);

        // A leftover tick from the ended interval must not touch the new one.
        assert_eq!(timer.tick(token), TickOutcome::Stale);
        assert_eq!(timer.remaining_seconds(), FOCUS_SECONDS);
    }

    proptest! {
        #[test]
        fn progress_stays_within_unit_interval(ticks in 0u32..FOCUS_SECONDS) {
            let mut timer = FocusTimer::new();
            let token = timer.start().expect("start issues a token");
            run_ticks(&mut timer, token, ticks);
            let progress = timer.progress();
            prop_assert!((0.0..=1.0).contains(&progress));
        }

        #[test]
        fn expiry_fires_exactly_once_per_interval(extra in 1u32..50u32) {
            let mut timer = FocusTimer::new();
            let mut token = timer.start().expect("start issues a token");
            let mut expiries = 0u32;
            for _ in 0..(FOCUS_SECONDS + extra) {
                match timer.tick(token) {
                    TickOutcome::Ticked(next) => token = next,
                    TickOutcome::Expired(_) => expiries += 1,
                    TickOutcome::Stale => {}
                }
            }
            prop_assert_eq!(expiries, 1);
            prop_assert_eq!(timer.mode(), TimerMode::Break);
            prop_assert!(!timer.is_running());
        }
    }
}
