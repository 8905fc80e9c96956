//! Script-owned timers.
//!
//! A timer belongs to the script that started it and dies with it. When it
//! fires, the engine calls the script function named by the timer and drops
//! the timer. While the script is suspended its timers freeze, and on
//! resume their expiration dates shift by the suspension duration.

/// One pending timer of a script.
#[derive(Debug, Clone)]
pub struct ScriptTimer {
    /// Global Lua function invoked when the timer expires.
    pub callback: String,
    pub expiration_date: u32,
    pub suspended: bool,
    suspended_since: u32,
    /// Plays the tick-tock sound while running, hurrying near the end.
    pub with_sound: bool,
    pub next_sound_date: u32,
}

impl ScriptTimer {
    pub fn new(callback: impl Into<String>, duration: u32, with_sound: bool, now: u32) -> Self {
        ScriptTimer {
            callback: callback.into(),
            expiration_date: now + duration,
            suspended: false,
            suspended_since: 0,
            with_sound,
            next_sound_date: now,
        }
    }

    pub fn is_finished(&self, now: u32) -> bool {
        !self.suspended && now >= self.expiration_date
    }

    pub fn set_suspended(&mut self, suspended: bool, now: u32) {
        if suspended == self.suspended {
            return;
        }
        self.suspended = suspended;
        if !suspended {
            let offset = now - self.suspended_since;
            self.expiration_date += offset;
            self.next_sound_date += offset;
        } else {
            self.suspended_since = now;
        }
    }

    /// The tick sound to play at `now`, if any: tick-tock every second,
    /// hurried to 250 ms in the last 6 seconds.
    pub fn sound_due(&mut self, now: u32) -> bool {
        if !self.with_sound || self.suspended || now < self.next_sound_date {
            return false;
        }
        let remaining = self.expiration_date.saturating_sub(now);
        self.next_sound_date = now + if remaining <= 6000 { 250 } else { 1000 };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspension_shifts_the_deadline() {
        let mut timer = ScriptTimer::new("on_timer", 1000, false, 0);
        assert!(!timer.is_finished(999));
        timer.set_suspended(true, 500);
        assert!(!timer.is_finished(5000));
        timer.set_suspended(false, 2500);
        assert!(!timer.is_finished(2999));
        assert!(timer.is_finished(3000));
    }

    #[test]
    fn tick_sound_hurries_near_the_end() {
        let mut timer = ScriptTimer::new("on_timer", 10_000, true, 0);
        assert!(timer.sound_due(0));
        assert!(!timer.sound_due(500));
        assert!(timer.sound_due(1000));
        // inside the last 6 seconds the cadence drops to 250 ms
        assert!(timer.sound_due(5000));
        assert!(timer.sound_due(5250));
    }
}
