/// Whole-second countdown that can be paused, resumed and reset.
///
/// The countdown holds no timer of its own: the owner of the instance calls
/// [`Countdown::tick`] once per elapsed second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Countdown {
    duration: u32,
    remaining: u32,
    paused: bool,
}

impl Countdown {
    /// A full, paused countdown.
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            paused: true,
        }
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Refills the countdown without changing whether it runs.
    pub fn reset(&mut self) {
        self.remaining = self.duration;
    }

    /// Refills and starts the countdown.
    pub fn restart(&mut self) {
        self.reset();
        self.resume();
    }

    /// Advances one second. Returns true exactly when the countdown expires,
    /// after which it stays paused until restarted.
    pub fn tick(&mut self) -> bool {
        if self.paused || self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.paused = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_countdown_does_not_advance() {
        let mut clock = Countdown::new(2);
        assert!(!clock.tick());
        assert_eq!(clock.remaining(), 2);
    }

    #[test]
    fn expires_once_then_stays_paused() {
        let mut clock = Countdown::new(2);
        clock.resume();
        assert!(!clock.tick());
        assert!(clock.tick());
        assert!(clock.is_paused());
        assert!(!clock.tick());

        clock.restart();
        assert_eq!(clock.remaining(), 2);
        assert!(!clock.is_paused());
    }

    #[test]
    fn pause_keeps_remaining_time() {
        let mut clock = Countdown::new(5);
        clock.resume();
        clock.tick();
        clock.pause();
        clock.tick();
        clock.resume();
        assert_eq!(clock.remaining(), 4);
    }
}
