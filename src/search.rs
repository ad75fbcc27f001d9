//! Debounced commit of the search box. [`SearchInput`] doesn't own a clock;
//! callers pass the current time, expressed as a [`Duration`] since any fixed
//! epoch, and poll for due commits from their event loop.

use std::time::Duration;

/// The default quiet period between the last keystroke and the commit.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(300);

#[derive(Clone, Debug, PartialEq, Eq)]
struct Pending {
    value: String,
    due: Duration,
}

/// Turns raw keystrokes into search-query commits. Typing schedules a commit
/// once `cooldown` has passed since the last keystroke; confirming commits
/// right away. There is at most one pending commit.
#[derive(Clone, Debug)]
pub struct SearchInput {
    cooldown: Duration,
    pending: Option<Pending>,
}

impl Default for SearchInput {
    fn default() -> Self {
        SearchInput::new(DEFAULT_COOLDOWN)
    }
}

impl SearchInput {
    /// An idle search box which commits after `cooldown` without input.
    pub fn new(cooldown: Duration) -> SearchInput {
        SearchInput {
            cooldown,
            pending: None,
        }
    }

    /// The quiet period before a keystroke is committed.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Records a keystroke which left the box holding `value`. Any pending
    /// commit is cancelled and a new one scheduled for `now + cooldown`.
    pub fn input(&mut self, value: &str, now: Duration) {
        self.pending = Some(Pending {
            value: value.to_owned(),
            due: now + self.cooldown,
        });
    }

    /// The "Enter" action: cancels any pending commit and returns `value` for
    /// immediate commit.
    pub fn confirm(&mut self, value: &str) -> String {
        self.pending = None;
        value.to_owned()
    }

    /// Returns the pending value if its deadline has been reached at `now`,
    /// clearing it.
    pub fn poll(&mut self, now: Duration) -> Option<String> {
        let due = self.pending.as_ref()?.due;
        match due <= now {
            true => self.pending.take().map(|p| p.value),
            false => None,
        }
    }

    /// When the pending commit falls due, if there is one.
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Drops any pending commit.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
