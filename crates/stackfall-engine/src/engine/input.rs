use serde::{Deserialize, Serialize};

use crate::config::GameSettings;

/// A discrete player command, already decoded from whatever input device the host uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    Rotate,
    Hold,
    Pause,
    Escape,
    Restart,
    /// Generic "confirm" key used to leave the title and controls screens.
    Start,
}

/// Outcome of [`GameSession::handle_command`](super::GameSession::handle_command).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "camelCase")]
pub enum CommandResult {
    /// The command changed the session.
    Applied,
    /// The command was valid in this phase but had no effect (collision, hold already used).
    Rejected,
    /// The command does not apply to the current phase, or arrived inside its debounce window.
    Ignored,
}

/// Commands whose repeat rate is limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleClass {
    Move,
    Rotate,
    SoftDrop,
}

impl ThrottleClass {
    const ALL: [Self; 3] = [Self::Move, Self::Rotate, Self::SoftDrop];

    const fn index(self) -> usize {
        match self {
            Self::Move => 0,
            Self::Rotate => 1,
            Self::SoftDrop => 2,
        }
    }
}

impl Command {
    /// Returns the debounce class of the command, or `None` if it is never throttled.
    #[must_use]
    pub const fn throttle_class(self) -> Option<ThrottleClass> {
        match self {
            Self::MoveLeft | Self::MoveRight => Some(ThrottleClass::Move),
            Self::Rotate => Some(ThrottleClass::Rotate),
            Self::SoftDrop => Some(ThrottleClass::SoftDrop),
            Self::HardDrop
            | Self::Hold
            | Self::Pause
            | Self::Escape
            | Self::Restart
            | Self::Start => None,
        }
    }
}

/// Minimum-interval debouncer for repeated commands.
///
/// Times are milliseconds on the session's engine clock. The first command of
/// each class is always accepted; afterwards a command is accepted only once
/// `delay` milliseconds have passed since the last accepted one of its class.
///
/// # Example
///
/// ```
/// use stackfall_engine::{GameConfig, InputThrottle, ThrottleClass};
///
/// let mut throttle = InputThrottle::new(&GameConfig::builtin().game_settings);
/// assert!(throttle.try_accept(ThrottleClass::Move, 0.0));
/// assert!(!throttle.try_accept(ThrottleClass::Move, 50.0));
/// assert!(throttle.try_accept(ThrottleClass::Move, 100.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InputThrottle {
    delays: [f64; 3],
    last_accepted: [Option<f64>; 3],
}

impl InputThrottle {
    #[must_use]
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            delays: [
                settings.move_delay,
                settings.rotate_delay,
                settings.soft_drop_delay,
            ],
            last_accepted: [None; 3],
        }
    }

    /// Returns the configured delay of a class in milliseconds.
    #[must_use]
    pub fn delay(&self, class: ThrottleClass) -> f64 {
        self.delays[class.index()]
    }

    /// Accepts the command at time `now_ms` if its class is outside the debounce window.
    ///
    /// An accepted command opens a new window; a refused one does not.
    pub fn try_accept(&mut self, class: ThrottleClass, now_ms: f64) -> bool {
        let idx = class.index();
        if let Some(last) = self.last_accepted[idx]
            && now_ms < last + self.delays[idx]
        {
            return false;
        }
        self.last_accepted[idx] = Some(now_ms);
        true
    }

    /// Forgets every accepted command, so the next one of each class passes.
    pub fn reset(&mut self) {
        self.last_accepted = [None; ThrottleClass::ALL.len()];
    }
}
