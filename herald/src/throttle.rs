use crate::command::Throttling;
use crate::twilight_exports::{Id, UserMarker};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::time::Instant;

/// The usages of a command by a user within the current window.
#[derive(Debug, Clone, Copy)]
struct Throttle {
    usages: u32,
    expires: Instant,
}

/// Usage windows of every command, keyed by command name and user.
///
/// Windows start at the first usage and are dropped once they elapse.
#[derive(Default)]
pub struct Throttles {
    entries: Mutex<HashMap<(&'static str, Id<UserMarker>), Throttle>>,
}

impl Throttles {
    pub fn new() -> Self {
        Self::default()
    }

    fn prune(entries: &mut HashMap<(&'static str, Id<UserMarker>), Throttle>, now: Instant) {
        entries.retain(|_, throttle| throttle.expires > now);
    }

    /// Checks whether the user may use the command, returning the seconds left in the window if
    /// not. Opens a new window if there is none.
    pub fn check(&self, command: &'static str, user_id: Id<UserMarker>, throttling: &Throttling) -> Option<f64> {
        let now = Instant::now();
        let mut lock = self.entries.lock();
        Self::prune(&mut lock, now);

        let throttle = lock.entry((command, user_id)).or_insert(Throttle {
            usages: 0,
            expires: now + throttling.duration,
        });

        if throttle.usages + 1 > throttling.usages {
            let remaining = throttle.expires.saturating_duration_since(now);
            Some(remaining.as_secs_f64())
        } else {
            None
        }
    }

    /// Counts a usage of the command in the current window of the user.
    pub fn record(&self, command: &'static str, user_id: Id<UserMarker>, throttling: &Throttling) {
        let now = Instant::now();
        let mut lock = self.entries.lock();
        Self::prune(&mut lock, now);

        lock.entry((command, user_id))
            .or_insert(Throttle {
                usages: 0,
                expires: now + throttling.duration,
            })
            .usages += 1;
    }
}
