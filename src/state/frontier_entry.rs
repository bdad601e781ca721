use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Pending work and politeness state for one domain
///
/// Routes are stored as discovered; the prefix is applied when a route is
/// dispatched.
#[derive(Debug, Clone, Default)]
pub struct FrontierEntry {
    /// Routes waiting to be dispatched
    pub routes: HashSet<String>,

    /// Path prefix applied to every dispatched route
    pub prefix: Option<String>,

    /// When work for this domain was last dispatched
    pub last_connection_at: Option<Instant>,
}

impl FrontierEntry {
    /// Creates an empty entry
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            routes: HashSet::new(),
            prefix,
            last_connection_at: None,
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.routes.is_empty()
    }

    /// Checks if the politeness window has passed since the last dispatch
    ///
    /// # Arguments
    ///
    /// * `window` - Minimum spacing between two dispatches
    /// * `now` - The current time instant
    ///
    /// # Returns
    ///
    /// * `true` - If work for this domain may be dispatched now
    /// * `false` - If the last dispatch is still within the window
    pub fn can_dispatch(&self, window: Duration, now: Instant) -> bool {
        match self.last_connection_at {
            Some(last) => now.saturating_duration_since(last) >= window,
            None => true,
        }
    }

    /// Calculates the time until the domain becomes eligible
    ///
    /// Returns None if work can be dispatched now.
    pub fn time_until_eligible(&self, window: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_connection_at?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < window {
            Some(window - elapsed)
        } else {
            None
        }
    }

    /// Records a dispatch at `now`
    pub fn record_dispatch(&mut self, now: Instant) {
        self.last_connection_at = Some(now);
    }

    /// Removes an arbitrary pending route
    pub fn take_route(&mut self) -> Option<String> {
        let route = self.routes.iter().next()?.clone();
        self.routes.remove(&route);
        Some(route)
    }

    /// Returns the route as it is dispatched, with the prefix applied
    ///
    /// Routes already under the prefix are left alone.
    pub fn full_route(&self, route: &str) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() && prefix != "/" => {
                let under_prefix = route == prefix
                    || route
                        .strip_prefix(prefix)
                        .map_or(false, |rest| rest.starts_with('/'));
                if under_prefix {
                    route.to_string()
                } else {
                    format!("{}{}", prefix, route)
                }
            }
            _ => route.to_string(),
        }
    }

    /// Moves another entry's pending routes into this one
    ///
    /// The prefix is kept if set, otherwise taken from `other`; the most
    /// recent dispatch time of the two wins.
    pub fn merge(&mut self, other: FrontierEntry) {
        self.routes.extend(other.routes);
        if self.prefix.is_none() {
            self.prefix = other.prefix;
        }
        self.last_connection_at = match (self.last_connection_at, other.last_connection_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}
