//! The crawl frontier
//!
//! Owned by the scheduler alone. It tracks:
//! - Pending routes per domain and each domain's last dispatch time
//! - The visited set of completed `(host, route)` pairs
//! - Work currently out with a worker
//! - Domains renamed by a permanent redirect

use crate::crawler::WorkItem;
use crate::state::FrontierEntry;
use crate::url::split_url;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Outcome of asking the frontier for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A work item, already stamped and marked in flight
    Work(WorkItem),
    /// Routes are pending but no domain is eligible before this delay
    Wait(Duration),
    /// Nothing is pending
    Exhausted,
}

/// Pending work grouped by domain, plus the visited set
#[derive(Debug)]
pub struct Frontier {
    entries: HashMap<String, FrontierEntry>,
    visited: HashMap<String, HashSet<String>>,
    in_flight: HashSet<(String, String)>,
    aliases: HashMap<String, String>,
    window: Duration,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `window` - Minimum spacing between two dispatches to one domain
    pub fn new(window: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            visited: HashMap::new(),
            in_flight: HashSet::new(),
            aliases: HashMap::new(),
            window,
        }
    }

    /// Creates a frontier holding the seed domain with route `/`
    pub fn with_seed(window: Duration, host: &str, prefix: Option<String>) -> Self {
        let mut frontier = Self::new(window);
        frontier.seed(host, prefix);
        frontier
    }

    /// Adds a domain with its prefix and a pending `/`
    pub fn seed(&mut self, host: &str, prefix: Option<String>) {
        let entry = self
            .entries
            .entry(host.to_string())
            .or_insert_with(|| FrontierEntry::new(None));
        entry.prefix = prefix;
        entry.routes.insert("/".to_string());
    }

    /// Picks the next work item
    ///
    /// Among domains with pending routes whose politeness window has
    /// passed, the one dispatched least recently wins. Its route is removed,
    /// prefixed, marked in flight and the domain is stamped with `now`.
    pub fn next_work_item(&mut self, now: Instant) -> Selection {
        let window = self.window;
        let mut min_wait: Option<Duration> = None;
        let mut chosen: Option<(&String, Option<Instant>)> = None;

        for (host, entry) in self.entries.iter().filter(|(_, e)| e.has_pending()) {
            if let Some(wait) = entry.time_until_eligible(window, now) {
                min_wait = Some(min_wait.map_or(wait, |current| current.min(wait)));
                continue;
            }

            let older = match chosen {
                None => true,
                Some((_, current)) => match (entry.last_connection_at, current) {
                    (None, Some(_)) => true,
                    (Some(candidate), Some(current)) => candidate < current,
                    _ => false,
                },
            };
            if older {
                chosen = Some((host, entry.last_connection_at));
            }
        }

        let host = match chosen {
            Some((host, _)) => host.clone(),
            None => {
                return match min_wait {
                    Some(wait) => Selection::Wait(wait),
                    None => Selection::Exhausted,
                }
            }
        };

        let Some(entry) = self.entries.get_mut(&host) else {
            return Selection::Exhausted;
        };
        let Some(route) = entry.take_route() else {
            return Selection::Exhausted;
        };

        let route = entry.full_route(&route);
        entry.record_dispatch(now);
        self.in_flight.insert((host.clone(), route.clone()));

        tracing::trace!("Selected {}{} for dispatch", host, route);
        Selection::Work(WorkItem { host, route })
    }

    /// Records a finished work item as visited
    pub fn record_completion(&mut self, host: &str, route: &str) {
        self.in_flight.remove(&(host.to_string(), route.to_string()));
        self.visited
            .entry(host.to_string())
            .or_default()
            .insert(route.to_string());
    }

    /// Moves a domain's entry to a new host key after a permanent redirect
    ///
    /// The new host is followed through existing aliases, so a redirect to
    /// an already-moved domain lands on that domain's current key. Pending
    /// routes are merged into an existing target entry. Links found later
    /// for the old host are enqueued under the target.
    pub fn migrate(&mut self, old_host: &str, new_host: &str) {
        if old_host == new_host {
            return;
        }

        let mut target = self.resolve_host(new_host).to_string();
        if target == old_host {
            // new_host's chain leads back here; cut it so new_host is terminal
            self.aliases.remove(new_host);
            target = new_host.to_string();
        }

        if let Some(old_entry) = self.entries.remove(old_host) {
            match self.entries.get_mut(&target) {
                Some(entry) => entry.merge(old_entry),
                None => {
                    self.entries.insert(target.clone(), old_entry);
                }
            }
        }

        tracing::debug!("Migrated frontier entry {} -> {}", old_host, target);
        self.aliases.insert(old_host.to_string(), target);
    }

    /// Enqueues an absolute link
    ///
    /// # Returns
    ///
    /// * `true` - If the route was added to its domain's pending set
    /// * `false` - If it was visited, in flight or already pending
    pub fn add_link(&mut self, link: &str) -> bool {
        let split = split_url(link);
        if split.link_host.is_empty() {
            return false;
        }
        self.add_route(&split.link_host, &split.route)
    }

    /// Enqueues a route for a host, following redirect aliases
    pub fn add_route(&mut self, host: &str, route: &str) -> bool {
        let host = self.resolve_host(host).to_string();

        let entry = self
            .entries
            .entry(host.clone())
            .or_insert_with(|| FrontierEntry::new(None));
        let full_route = entry.full_route(route);

        let seen = self
            .visited
            .get(&host)
            .map_or(false, |routes| routes.contains(&full_route))
            || self.in_flight.contains(&(host.clone(), full_route));
        if seen {
            return false;
        }

        entry.routes.insert(route.to_string())
    }

    /// Follows redirect aliases to the host currently holding a domain's work
    pub fn resolve_host<'a>(&'a self, host: &'a str) -> &'a str {
        let mut current = host;
        for _ in 0..=self.aliases.len() {
            match self.aliases.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    pub fn is_visited(&self, host: &str, route: &str) -> bool {
        self.visited
            .get(host)
            .map_or(false, |routes| routes.contains(route))
    }

    pub fn entry(&self, host: &str) -> Option<&FrontierEntry> {
        self.entries.get(host)
    }

    /// Number of domains known to the frontier
    pub fn domain_count(&self) -> usize {
        self.entries.len()
    }

    /// Total pending routes across all domains
    pub fn pending_routes(&self) -> usize {
        self.entries.values().map(|e| e.routes.len()).sum()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.values().map(HashSet::len).sum()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
