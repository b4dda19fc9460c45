//! Display-name assignment
//!
//! Names are chosen when a connection is accepted, outside the hub. The
//! generator is injected through [`GatewayState`](crate::server::GatewayState).

use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of display names for new sessions
pub trait NameGenerator: Send + Sync {
    /// Produce the name for the next session
    fn next_name(&self) -> String;
}

/// Base names the random generator draws from
pub const DEFAULT_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Donald", "Edsger", "Frances", "Grace", "Ivan",
    "John", "Ken", "Leslie", "Margaret", "Niklaus", "Radia", "Robin", "Sophie", "Tony", "Whitfield",
];

/// Random base name plus the last group of a fresh UUID (e.g. `Grace-3f2a9c0d41b7`)
#[derive(Debug, Clone)]
pub struct RandomNameGenerator {
    names: Vec<String>,
}

impl RandomNameGenerator {
    /// Draw base names from `names`; an empty list falls back to `guest`
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for RandomNameGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NAMES.iter().copied())
    }
}

impl NameGenerator for RandomNameGenerator {
    fn next_name(&self) -> String {
        let base = self
            .names
            .choose(&mut rand::thread_rng())
            .map_or("guest", String::as_str);
        let id = uuid::Uuid::new_v4().to_string();
        let suffix = id.rsplit('-').next().unwrap_or(&id);
        format!("{base}-{suffix}")
    }
}

/// Hands out names in order, then `guest-N` once the list is exhausted
#[derive(Debug)]
pub struct SequentialNameGenerator {
    names: Vec<String>,
    next: AtomicUsize,
}

impl SequentialNameGenerator {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl NameGenerator for SequentialNameGenerator {
    fn next_name(&self) -> String {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("guest-{}", index + 1))
    }
}
