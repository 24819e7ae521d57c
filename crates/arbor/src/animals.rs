//! Pool of short names used when the user leaves a branch name empty.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

pub const ANIMAL_NAMES: &[&str] = &[
    "albatross", "alpaca", "badger", "beaver", "bison", "bobcat", "capybara", "caribou",
    "cheetah", "cobra", "condor", "cougar", "coyote", "crane", "dingo", "dolphin", "eagle",
    "falcon", "ferret", "finch", "gazelle", "gecko", "gibbon", "heron", "hyena", "ibex",
    "iguana", "jackal", "jaguar", "koala", "lemur", "lynx", "magpie", "marmot", "meerkat",
    "mongoose", "moose", "narwhal", "ocelot", "osprey", "otter", "panda", "pelican",
    "penguin", "puffin", "quokka", "raccoon", "raven", "salmon", "stoat", "tapir", "toucan",
    "walrus", "weasel", "wombat", "yak", "zebra",
];

/// Pick a name not in `used`, or `None` when the pool is exhausted.
pub fn pick_unused_name(used: &HashSet<String>) -> Option<String> {
    let unused: Vec<&str> = ANIMAL_NAMES
        .iter()
        .copied()
        .filter(|name| !used.contains(*name))
        .collect();
    if unused.is_empty() {
        return None;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    let index = (nanos % unused.len() as u128) as usize;
    unused.get(index).map(|name| name.to_string())
}
