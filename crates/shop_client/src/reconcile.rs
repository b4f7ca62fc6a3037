//! Ordered list reconciliation.
//!
//! Merges a freshly fetched, authoritative list into a locally held one with
//! positional edits, so entries that are still present keep their place (and
//! their instance) instead of being torn down and rebuilt. Both lists are
//! expected to be ordered ascending by `added`, ties in server order.

use std::{collections::HashSet, fmt::Debug, hash::Hash};

use shared::{domain::BoughtItemId, protocol::BoughtItemResource};

/// A record that can take part in a reconciliation walk.
pub trait Reconcilable {
    type Key: Eq + Hash + Clone + Debug;
    type Added: PartialOrd;

    fn key(&self) -> &Self::Key;
    fn added(&self) -> &Self::Added;
}

impl Reconcilable for BoughtItemResource {
    type Key = BoughtItemId;
    type Added = chrono::DateTime<chrono::Utc>;

    fn key(&self) -> &BoughtItemId {
        &self.id
    }

    fn added(&self) -> &Self::Added {
        &self.added
    }
}

/// A single positional change applied to the local list. `index` is the
/// position at the moment the edit was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<K> {
    Insert { index: usize, key: K },
    Remove { index: usize, key: K },
    Replace { index: usize, key: K },
}

impl<K> Edit<K> {
    pub fn index(&self) -> usize {
        match self {
            Edit::Insert { index, .. } | Edit::Remove { index, .. } | Edit::Replace { index, .. } => {
                *index
            }
        }
    }

    pub fn key(&self) -> &K {
        match self {
            Edit::Insert { key, .. } | Edit::Remove { key, .. } | Edit::Replace { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditSummary {
    pub inserted: usize,
    pub removed: usize,
    pub replaced: usize,
}

impl EditSummary {
    pub fn of<K>(edits: &[Edit<K>]) -> Self {
        edits.iter().fold(Self::default(), |mut summary, edit| {
            match edit {
                Edit::Insert { .. } => summary.inserted += 1,
                Edit::Remove { .. } => summary.removed += 1,
                Edit::Replace { .. } => summary.replaced += 1,
            }
            summary
        })
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.removed == 0 && self.replaced == 0
    }
}

enum Step {
    Remove,
    Insert,
    Match,
}

/// Brings `local` in line with `remote`. Entries matched by key are left
/// untouched, even if the remote copy carries different data.
pub fn reconcile<T: Reconcilable>(local: &mut Vec<T>, remote: Vec<T>) -> Vec<Edit<T::Key>> {
    merge(local, remote, |_, _| false)
}

/// Like [`reconcile`], but a matched entry whose remote copy differs is
/// swapped for the remote copy in place and reported as [`Edit::Replace`].
pub fn reconcile_refreshing<T>(local: &mut Vec<T>, remote: Vec<T>) -> Vec<Edit<T::Key>>
where
    T: Reconcilable + PartialEq,
{
    merge(local, remote, |current, incoming| {
        if *current == incoming {
            return false;
        }
        *current = incoming;
        true
    })
}

fn merge<T, F>(local: &mut Vec<T>, remote: Vec<T>, mut on_match: F) -> Vec<Edit<T::Key>>
where
    T: Reconcilable,
    F: FnMut(&mut T, T) -> bool,
{
    debug_assert!(has_unique_keys(local), "duplicate keys in local list");
    debug_assert!(has_unique_keys(&remote), "duplicate keys in remote list");

    let mut edits = Vec::new();
    let mut incoming = remote.into_iter().peekable();
    let mut i = 0;

    loop {
        let step = match (local.get(i), incoming.peek()) {
            (None, None) => break,
            (Some(_), None) => Step::Remove,
            (None, Some(_)) => Step::Insert,
            (Some(current), Some(next)) if current.key() == next.key() => Step::Match,
            // Tie on `added` with different keys falls in here too.
            (Some(current), Some(next)) if next.added() >= current.added() => Step::Remove,
            (Some(_), Some(_)) => Step::Insert,
        };

        match step {
            Step::Remove => {
                let removed = local.remove(i);
                edits.push(Edit::Remove {
                    index: i,
                    key: removed.key().clone(),
                });
            }
            Step::Insert => {
                if let Some(next) = incoming.next() {
                    edits.push(Edit::Insert {
                        index: i,
                        key: next.key().clone(),
                    });
                    local.insert(i, next);
                    i += 1;
                }
            }
            Step::Match => {
                if let Some(next) = incoming.next() {
                    let key = next.key().clone();
                    if on_match(&mut local[i], next) {
                        edits.push(Edit::Replace { index: i, key });
                    }
                    i += 1;
                }
            }
        }
    }

    edits
}

fn has_unique_keys<T: Reconcilable>(items: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().all(|item| seen.insert(item.key()))
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
