//! Identity-keyed caches for the source mapper.
//!
//! Keys are the addresses of `Rc` allocations, never values: two equal
//! literal nodes at different places in a tree are different keys, while two
//! clones of one handle are the same key.
//!
//! Every entry holds both the original and its twin strongly, so a key
//! address cannot be reused by another allocation while the entry exists and
//! a twin lives at least as long as the cache that produced it.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::command::{Command, RedirectModifier};
use crate::suggestion::SuggestionProvider;
use crate::tree::{ArgumentCommandNode, LiteralCommandNode, RootCommandNode};

/// A shared handle whose identity is the allocation it points to.
pub(crate) trait Identity: Clone + 'static {
    fn addr(&self) -> usize;
}

macro_rules! rc_identity {
    ($($handle:ident),* $(,)?) => {
        $(
            impl<S: 'static> Identity for $handle<S> {
                fn addr(&self) -> usize {
                    Rc::as_ptr(&self.inner) as *const () as usize
                }
            }
        )*
    };
}

rc_identity!(
    Command,
    RedirectModifier,
    SuggestionProvider,
    LiteralCommandNode,
    ArgumentCommandNode,
    RootCommandNode,
);

struct Forward {
    /// Keeps the key allocation alive.
    _original: Box<dyn Any>,
    remapped: Box<dyn Any>,
    remapped_addr: usize,
}

struct Reverse {
    /// Keeps the key allocation alive.
    _remapped: Box<dyn Any>,
    original: Box<dyn Any>,
    original_addr: usize,
}

/// What [`IdentityCache::insert`] did on the reverse side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReverseInsert {
    Inserted,
    AlreadyPresent,
    /// The twin was already mapped back to a different original, which wins.
    Collision { kept: usize },
}

/// Forward (original → twin) and reverse (twin → original) mappings.
#[derive(Default)]
pub(crate) struct IdentityCache {
    forward: HashMap<usize, Forward>,
    reverse: HashMap<usize, Reverse>,
}

impl IdentityCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The twin recorded for `original`.
    pub(crate) fn lookup<A: Identity, B: Identity>(&self, original: &A) -> Option<B> {
        let entry = self.forward.get(&original.addr())?;
        entry.remapped.downcast_ref::<B>().cloned()
    }

    /// Records `original ↔ remapped`.
    ///
    /// Replacing the forward entry of `original` also drops the reverse entry
    /// of the twin it replaced. A reverse entry is only added if the twin has
    /// none yet, so the first original recorded for a twin wins.
    pub(crate) fn insert<A: Identity, B: Identity>(
        &mut self,
        original: &A,
        remapped: &B,
    ) -> ReverseInsert {
        let replaced = self.forward.insert(
            original.addr(),
            Forward {
                _original: Box::new(original.clone()),
                remapped: Box::new(remapped.clone()),
                remapped_addr: remapped.addr(),
            },
        );
        if let Some(stale) = replaced {
            let owned = self
                .reverse
                .get(&stale.remapped_addr)
                .is_some_and(|entry| entry.original_addr == original.addr());
            if stale.remapped_addr != remapped.addr() && owned {
                self.reverse.remove(&stale.remapped_addr);
            }
        }

        if let Some(existing) = self.reverse.get(&remapped.addr()) {
            return if existing.original_addr == original.addr() {
                ReverseInsert::AlreadyPresent
            } else {
                ReverseInsert::Collision {
                    kept: existing.original_addr,
                }
            };
        }
        self.reverse.insert(
            remapped.addr(),
            Reverse {
                _remapped: Box::new(remapped.clone()),
                original: Box::new(original.clone()),
                original_addr: original.addr(),
            },
        );
        ReverseInsert::Inserted
    }

    /// The original recorded for `remapped`, if any.
    pub(crate) fn original_of<A: Identity, B: Identity>(&self, remapped: &B) -> Option<A> {
        self.reverse
            .get(&remapped.addr())
            .and_then(|entry| entry.original.downcast_ref::<A>())
            .cloned()
    }

    /// Number of originals with a recorded twin.
    pub(crate) fn len(&self) -> usize {
        self.forward.len()
    }

    /// Number of twins with a recorded original.
    #[cfg(test)]
    pub(crate) fn reverse_len(&self) -> usize {
        self.reverse.len()
    }
}
