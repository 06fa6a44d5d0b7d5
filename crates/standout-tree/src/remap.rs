//! Remapping command trees to another source type.
//!
//! A [`SourceMapper<S, R>`] turns a tree over sources of type `S` into a twin
//! tree over `R`, given a pair of converters between the two. The twin has
//! the same shape: same names in the same order, same fork flags, the same
//! argument type instances. Callbacks are not copied but wrapped, so running
//! a remapped executor converts its context back to `S` and calls the
//! original.
//!
//! # Identity
//!
//! Every remap is memoized by the identity of what is remapped, so:
//!
//! - a node shared by two parents has one twin, shared by both twins
//! - remapping the same thing again returns the same twin
//! - a redirect back to an ancestor resolves to the ancestor's twin
//!
//! The reverse direction is remembered too: `original_*` returns the
//! original behind a twin, and [`SourceMapper::original_context`] rebinds a
//! context parsed against the twin tree to the original tree.
//!
//! ```rust
//! use standout_tree::{literal, CommandContext, SourceMapper};
//!
//! # fn main() -> Result<(), standout_tree::TreeError> {
//! let node = literal::<i32>("level")
//!     .executes(|ctx: &CommandContext<i32>| Ok(*ctx.source()))
//!     .build()?;
//!
//! let mapper = SourceMapper::new(
//!     |name: &String| name.len() as i32,
//!     |level: &i32| "x".repeat(*level as usize),
//! );
//! let twin = node.map_source(&mapper);
//!
//! assert_eq!(twin.literal(), "level");
//! assert!(mapper.original_literal(&twin)?.ptr_eq(&node));
//! # Ok(())
//! # }
//! ```
//!
//! # Lifetimes
//!
//! The mapper retains every original and every twin until its last handle
//! is dropped. Remapped callbacks only refer back to it weakly, so dropping
//! the mapper frees all twins nobody else holds. A twin kept past that point
//! still has its shape and requirements, but its executor, modifier and
//! suggestion provider fail with [`TreeError::MapperDropped`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::command::{Command, RedirectModifier, Requirement};
use crate::context::CommandContext;
use crate::error::TreeError;
use crate::identity::{Identity, IdentityCache, ReverseInsert};
use crate::suggestion::{SuggestionProvider, SuggestionsBuilder};
use crate::tree::{ArgumentCommandNode, CommandNode, LiteralCommandNode, RootCommandNode};

pub(crate) const COMMAND_KIND: &str = "command";
pub(crate) const LITERAL_KIND: &str = "literal command node";
pub(crate) const ARGUMENT_KIND: &str = "argument command node";
pub(crate) const ROOT_KIND: &str = "root command node";
pub(crate) const NODE_KIND: &str = "command node";
pub(crate) const MODIFIER_KIND: &str = "redirect modifier";
pub(crate) const SUGGESTIONS_KIND: &str = "suggestion provider";

struct Converters<S, R> {
    to_original: Box<dyn Fn(&R) -> S>,
    to_remapped: Box<dyn Fn(&S) -> R>,
}

struct MapperState<S, R> {
    converters: Rc<Converters<S, R>>,
    cache: RefCell<IdentityCache>,
}

/// Remaps trees over `S` to trees over `R`, and back.
///
/// Clones share one cache. The converters are expected to be inverses of
/// each other; nothing checks it.
pub struct SourceMapper<S, R> {
    inner: Rc<MapperState<S, R>>,
}

impl<S: 'static, R: 'static> SourceMapper<S, R> {
    /// Creates a mapper from the two directions of the source conversion.
    pub fn new<F, G>(to_original: F, to_remapped: G) -> Self
    where
        F: Fn(&R) -> S + 'static,
        G: Fn(&S) -> R + 'static,
    {
        debug!(
            "Created source mapper {} -> {}",
            std::any::type_name::<S>(),
            std::any::type_name::<R>()
        );
        Self {
            inner: Rc::new(MapperState {
                converters: Rc::new(Converters {
                    to_original: Box::new(to_original),
                    to_remapped: Box::new(to_remapped),
                }),
                cache: RefCell::new(IdentityCache::new()),
            }),
        }
    }

    pub fn to_original(&self, source: &R) -> S {
        (self.inner.converters.to_original)(source)
    }

    pub fn to_remapped(&self, source: &S) -> R {
        (self.inner.converters.to_remapped)(source)
    }

    /// Number of originals remapped so far.
    pub fn cached_len(&self) -> usize {
        self.inner.cache.borrow().len()
    }

    fn downgrade(&self) -> WeakMapper<S, R> {
        WeakMapper {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The twin of `original`, built with `build` if there is none.
    ///
    /// No borrow of the cache is held while `build` runs, so it may remap
    /// recursively.
    fn compute_if_absent<A, B>(
        &self,
        kind: &'static str,
        original: &A,
        build: impl FnOnce() -> B,
    ) -> B
    where
        A: Identity,
        B: Identity,
    {
        let cached: Option<B> = self.inner.cache.borrow().lookup(original);
        if let Some(twin) = cached {
            trace!("Cache hit for {} {:#x}", kind, original.addr());
            return twin;
        }
        trace!("Cache miss for {} {:#x}", kind, original.addr());
        let twin = build();
        self.register(kind, original, &twin);
        twin
    }

    /// Records `original ↔ remapped` in both directions.
    pub(crate) fn register<A: Identity, B: Identity>(
        &self,
        kind: &'static str,
        original: &A,
        remapped: &B,
    ) {
        let outcome = self.inner.cache.borrow_mut().insert(original, remapped);
        if let ReverseInsert::Collision { kept } = outcome {
            warn!(
                "Remapped {} {:#x} already maps back to {:#x}, ignoring {:#x}",
                kind,
                remapped.addr(),
                kept,
                original.addr()
            );
        }
    }

    // ========================================================================
    // Forward
    // ========================================================================

    /// An executor over `R` that rebinds its context and runs `command`.
    pub fn remap_command(&self, command: &Command<S>) -> Command<R> {
        self.compute_if_absent(COMMAND_KIND, command, || {
            let mapper = self.downgrade();
            let original = command.clone();
            Command::new(move |ctx: &CommandContext<R>| {
                let mapper = mapper.upgrade(COMMAND_KIND)?;
                original.run(&ctx.map_source(&mapper)?)
            })
        })
    }

    /// A modifier over `R` that rebinds its context, applies `modifier` and
    /// converts each resulting source, keeping their order.
    pub fn remap_modifier(&self, modifier: &RedirectModifier<S>) -> RedirectModifier<R> {
        self.compute_if_absent(MODIFIER_KIND, modifier, || {
            let mapper = self.downgrade();
            let original = modifier.clone();
            RedirectModifier::new(move |ctx: &CommandContext<R>| {
                let mapper = mapper.upgrade(MODIFIER_KIND)?;
                let sources = original.apply(&ctx.map_source(&mapper)?)?;
                Ok(sources.iter().map(|source| mapper.to_remapped(source)).collect())
            })
        })
    }

    /// A provider over `R` that rebinds its context and hands the builder
    /// to `provider` untouched.
    pub fn remap_suggestions(&self, provider: &SuggestionProvider<S>) -> SuggestionProvider<R> {
        self.compute_if_absent(SUGGESTIONS_KIND, provider, || {
            let mapper = self.downgrade();
            let original = provider.clone();
            SuggestionProvider::new(
                move |ctx: &CommandContext<R>, builder: &mut SuggestionsBuilder| {
                    let mapper = mapper.upgrade(SUGGESTIONS_KIND)?;
                    original.get_suggestions(&ctx.map_source(&mapper)?, builder)
                },
            )
        })
    }

    /// `requirement` applied to the converted source. Not memoized, and
    /// keeps working after the mapper is dropped.
    pub fn remap_requirement(&self, requirement: &Requirement<S>) -> Requirement<R> {
        let converters = Rc::clone(&self.inner.converters);
        let original = requirement.clone();
        Requirement::new(move |source: &R| original.test(&(converters.to_original)(source)))
    }

    pub fn remap_literal(&self, node: &LiteralCommandNode<S>) -> LiteralCommandNode<R> {
        self.compute_if_absent(LITERAL_KIND, node, || node.build_twin(self))
    }

    pub fn remap_argument(&self, node: &ArgumentCommandNode<S>) -> ArgumentCommandNode<R> {
        self.compute_if_absent(ARGUMENT_KIND, node, || node.build_twin(self))
    }

    pub fn remap_root(&self, node: &RootCommandNode<S>) -> RootCommandNode<R> {
        self.compute_if_absent(ROOT_KIND, node, || node.build_twin(self))
    }

    pub fn remap_node(&self, node: &CommandNode<S>) -> CommandNode<R> {
        match node {
            CommandNode::Root(node) => self.remap_root(node).into(),
            CommandNode::Literal(node) => self.remap_literal(node).into(),
            CommandNode::Argument(node) => self.remap_argument(node).into(),
        }
    }

    // ========================================================================
    // Reverse
    // ========================================================================

    fn cached_original<A: Identity, B: Identity>(&self, remapped: &B) -> Option<A> {
        self.inner.cache.borrow().original_of(remapped)
    }

    fn unknown(kind: &'static str, remapped: &dyn fmt::Debug) -> TreeError {
        debug!("No original {} recorded for {:?}", kind, remapped);
        TreeError::UnknownRemap {
            kind,
            remapped: format!("{:?}", remapped),
        }
    }

    fn lookup_original<A, B>(&self, kind: &'static str, remapped: &B) -> Result<A, TreeError>
    where
        A: Identity,
        B: Identity + fmt::Debug,
    {
        self.cached_original(remapped)
            .ok_or_else(|| Self::unknown(kind, remapped))
    }

    pub fn original_command(&self, remapped: &Command<R>) -> Result<Command<S>, TreeError> {
        self.lookup_original(COMMAND_KIND, remapped)
    }

    pub fn original_modifier(
        &self,
        remapped: &RedirectModifier<R>,
    ) -> Result<RedirectModifier<S>, TreeError> {
        self.lookup_original(MODIFIER_KIND, remapped)
    }

    pub fn original_suggestions(
        &self,
        remapped: &SuggestionProvider<R>,
    ) -> Result<SuggestionProvider<S>, TreeError> {
        self.lookup_original(SUGGESTIONS_KIND, remapped)
    }

    pub fn original_literal(
        &self,
        remapped: &LiteralCommandNode<R>,
    ) -> Result<LiteralCommandNode<S>, TreeError> {
        self.lookup_original(LITERAL_KIND, remapped)
    }

    pub fn original_argument(
        &self,
        remapped: &ArgumentCommandNode<R>,
    ) -> Result<ArgumentCommandNode<S>, TreeError> {
        self.lookup_original(ARGUMENT_KIND, remapped)
    }

    pub fn original_root(
        &self,
        remapped: &RootCommandNode<R>,
    ) -> Result<RootCommandNode<S>, TreeError> {
        self.lookup_original(ROOT_KIND, remapped)
    }

    /// The original of any node variant. Fails with kind `"command node"`.
    pub fn original_node(&self, remapped: &CommandNode<R>) -> Result<CommandNode<S>, TreeError> {
        let found = match remapped {
            CommandNode::Root(node) => self
                .cached_original::<RootCommandNode<S>, _>(node)
                .map(CommandNode::from),
            CommandNode::Literal(node) => self
                .cached_original::<LiteralCommandNode<S>, _>(node)
                .map(CommandNode::from),
            CommandNode::Argument(node) => self
                .cached_original::<ArgumentCommandNode<S>, _>(node)
                .map(CommandNode::from),
        };
        found.ok_or_else(|| Self::unknown(NODE_KIND, remapped))
    }

    /// Rebinds a context parsed against a twin tree. See
    /// [`CommandContext::map_source`].
    pub fn original_context(&self, ctx: &CommandContext<R>) -> Result<CommandContext<S>, TreeError> {
        ctx.map_source(self)
    }
}

/// The handle remapped callbacks keep, so twins never keep their mapper
/// alive.
struct WeakMapper<S, R> {
    inner: Weak<MapperState<S, R>>,
}

impl<S, R> WeakMapper<S, R> {
    fn upgrade(&self, kind: &'static str) -> Result<SourceMapper<S, R>, TreeError> {
        match self.inner.upgrade() {
            Some(inner) => Ok(SourceMapper { inner }),
            None => {
                debug!("Remapped {} ran after its source mapper was dropped", kind);
                Err(TreeError::MapperDropped { kind })
            }
        }
    }
}

impl<S, R> Clone for SourceMapper<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, R> fmt::Debug for SourceMapper<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceMapper")
            .field("cached", &self.inner.cache.borrow().len())
            .finish_non_exhaustive()
    }
}
