//! Callback types attached to command nodes.
//!
//! These are the behaviours a tree carries:
//!
//! - [`Command`]: runs when a parse terminates on a node
//! - [`RedirectModifier`]: produces the sources a redirect continues with
//! - [`Requirement`]: decides whether a source may use a node
//!
//! Each one is a cheap handle around a shared closure. Cloning a handle keeps
//! its identity, which is what the source mapper keys its caches on: two
//! clones of the same `Command` remap to the same remapped `Command`.

use std::fmt;
use std::rc::Rc;

use crate::context::CommandContext;
use crate::error::TreeError;
use crate::remap::SourceMapper;

/// Conventional result for a command that succeeded once.
pub const SINGLE_SUCCESS: i32 = 1;

/// The result type for executors.
pub type CommandResult = Result<i32, TreeError>;

pub(crate) type CommandFn<S> = dyn Fn(&CommandContext<S>) -> CommandResult;
pub(crate) type ModifierFn<S> = dyn Fn(&CommandContext<S>) -> Result<Vec<S>, TreeError>;
pub(crate) type RequirementFn<S> = dyn Fn(&S) -> bool;

/// An executor: the callback run for a parsed command.
///
/// # Example
///
/// ```rust
/// use standout_tree::{Command, CommandContext, CommandContextBuilder, RootCommandNode};
///
/// let command = Command::new(|ctx: &CommandContext<i32>| Ok(*ctx.source() * 2));
/// let ctx = CommandContextBuilder::new(RootCommandNode::new(), 21, 0).build("");
/// assert_eq!(command.run(&ctx).unwrap(), 42);
/// ```
pub struct Command<S> {
    pub(crate) inner: Rc<CommandFn<S>>,
}

impl<S> Command<S> {
    /// Wraps a closure as an executor.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> CommandResult + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    /// Runs the executor against a parsed context.
    pub fn run(&self, ctx: &CommandContext<S>) -> CommandResult {
        (self.inner)(ctx)
    }

    /// Returns true if both handles share the same closure.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: 'static> Command<S> {
    pub fn map_source<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> Command<R> {
        mapper.remap_command(self)
    }
}

impl<S> Clone for Command<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command@{:p}", Rc::as_ptr(&self.inner) as *const ())
    }
}

/// Produces the sources a redirect continues with.
///
/// A modifier that returns several sources forks the execution; the order of
/// the returned sources is the order they are executed in.
pub struct RedirectModifier<S> {
    pub(crate) inner: Rc<ModifierFn<S>>,
}

impl<S> RedirectModifier<S> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<Vec<S>, TreeError> + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    /// Wraps a closure that always yields exactly one source.
    pub fn single<F>(f: F) -> Self
    where
        S: 'static,
        F: Fn(&CommandContext<S>) -> Result<S, TreeError> + 'static,
    {
        Self::new(move |ctx| f(ctx).map(|source| vec![source]))
    }

    pub fn apply(&self, ctx: &CommandContext<S>) -> Result<Vec<S>, TreeError> {
        (self.inner)(ctx)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: 'static> RedirectModifier<S> {
    pub fn map_source<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> RedirectModifier<R> {
        mapper.remap_modifier(self)
    }
}

impl<S> Clone for RedirectModifier<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for RedirectModifier<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedirectModifier@{:p}", Rc::as_ptr(&self.inner) as *const ())
    }
}

/// Predicate deciding whether a source may use a node.
pub struct Requirement<S> {
    inner: Rc<RequirementFn<S>>,
}

impl<S> Requirement<S> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&S) -> bool + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    /// A requirement every source satisfies.
    pub fn always() -> Self
    where
        S: 'static,
    {
        Self::new(|_| true)
    }

    pub fn test(&self, source: &S) -> bool {
        (self.inner)(source)
    }
}

impl<S: 'static> Requirement<S> {
    /// Not memoized: every call wraps `self` anew.
    pub fn map_source<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> Requirement<R> {
        mapper.remap_requirement(self)
    }
}

impl<S: 'static> Default for Requirement<S> {
    fn default() -> Self {
        Self::always()
    }
}

impl<S> Clone for Requirement<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Requirement<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement").finish_non_exhaustive()
    }
}
