//! Parsed command contexts.
//!
//! A [`CommandContext`] is the immutable record of one parse: the source it
//! was parsed for, the nodes it walked, the arguments it read and, when the
//! parse went through a redirect, the child context it continued in.
//!
//! Contexts are assembled with a [`CommandContextBuilder`], normally by a
//! parser walking the tree with the node-level `parse` operations.
//!
//! # Rebinding
//!
//! A context produced against a remapped tree carries remapped nodes and
//! callbacks. [`CommandContext::map_source`] turns it back into a context over
//! the original source type so original callbacks can run against it.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::command::{Command, RedirectModifier};
use crate::error::TreeError;
use crate::remap::SourceMapper;
use crate::tree::CommandNode;

/// A parsed, type-erased argument value.
pub type ArgumentValue = Rc<dyn Any>;

/// A half-open byte range `[start, end)` into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct StringRange {
    start: usize,
    end: usize,
}

impl StringRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty range at `pos`.
    pub fn at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn between(start: usize, end: usize) -> Self {
        Self::new(start, end)
    }

    /// The smallest range covering both `a` and `b`.
    pub fn encompassing(a: StringRange, b: StringRange) -> Self {
        Self::new(a.start.min(b.start), a.end.max(b.end))
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// The slice of `input` covered by this range, or `""` if out of bounds.
    pub fn get<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.start..self.end).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// An argument value together with where it was read from.
#[derive(Clone)]
pub struct ParsedArgument {
    range: StringRange,
    result: ArgumentValue,
}

impl ParsedArgument {
    pub fn new(range: StringRange, result: ArgumentValue) -> Self {
        Self { range, result }
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn result(&self) -> &ArgumentValue {
        &self.result
    }
}

impl fmt::Debug for ParsedArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedArgument")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// A node visited by a parse, with the input range it consumed.
pub struct ParsedCommandNode<S> {
    node: CommandNode<S>,
    range: StringRange,
}

impl<S> ParsedCommandNode<S> {
    pub fn new(node: CommandNode<S>, range: StringRange) -> Self {
        Self { node, range }
    }

    pub fn node(&self) -> &CommandNode<S> {
        &self.node
    }

    pub fn range(&self) -> StringRange {
        self.range
    }
}

impl<S> Clone for ParsedCommandNode<S> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            range: self.range,
        }
    }
}

impl<S> fmt::Debug for ParsedCommandNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.node, self.range)
    }
}

/// The record of a parse, handed to executors and redirect modifiers.
pub struct CommandContext<S> {
    source: S,
    input: String,
    arguments: IndexMap<String, ParsedArgument>,
    command: Option<Command<S>>,
    root_node: CommandNode<S>,
    nodes: Vec<ParsedCommandNode<S>>,
    range: StringRange,
    child: Option<Box<CommandContext<S>>>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S> CommandContext<S> {
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The full input string the context was parsed from.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn root_node(&self) -> &CommandNode<S> {
        &self.root_node
    }

    pub fn nodes(&self) -> &[ParsedCommandNode<S>] {
        &self.nodes
    }

    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    /// The context the parse continued in after a redirect.
    pub fn child(&self) -> Option<&CommandContext<S>> {
        self.child.as_deref()
    }

    /// The innermost context of the redirect chain (`self` if there is none).
    pub fn last_child(&self) -> &CommandContext<S> {
        let mut current = self;
        while let Some(child) = current.child() {
            current = child;
        }
        current
    }

    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    pub fn redirect_modifier(&self) -> Option<&RedirectModifier<S>> {
        self.modifier.as_ref()
    }

    pub fn is_forked(&self) -> bool {
        self.forks
    }

    pub fn arguments(&self) -> &IndexMap<String, ParsedArgument> {
        &self.arguments
    }

    /// Returns the parsed value of argument `name` as a `T`.
    ///
    /// Fails with [`TreeError::InvalidArgument`] when the argument is missing
    /// or was parsed as another type.
    pub fn argument<T: Clone + 'static>(&self, name: &str) -> Result<T, TreeError> {
        let parsed = self.arguments.get(name).ok_or_else(|| {
            TreeError::invalid_argument(format!(
                "No such argument '{}' exists on this command",
                name
            ))
        })?;
        parsed.result.downcast_ref::<T>().cloned().ok_or_else(|| {
            TreeError::invalid_argument(format!(
                "Argument '{}' is not of type {}",
                name,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Returns a copy of this context for another source.
    ///
    /// The child chain keeps its own sources.
    pub fn copy_for(&self, source: S) -> Self
    where
        S: Clone,
    {
        Self {
            source,
            ..self.clone()
        }
    }
}

impl<R: 'static> CommandContext<R> {
    /// Rebinds a context parsed against a remapped tree to the original
    /// source type.
    ///
    /// The source goes through the mapper's `to_original`; nodes, executor
    /// and modifier are replaced by the originals the mapper remembers. Input,
    /// arguments, ranges and the fork flag are kept as they are.
    ///
    /// Fails with [`TreeError::UnknownRemap`] if the context references
    /// anything this mapper did not produce.
    pub fn map_source<S: 'static>(
        &self,
        mapper: &SourceMapper<S, R>,
    ) -> Result<CommandContext<S>, TreeError> {
        let nodes = self
            .nodes
            .iter()
            .map(|parsed| {
                let node = mapper.original_node(&parsed.node)?;
                Ok(ParsedCommandNode::new(node, parsed.range))
            })
            .collect::<Result<Vec<_>, TreeError>>()?;
        let child = match &self.child {
            Some(child) => Some(Box::new(child.map_source(mapper)?)),
            None => None,
        };

        Ok(CommandContext {
            source: mapper.to_original(&self.source),
            input: self.input.clone(),
            arguments: self.arguments.clone(),
            command: self
                .command
                .as_ref()
                .map(|command| mapper.original_command(command))
                .transpose()?,
            root_node: mapper.original_node(&self.root_node)?,
            nodes,
            range: self.range,
            child,
            modifier: self
                .modifier
                .as_ref()
                .map(|modifier| mapper.original_modifier(modifier))
                .transpose()?,
            forks: self.forks,
        })
    }
}

impl<S: Clone> Clone for CommandContext<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            input: self.input.clone(),
            arguments: self.arguments.clone(),
            command: self.command.clone(),
            root_node: self.root_node.clone(),
            nodes: self.nodes.clone(),
            range: self.range,
            child: self.child.clone(),
            modifier: self.modifier.clone(),
            forks: self.forks,
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for CommandContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("source", &self.source)
            .field("input", &self.input)
            .field("nodes", &self.nodes)
            .field("range", &self.range)
            .field("child", &self.child)
            .field("forks", &self.forks)
            .finish_non_exhaustive()
    }
}

/// Incrementally assembles a [`CommandContext`].
///
/// # Example
///
/// ```rust
/// use standout_tree::{literal, CommandContextBuilder, RootCommandNode, StringRange};
///
/// let root = RootCommandNode::<()>::new();
/// let foo = literal("foo").executes(|_| Ok(1)).build()?;
/// root.add_child(foo.clone())?;
///
/// let ctx = CommandContextBuilder::new(root, (), 0)
///     .with_node(foo.clone(), StringRange::between(0, 3))
///     .with_command(foo.command())
///     .build("foo");
/// assert_eq!(ctx.command().unwrap().run(&ctx)?, 1);
/// # Ok::<(), standout_tree::TreeError>(())
/// ```
pub struct CommandContextBuilder<S> {
    source: S,
    root_node: CommandNode<S>,
    arguments: IndexMap<String, ParsedArgument>,
    command: Option<Command<S>>,
    nodes: Vec<ParsedCommandNode<S>>,
    range: StringRange,
    child: Option<Box<CommandContextBuilder<S>>>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S> CommandContextBuilder<S> {
    /// Starts a context for `source`, parsed from the tree at `root`,
    /// beginning at byte offset `start`.
    pub fn new(root: impl Into<CommandNode<S>>, source: S, start: usize) -> Self {
        Self {
            source,
            root_node: root.into(),
            arguments: IndexMap::new(),
            command: None,
            nodes: Vec::new(),
            range: StringRange::at(start),
            child: None,
            modifier: None,
            forks: false,
        }
    }

    pub fn with_source(mut self, source: S) -> Self {
        self.source = source;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn root_node(&self) -> &CommandNode<S> {
        &self.root_node
    }

    pub fn with_argument(mut self, name: impl Into<String>, argument: ParsedArgument) -> Self {
        self.add_argument(name, argument);
        self
    }

    pub(crate) fn add_argument(&mut self, name: impl Into<String>, argument: ParsedArgument) {
        self.arguments.insert(name.into(), argument);
    }

    pub fn arguments(&self) -> &IndexMap<String, ParsedArgument> {
        &self.arguments
    }

    pub fn with_command(mut self, command: Option<Command<S>>) -> Self {
        self.command = command;
        self
    }

    /// Records a visited node.
    ///
    /// Widens the context range to cover `range` and takes over the node's
    /// redirect modifier and fork flag.
    pub fn with_node(mut self, node: impl Into<CommandNode<S>>, range: StringRange) -> Self {
        self.add_node(node.into(), range);
        self
    }

    pub(crate) fn add_node(&mut self, node: CommandNode<S>, range: StringRange) {
        self.range = StringRange::encompassing(self.range, range);
        self.modifier = node.redirect_modifier();
        self.forks = node.is_fork();
        self.nodes.push(ParsedCommandNode::new(node, range));
    }

    pub fn nodes(&self) -> &[ParsedCommandNode<S>] {
        &self.nodes
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    /// Sets the context the parse continues in after a redirect.
    pub fn with_child(mut self, child: CommandContextBuilder<S>) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    pub fn child(&self) -> Option<&CommandContextBuilder<S>> {
        self.child.as_deref()
    }

    pub fn build(self, input: &str) -> CommandContext<S> {
        CommandContext {
            source: self.source,
            input: input.to_string(),
            arguments: self.arguments,
            command: self.command,
            root_node: self.root_node,
            nodes: self.nodes,
            range: self.range,
            child: self.child.map(|child| Box::new(child.build(input))),
            modifier: self.modifier,
            forks: self.forks,
        }
    }
}
