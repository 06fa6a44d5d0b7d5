//! The command tree.
//!
//! A tree is made of three node variants:
//!
//! - [`RootCommandNode`]: the entry point, holding the top-level commands
//! - [`LiteralCommandNode`]: a fixed keyword such as `teleport`
//! - [`ArgumentCommandNode`]: a typed value such as `<count>`
//!
//! [`CommandNode`] is the sum of the three and is what children and redirect
//! targets are stored as.
//!
//! # Sharing and identity
//!
//! Nodes are handles: cloning one gives another reference to the same node.
//! A node can be attached under several parents, and a redirect may point
//! back at an ancestor, so a tree is really a graph. Node identity (see
//! `ptr_eq`) is what the source mapper preserves.
//!
//! Children, the redirect target and the executor live behind interior
//! mutability so trees can be wired up after their nodes are built. Remapping
//! assumes nobody mutates a tree while it is being remapped.

use std::cell::RefCell;
use std::fmt;

use indexmap::IndexMap;

use crate::command::{Command, RedirectModifier, Requirement};
use crate::context::{CommandContext, CommandContextBuilder};
use crate::error::TreeError;
use crate::remap::SourceMapper;
use crate::suggestion::{Suggestions, SuggestionsBuilder, SuggestionsFuture};

/// Accessors shared by every node type, delegating to its [`NodeCore`].
macro_rules! node_accessors {
    () => {
        /// Children in the order they were added.
        pub fn children(&self) -> Vec<CommandNode<S>> {
            self.core().children()
        }

        pub fn child(&self, name: &str) -> Option<CommandNode<S>> {
            self.core().child(name)
        }

        /// The executor run when a parse ends on this node.
        pub fn command(&self) -> Option<Command<S>> {
            self.core().command()
        }

        pub fn requirement(&self) -> Requirement<S> {
            self.core().requirement.clone()
        }

        pub fn can_use(&self, source: &S) -> bool {
            self.core().requirement.test(source)
        }

        pub fn redirect(&self) -> Option<CommandNode<S>> {
            self.core().redirect()
        }

        pub fn redirect_modifier(&self) -> Option<RedirectModifier<S>> {
            self.core().modifier.clone()
        }

        pub fn is_fork(&self) -> bool {
            self.core().forks
        }

        /// Attaches `node` as a child.
        ///
        /// A child with the same name is merged into rather than replaced:
        /// the new executor (if any) wins and the new node's children are
        /// added to the existing one. Roots cannot be children.
        pub fn add_child(&self, node: impl Into<CommandNode<S>>) -> Result<(), TreeError> {
            self.core().add_child(node.into())
        }

        /// The children a parse at the start of `input` should try.
        ///
        /// If the first word of `input` names a literal child, that child
        /// alone; otherwise every argument child.
        pub fn relevant_children(&self, input: &str) -> Vec<CommandNode<S>> {
            self.core().relevant_children(input)
        }
    };
}

mod argument;
mod literal;
mod root;

pub use argument::ArgumentCommandNode;
pub use literal::LiteralCommandNode;
pub use root::RootCommandNode;

/// State common to all node variants.
pub(crate) struct NodeCore<S> {
    children: RefCell<IndexMap<String, CommandNode<S>>>,
    command: RefCell<Option<Command<S>>>,
    requirement: Requirement<S>,
    redirect: RefCell<Option<CommandNode<S>>>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S> NodeCore<S> {
    pub(crate) fn new(
        command: Option<Command<S>>,
        requirement: Requirement<S>,
        redirect: Option<CommandNode<S>>,
        modifier: Option<RedirectModifier<S>>,
        forks: bool,
    ) -> Self {
        Self {
            children: RefCell::new(IndexMap::new()),
            command: RefCell::new(command),
            requirement,
            redirect: RefCell::new(redirect),
            modifier,
            forks,
        }
    }

    fn children(&self) -> Vec<CommandNode<S>> {
        self.children.borrow().values().cloned().collect()
    }

    fn child(&self, name: &str) -> Option<CommandNode<S>> {
        self.children.borrow().get(name).cloned()
    }

    fn command(&self) -> Option<Command<S>> {
        self.command.borrow().clone()
    }

    fn redirect(&self) -> Option<CommandNode<S>> {
        self.redirect.borrow().clone()
    }

    fn add_child(&self, node: CommandNode<S>) -> Result<(), TreeError> {
        if node.is_root() {
            return Err(TreeError::invalid_argument(
                "Cannot add a root node as a child to any other command node",
            ));
        }

        let existing = self.child(node.name());
        match existing {
            Some(existing) => {
                if let Some(command) = node.command() {
                    existing.core().command.replace(Some(command));
                }
                for grandchild in node.children() {
                    existing.add_child(grandchild)?;
                }
            }
            None => {
                let name = node.name().to_string();
                self.children.borrow_mut().insert(name, node);
            }
        }
        Ok(())
    }

    fn relevant_children(&self, input: &str) -> Vec<CommandNode<S>> {
        let children = self.children.borrow();
        if children.values().any(CommandNode::is_literal) {
            let word = input.split(' ').next().unwrap_or("");
            if let Some(literal @ CommandNode::Literal(_)) = children.get(word) {
                return vec![literal.clone()];
            }
        }
        children
            .values()
            .filter(|child| child.is_argument())
            .cloned()
            .collect()
    }
}

impl<S: 'static> NodeCore<S> {
    /// A twin without edges: behaviours remapped, children and redirect
    /// left empty for [`NodeCore::map_edges_into`].
    pub(crate) fn map_shell<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> NodeCore<R> {
        NodeCore::new(
            self.command().map(|command| mapper.remap_command(&command)),
            mapper.remap_requirement(&self.requirement),
            None,
            self.modifier
                .as_ref()
                .map(|modifier| mapper.remap_modifier(modifier)),
            self.forks,
        )
    }

    /// Remaps children (in order) and the redirect target into `twin`.
    pub(crate) fn map_edges_into<R: 'static>(
        &self,
        twin: &NodeCore<R>,
        mapper: &SourceMapper<S, R>,
    ) {
        let children: Vec<(String, CommandNode<S>)> = self
            .children
            .borrow()
            .iter()
            .map(|(name, child)| (name.clone(), child.clone()))
            .collect();
        for (name, child) in children {
            let remapped = mapper.remap_node(&child);
            twin.children.borrow_mut().insert(name, remapped);
        }

        if let Some(redirect) = self.redirect() {
            let remapped = mapper.remap_node(&redirect);
            twin.redirect.replace(Some(remapped));
        }
    }
}

/// Any node of a command tree.
pub enum CommandNode<S> {
    Root(RootCommandNode<S>),
    Literal(LiteralCommandNode<S>),
    Argument(ArgumentCommandNode<S>),
}

impl<S> CommandNode<S> {
    pub(crate) fn core(&self) -> &NodeCore<S> {
        match self {
            CommandNode::Root(node) => node.core(),
            CommandNode::Literal(node) => node.core(),
            CommandNode::Argument(node) => node.core(),
        }
    }

    node_accessors!();

    /// The literal for literal nodes, the argument name for argument nodes,
    /// and `""` for the root.
    pub fn name(&self) -> &str {
        match self {
            CommandNode::Root(_) => "",
            CommandNode::Literal(node) => node.literal(),
            CommandNode::Argument(node) => node.name(),
        }
    }

    pub fn usage_text(&self) -> String {
        match self {
            CommandNode::Root(node) => node.usage_text(),
            CommandNode::Literal(node) => node.usage_text(),
            CommandNode::Argument(node) => node.usage_text(),
        }
    }

    pub fn examples(&self) -> Vec<String> {
        match self {
            CommandNode::Root(node) => node.examples(),
            CommandNode::Literal(node) => node.examples(),
            CommandNode::Argument(node) => node.examples(),
        }
    }

    pub fn is_valid_input(&self, input: &str) -> bool {
        match self {
            CommandNode::Root(node) => node.is_valid_input(input),
            CommandNode::Literal(node) => node.is_valid_input(input),
            CommandNode::Argument(node) => node.is_valid_input(input),
        }
    }

    /// Parses this node at `cursor`, recording it in `ctx`.
    ///
    /// Returns the cursor after the consumed input. The root consumes
    /// nothing.
    pub fn parse(
        &self,
        input: &str,
        cursor: usize,
        ctx: &mut CommandContextBuilder<S>,
    ) -> Result<usize, TreeError> {
        match self {
            CommandNode::Root(_) => Ok(cursor),
            CommandNode::Literal(node) => node.parse(input, cursor, ctx),
            CommandNode::Argument(node) => node.parse(input, cursor, ctx),
        }
    }

    pub fn list_suggestions(
        &self,
        ctx: &CommandContext<S>,
        builder: &mut SuggestionsBuilder,
    ) -> Result<SuggestionsFuture, TreeError> {
        match self {
            CommandNode::Root(_) => Ok(Suggestions::empty_future()),
            CommandNode::Literal(node) => Ok(node.list_suggestions(builder)),
            CommandNode::Argument(node) => node.list_suggestions(ctx, builder),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, CommandNode::Root(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, CommandNode::Literal(_))
    }

    pub fn is_argument(&self) -> bool {
        matches!(self, CommandNode::Argument(_))
    }

    pub fn as_root(&self) -> Option<&RootCommandNode<S>> {
        match self {
            CommandNode::Root(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralCommandNode<S>> {
        match self {
            CommandNode::Literal(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_argument(&self) -> Option<&ArgumentCommandNode<S>> {
        match self {
            CommandNode::Argument(node) => Some(node),
            _ => None,
        }
    }

    /// Returns true if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &CommandNode<S>) -> bool {
        match (self, other) {
            (CommandNode::Root(a), CommandNode::Root(b)) => a.ptr_eq(b),
            (CommandNode::Literal(a), CommandNode::Literal(b)) => a.ptr_eq(b),
            (CommandNode::Argument(a), CommandNode::Argument(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl<S: 'static> CommandNode<S> {
    /// The twin of this node in `mapper`'s target source type.
    pub fn map_source<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> CommandNode<R> {
        mapper.remap_node(self)
    }
}

impl<S> Clone for CommandNode<S> {
    fn clone(&self) -> Self {
        match self {
            CommandNode::Root(node) => CommandNode::Root(node.clone()),
            CommandNode::Literal(node) => CommandNode::Literal(node.clone()),
            CommandNode::Argument(node) => CommandNode::Argument(node.clone()),
        }
    }
}

impl<S> fmt::Debug for CommandNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandNode::Root(node) => fmt::Debug::fmt(node, f),
            CommandNode::Literal(node) => fmt::Debug::fmt(node, f),
            CommandNode::Argument(node) => fmt::Debug::fmt(node, f),
        }
    }
}

impl<S> From<RootCommandNode<S>> for CommandNode<S> {
    fn from(node: RootCommandNode<S>) -> Self {
        CommandNode::Root(node)
    }
}

impl<S> From<LiteralCommandNode<S>> for CommandNode<S> {
    fn from(node: LiteralCommandNode<S>) -> Self {
        CommandNode::Literal(node)
    }
}

impl<S> From<ArgumentCommandNode<S>> for CommandNode<S> {
    fn from(node: ArgumentCommandNode<S>) -> Self {
        CommandNode::Argument(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::IntegerArgumentType;
    use crate::builder::{argument, literal};
    use crate::command::SINGLE_SUCCESS;

    fn executes() -> Command<()> {
        Command::new(|_: &CommandContext<()>| Ok(SINGLE_SUCCESS))
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let root = RootCommandNode::<()>::new();
        for name in ["zeta", "alpha", "mid"] {
            root.add_child(literal(name).build().unwrap()).unwrap();
        }
        let names: Vec<String> = root.children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_add_child_merges_same_name() {
        let root = RootCommandNode::<()>::new();
        root.add_child(literal("foo").then(literal("a")).build().unwrap())
            .unwrap();
        root.add_child(
            literal("foo")
                .executes_command(executes())
                .then(literal("b"))
                .build()
                .unwrap(),
        )
        .unwrap();

        assert_eq!(root.children().len(), 1);
        let foo = root.child("foo").unwrap();
        assert!(foo.command().is_some());
        let names: Vec<String> = foo.children().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_add_child_merge_keeps_command_when_new_has_none() {
        let root = RootCommandNode::<()>::new();
        let command = executes();
        root.add_child(literal("foo").executes_command(command.clone()).build().unwrap())
            .unwrap();
        root.add_child(literal("foo").build().unwrap()).unwrap();
        assert!(root.child("foo").unwrap().command().unwrap().ptr_eq(&command));
    }

    #[test]
    fn test_root_cannot_be_a_child() {
        let root = RootCommandNode::<()>::new();
        let err = root.add_child(RootCommandNode::new()).unwrap_err();
        assert!(matches!(err, TreeError::InvalidArgument(_)));
    }

    #[test]
    fn test_relevant_children_prefers_matching_literal() {
        let root = RootCommandNode::<()>::new();
        root.add_child(literal("give").build().unwrap()).unwrap();
        root.add_child(literal("kill").build().unwrap()).unwrap();
        root.add_child(argument("amount", IntegerArgumentType::new()).build().unwrap())
            .unwrap();

        let relevant = root.relevant_children("give me");
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant[0].name(), "give");

        let relevant = root.relevant_children("42");
        assert_eq!(relevant.len(), 1);
        assert!(relevant[0].is_argument());
    }

    #[test]
    fn test_same_node_under_two_parents() {
        let shared = literal::<()>("shared").build().unwrap();
        let a = literal("a").then(shared.clone()).build().unwrap();
        let b = literal("b").then(shared.clone()).build().unwrap();

        let under_a = a.child("shared").unwrap();
        let under_b = b.child("shared").unwrap();
        assert!(under_a.ptr_eq(&under_b));
        assert!(under_a.ptr_eq(&CommandNode::from(shared)));
    }

    #[test]
    fn test_variant_accessors() {
        let node: CommandNode<()> = literal("foo").build().unwrap().into();
        assert!(node.is_literal());
        assert!(node.as_literal().is_some());
        assert!(node.as_argument().is_none());
        assert!(node.as_root().is_none());
        assert_eq!(node.usage_text(), "foo");
        assert_eq!(format!("{:?}", node), "LiteralCommandNode(\"foo\")");
    }

    #[test]
    fn test_ptr_eq_distinguishes_equal_nodes() {
        let a: CommandNode<()> = literal("same").build().unwrap().into();
        let b: CommandNode<()> = literal("same").build().unwrap().into();
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }
}
