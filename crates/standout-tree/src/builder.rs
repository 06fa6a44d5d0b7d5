//! Fluent builders for command trees.
//!
//! ```rust
//! use standout_tree::{argument, literal, CommandContext, IntegerArgumentType, RootCommandNode};
//!
//! # fn main() -> Result<(), standout_tree::TreeError> {
//! let root = RootCommandNode::<u8>::new();
//! root.add_child(
//!     literal("give")
//!         .requires(|level: &u8| *level >= 2)
//!         .then(argument("amount", IntegerArgumentType::at_least(1)).executes(
//!             |ctx: &CommandContext<u8>| ctx.argument::<i32>("amount"),
//!         ))
//!         .build()?,
//! )?;
//! assert!(root.child("give").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! Children can be builders or nodes that were already built; passing a
//! built node attaches that very node, so one node can sit under several
//! parents.

use std::rc::Rc;

use crate::arguments::ArgumentType;
use crate::command::{Command, CommandResult, RedirectModifier, Requirement};
use crate::context::CommandContext;
use crate::error::TreeError;
use crate::suggestion::SuggestionProvider;
use crate::tree::{ArgumentCommandNode, CommandNode, LiteralCommandNode, NodeCore, RootCommandNode};

/// Starts a literal node matching `literal`.
pub fn literal<S: 'static>(literal: impl Into<String>) -> LiteralArgumentBuilder<S> {
    LiteralArgumentBuilder {
        literal: literal.into(),
        base: BuilderBase::new(),
    }
}

/// Starts an argument node parsing `argument_type` into `name`.
pub fn argument<S: 'static, T: ArgumentType + 'static>(
    name: impl Into<String>,
    argument_type: T,
) -> RequiredArgumentBuilder<S> {
    RequiredArgumentBuilder {
        name: name.into(),
        argument_type: Rc::new(argument_type),
        suggestions: None,
        base: BuilderBase::new(),
    }
}

/// Something that can be attached with `then`.
pub enum BuilderChild<S> {
    Node(CommandNode<S>),
    Literal(LiteralArgumentBuilder<S>),
    Argument(RequiredArgumentBuilder<S>),
}

impl<S: 'static> BuilderChild<S> {
    fn build(self) -> Result<CommandNode<S>, TreeError> {
        match self {
            BuilderChild::Node(node) => Ok(node),
            BuilderChild::Literal(builder) => builder.build().map(CommandNode::from),
            BuilderChild::Argument(builder) => builder.build().map(CommandNode::from),
        }
    }
}

impl<S> From<CommandNode<S>> for BuilderChild<S> {
    fn from(node: CommandNode<S>) -> Self {
        BuilderChild::Node(node)
    }
}

impl<S> From<LiteralCommandNode<S>> for BuilderChild<S> {
    fn from(node: LiteralCommandNode<S>) -> Self {
        BuilderChild::Node(node.into())
    }
}

impl<S> From<ArgumentCommandNode<S>> for BuilderChild<S> {
    fn from(node: ArgumentCommandNode<S>) -> Self {
        BuilderChild::Node(node.into())
    }
}

impl<S> From<RootCommandNode<S>> for BuilderChild<S> {
    fn from(node: RootCommandNode<S>) -> Self {
        BuilderChild::Node(node.into())
    }
}

impl<S> From<LiteralArgumentBuilder<S>> for BuilderChild<S> {
    fn from(builder: LiteralArgumentBuilder<S>) -> Self {
        BuilderChild::Literal(builder)
    }
}

impl<S> From<RequiredArgumentBuilder<S>> for BuilderChild<S> {
    fn from(builder: RequiredArgumentBuilder<S>) -> Self {
        BuilderChild::Argument(builder)
    }
}

struct BuilderBase<S> {
    children: Vec<BuilderChild<S>>,
    command: Option<Command<S>>,
    requirement: Requirement<S>,
    target: Option<CommandNode<S>>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S: 'static> BuilderBase<S> {
    fn new() -> Self {
        Self {
            children: Vec::new(),
            command: None,
            requirement: Requirement::always(),
            target: None,
            modifier: None,
            forks: false,
        }
    }

    /// Splits into the node state and the children still to be built.
    fn into_parts(self) -> Result<(NodeCore<S>, Vec<BuilderChild<S>>), TreeError> {
        if self.target.is_some() && !self.children.is_empty() {
            return Err(TreeError::invalid_argument(
                "Cannot forward a node with children",
            ));
        }
        let core = NodeCore::new(
            self.command,
            self.requirement,
            self.target,
            self.modifier,
            self.forks,
        );
        Ok((core, self.children))
    }
}

fn attach_children<S: 'static>(
    parent: &CommandNode<S>,
    children: Vec<BuilderChild<S>>,
) -> Result<(), TreeError> {
    for child in children {
        parent.add_child(child.build()?)?;
    }
    Ok(())
}

/// Methods shared by both builders, operating on `self.base`.
macro_rules! builder_methods {
    () => {
        /// Adds a child, built when this builder is.
        pub fn then(mut self, child: impl Into<BuilderChild<S>>) -> Self {
            self.base.children.push(child.into());
            self
        }

        pub fn executes<F>(self, f: F) -> Self
        where
            F: Fn(&CommandContext<S>) -> CommandResult + 'static,
        {
            self.executes_command(Command::new(f))
        }

        pub fn executes_command(mut self, command: Command<S>) -> Self {
            self.base.command = Some(command);
            self
        }

        pub fn requires<F>(mut self, f: F) -> Self
        where
            F: Fn(&S) -> bool + 'static,
        {
            self.base.requirement = Requirement::new(f);
            self
        }

        /// Continues parsing at `target` with the same source.
        pub fn redirect(self, target: impl Into<CommandNode<S>>) -> Self {
            self.forward(target, None, false)
        }

        /// Continues parsing at `target` with the sources `modifier`
        /// produces, without forking.
        pub fn redirect_with(
            self,
            target: impl Into<CommandNode<S>>,
            modifier: RedirectModifier<S>,
        ) -> Self {
            self.forward(target, Some(modifier), false)
        }

        /// Continues parsing at `target` once per source `modifier` produces.
        pub fn fork(self, target: impl Into<CommandNode<S>>, modifier: RedirectModifier<S>) -> Self {
            self.forward(target, Some(modifier), true)
        }

        pub fn forward(
            mut self,
            target: impl Into<CommandNode<S>>,
            modifier: Option<RedirectModifier<S>>,
            fork: bool,
        ) -> Self {
            self.base.target = Some(target.into());
            self.base.modifier = modifier;
            self.base.forks = fork;
            self
        }

        pub fn command(&self) -> Option<&Command<S>> {
            self.base.command.as_ref()
        }

        pub fn requirement(&self) -> &Requirement<S> {
            &self.base.requirement
        }

        pub fn redirect_target(&self) -> Option<&CommandNode<S>> {
            self.base.target.as_ref()
        }

        pub fn redirect_modifier(&self) -> Option<&RedirectModifier<S>> {
            self.base.modifier.as_ref()
        }

        pub fn is_fork(&self) -> bool {
            self.base.forks
        }
    };
}

/// Builder for [`LiteralCommandNode`].
pub struct LiteralArgumentBuilder<S> {
    literal: String,
    base: BuilderBase<S>,
}

impl<S: 'static> LiteralArgumentBuilder<S> {
    builder_methods!();

    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Builds the node and its children.
    ///
    /// Fails if both a redirect target and children were given, or if a
    /// child fails to build.
    pub fn build(self) -> Result<LiteralCommandNode<S>, TreeError> {
        let (core, children) = self.base.into_parts()?;
        let node = LiteralCommandNode::from_parts(self.literal, core);
        attach_children(&node.clone().into(), children)?;
        Ok(node)
    }
}

/// Builder for [`ArgumentCommandNode`].
pub struct RequiredArgumentBuilder<S> {
    name: String,
    argument_type: Rc<dyn ArgumentType>,
    suggestions: Option<SuggestionProvider<S>>,
    base: BuilderBase<S>,
}

impl<S: 'static> RequiredArgumentBuilder<S> {
    builder_methods!();

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argument_type(&self) -> &Rc<dyn ArgumentType> {
        &self.argument_type
    }

    /// Replaces the argument type's own suggestions.
    pub fn suggests(mut self, provider: SuggestionProvider<S>) -> Self {
        self.suggestions = Some(provider);
        self
    }

    pub fn suggestions_provider(&self) -> Option<&SuggestionProvider<S>> {
        self.suggestions.as_ref()
    }

    pub fn build(self) -> Result<ArgumentCommandNode<S>, TreeError> {
        let (core, children) = self.base.into_parts()?;
        let node =
            ArgumentCommandNode::from_parts(self.name, self.argument_type, self.suggestions, core);
        attach_children(&node.clone().into(), children)?;
        Ok(node)
    }
}
