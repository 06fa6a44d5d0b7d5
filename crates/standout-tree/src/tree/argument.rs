use std::fmt;
use std::rc::Rc;

use super::{CommandNode, NodeCore};
use crate::arguments::ArgumentType;
use crate::command::{Command, RedirectModifier, Requirement};
use crate::context::{CommandContext, CommandContextBuilder, ParsedArgument, StringRange};
use crate::error::TreeError;
use crate::remap::{SourceMapper, ARGUMENT_KIND};
use crate::suggestion::{SuggestionProvider, SuggestionsBuilder, SuggestionsFuture};

pub(crate) struct ArgumentNode<S> {
    name: String,
    argument_type: Rc<dyn ArgumentType>,
    custom_suggestions: Option<SuggestionProvider<S>>,
    core: NodeCore<S>,
}

/// A node parsing one typed value, stored in the context under its name.
pub struct ArgumentCommandNode<S> {
    pub(crate) inner: Rc<ArgumentNode<S>>,
}

impl<S> ArgumentCommandNode<S> {
    pub(crate) fn from_parts(
        name: String,
        argument_type: Rc<dyn ArgumentType>,
        custom_suggestions: Option<SuggestionProvider<S>>,
        core: NodeCore<S>,
    ) -> Self {
        Self {
            inner: Rc::new(ArgumentNode {
                name,
                argument_type,
                custom_suggestions,
                core,
            }),
        }
    }

    pub(crate) fn core(&self) -> &NodeCore<S> {
        &self.inner.core
    }

    node_accessors!();

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The parser for this argument. Remapped twins share it with their
    /// original.
    pub fn argument_type(&self) -> &Rc<dyn ArgumentType> {
        &self.inner.argument_type
    }

    pub fn custom_suggestions(&self) -> Option<&SuggestionProvider<S>> {
        self.inner.custom_suggestions.as_ref()
    }

    pub fn usage_text(&self) -> String {
        format!("<{}>", self.inner.name)
    }

    pub fn examples(&self) -> Vec<String> {
        self.inner.argument_type.examples()
    }

    pub fn is_valid_input(&self, input: &str) -> bool {
        let token = input.split(' ').next().unwrap_or("");
        self.inner.argument_type.parse(token).is_ok()
    }

    /// Parses the token at `cursor` with the argument type.
    ///
    /// On success the value is stored under this node's name and the node is
    /// recorded in `ctx`. Type errors carry the input and cursor.
    pub fn parse(
        &self,
        input: &str,
        cursor: usize,
        ctx: &mut CommandContextBuilder<S>,
    ) -> Result<usize, TreeError> {
        let rest = input.get(cursor..).unwrap_or("");
        let token = rest.split(' ').next().unwrap_or("");
        let value = self
            .inner
            .argument_type
            .parse(token)
            .map_err(|e| e.with_context(input, cursor))?;

        let end = cursor + token.len();
        let range = StringRange::between(cursor, end);
        ctx.add_argument(self.inner.name.clone(), ParsedArgument::new(range, value));
        ctx.add_node(self.clone().into(), range);
        Ok(end)
    }

    /// Suggestions from the custom provider if there is one, otherwise from
    /// the argument type.
    pub fn list_suggestions(
        &self,
        ctx: &CommandContext<S>,
        builder: &mut SuggestionsBuilder,
    ) -> Result<SuggestionsFuture, TreeError> {
        match &self.inner.custom_suggestions {
            Some(provider) => provider.get_suggestions(ctx, builder),
            None => Ok(self.inner.argument_type.list_suggestions(builder)),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: 'static> ArgumentCommandNode<S> {
    pub fn map_source<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> ArgumentCommandNode<R> {
        mapper.remap_argument(self)
    }

    pub(crate) fn build_twin<R: 'static>(
        &self,
        mapper: &SourceMapper<S, R>,
    ) -> ArgumentCommandNode<R> {
        let twin = ArgumentCommandNode::from_parts(
            self.inner.name.clone(),
            Rc::clone(&self.inner.argument_type),
            self.inner
                .custom_suggestions
                .as_ref()
                .map(|provider| mapper.remap_suggestions(provider)),
            self.core().map_shell(mapper),
        );
        mapper.register(ARGUMENT_KIND, self, &twin);
        self.core().map_edges_into(twin.core(), mapper);
        twin
    }
}

impl<S> Clone for ArgumentCommandNode<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for ArgumentCommandNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentCommandNode")
            .field("name", &self.inner.name)
            .field("type", &self.inner.argument_type)
            .finish()
    }
}
