use std::fmt;
use std::rc::Rc;

use super::{CommandNode, NodeCore};
use crate::command::{Command, RedirectModifier, Requirement};
use crate::context::{CommandContextBuilder, StringRange};
use crate::error::{CommandSyntaxError, TreeError};
use crate::remap::{SourceMapper, LITERAL_KIND};
use crate::suggestion::{Suggestions, SuggestionsBuilder, SuggestionsFuture};

pub(crate) struct LiteralNode<S> {
    literal: String,
    literal_lower: String,
    core: NodeCore<S>,
}

/// A node matching a fixed keyword.
pub struct LiteralCommandNode<S> {
    pub(crate) inner: Rc<LiteralNode<S>>,
}

impl<S> LiteralCommandNode<S> {
    pub(crate) fn from_parts(literal: String, core: NodeCore<S>) -> Self {
        let literal_lower = literal.to_lowercase();
        Self {
            inner: Rc::new(LiteralNode {
                literal,
                literal_lower,
                core,
            }),
        }
    }

    pub(crate) fn core(&self) -> &NodeCore<S> {
        &self.inner.core
    }

    node_accessors!();

    pub fn literal(&self) -> &str {
        &self.inner.literal
    }

    pub fn usage_text(&self) -> String {
        self.inner.literal.clone()
    }

    pub fn examples(&self) -> Vec<String> {
        vec![self.inner.literal.clone()]
    }

    /// True if `input` starts with the literal as a whole word.
    pub fn is_valid_input(&self, input: &str) -> bool {
        self.match_at(input, 0).is_some()
    }

    fn match_at(&self, input: &str, cursor: usize) -> Option<usize> {
        let rest = input.get(cursor..)?;
        let after = rest.strip_prefix(self.literal())?;
        if after.is_empty() || after.starts_with(' ') {
            Some(cursor + self.inner.literal.len())
        } else {
            None
        }
    }

    /// Consumes the literal at `cursor` and records this node in `ctx`.
    pub fn parse(
        &self,
        input: &str,
        cursor: usize,
        ctx: &mut CommandContextBuilder<S>,
    ) -> Result<usize, TreeError> {
        match self.match_at(input, cursor) {
            Some(end) => {
                ctx.add_node(self.clone().into(), StringRange::between(cursor, end));
                Ok(end)
            }
            None => Err(CommandSyntaxError::new(format!("Expected literal {}", self.literal()))
                .with_context(input, cursor)
                .into()),
        }
    }

    /// Suggests the literal when it extends the text being completed.
    pub fn list_suggestions(&self, builder: &mut SuggestionsBuilder) -> SuggestionsFuture {
        if self.inner.literal_lower.starts_with(&builder.remaining_lower()) {
            builder.suggest(self.literal()).build_future()
        } else {
            Suggestions::empty_future()
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: 'static> LiteralCommandNode<S> {
    /// The twin of this node in `mapper`'s target source type.
    pub fn map_source<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> LiteralCommandNode<R> {
        mapper.remap_literal(self)
    }

    /// Builds the twin shell-first: the twin is registered with `mapper`
    /// before children and redirect are remapped, so edges leading back
    /// here resolve to it.
    pub(crate) fn build_twin<R: 'static>(
        &self,
        mapper: &SourceMapper<S, R>,
    ) -> LiteralCommandNode<R> {
        let twin = LiteralCommandNode::from_parts(
            self.inner.literal.clone(),
            self.core().map_shell(mapper),
        );
        mapper.register(LITERAL_KIND, self, &twin);
        self.core().map_edges_into(twin.core(), mapper);
        twin
    }
}

impl<S> Clone for LiteralCommandNode<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for LiteralCommandNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LiteralCommandNode")
            .field(&self.inner.literal)
            .finish()
    }
}
