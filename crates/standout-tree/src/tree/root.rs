use std::fmt;
use std::rc::Rc;

use super::{CommandNode, NodeCore};
use crate::command::{Command, RedirectModifier, Requirement};
use crate::error::TreeError;
use crate::remap::{SourceMapper, ROOT_KIND};

pub(crate) struct RootNode<S> {
    core: NodeCore<S>,
}

/// The entry point of a command tree. It has no name, matches no input and
/// every source may use it.
pub struct RootCommandNode<S> {
    pub(crate) inner: Rc<RootNode<S>>,
}

impl<S> RootCommandNode<S> {
    pub(crate) fn core(&self) -> &NodeCore<S> {
        &self.inner.core
    }

    node_accessors!();

    pub fn usage_text(&self) -> String {
        String::new()
    }

    pub fn examples(&self) -> Vec<String> {
        Vec::new()
    }

    pub fn is_valid_input(&self, _input: &str) -> bool {
        false
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: 'static> RootCommandNode<S> {
    pub fn new() -> Self {
        Self::from_core(NodeCore::new(None, Requirement::always(), None, None, false))
    }

    fn from_core(core: NodeCore<S>) -> Self {
        Self {
            inner: Rc::new(RootNode { core }),
        }
    }

    pub fn map_source<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> RootCommandNode<R> {
        mapper.remap_root(self)
    }

    pub(crate) fn build_twin<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> RootCommandNode<R> {
        let twin = RootCommandNode::from_core(self.core().map_shell(mapper));
        mapper.register(ROOT_KIND, self, &twin);
        self.core().map_edges_into(twin.core(), mapper);
        twin
    }
}

impl<S: 'static> Default for RootCommandNode<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for RootCommandNode<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for RootCommandNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootCommandNode")
    }
}
