//! Autocompletion suggestions.
//!
//! A [`SuggestionsBuilder`] collects candidate completions for the input from
//! a given offset onward; [`Suggestions`] is the merged, sorted result.
//! [`SuggestionProvider`] lets an argument node supply its own candidates,
//! possibly asynchronously, through a [`SuggestionsFuture`].

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use serde::Serialize;

use crate::context::{CommandContext, StringRange};
use crate::error::TreeError;
use crate::remap::SourceMapper;

/// Deferred suggestions, resolved by whoever polls it.
pub type SuggestionsFuture = LocalBoxFuture<'static, Result<Suggestions, TreeError>>;

pub(crate) type ProviderFn<S> =
    dyn Fn(&CommandContext<S>, &mut SuggestionsBuilder) -> Result<SuggestionsFuture, TreeError>;

/// A single completion candidate replacing `range` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Suggestion {
    range: StringRange,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tooltip: Option<String>,
}

impl Suggestion {
    pub fn new(range: StringRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
            tooltip: None,
        }
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Returns `input` with this suggestion applied.
    pub fn apply(&self, input: &str) -> String {
        let start = self.range.start().min(input.len());
        let end = self.range.end().min(input.len());
        let mut result = String::with_capacity(input.len() + self.text.len());
        result.push_str(input.get(..start).unwrap_or(""));
        result.push_str(&self.text);
        result.push_str(input.get(end..).unwrap_or(""));
        result
    }

    /// Widens this suggestion to cover `range`, padding its text with the
    /// parts of `command` the wider range adds.
    pub fn expand(&self, command: &str, range: StringRange) -> Suggestion {
        if range == self.range {
            return self.clone();
        }
        let mut text = String::new();
        if range.start() < self.range.start() {
            text.push_str(StringRange::between(range.start(), self.range.start()).get(command));
        }
        text.push_str(&self.text);
        if range.end() > self.range.end() {
            text.push_str(StringRange::between(self.range.end(), range.end()).get(command));
        }
        Suggestion {
            range,
            text,
            tooltip: self.tooltip.clone(),
        }
    }
}

fn compare_text(a: &Suggestion, b: &Suggestion) -> Ordering {
    a.text
        .to_lowercase()
        .cmp(&b.text.to_lowercase())
        .then_with(|| a.text.cmp(&b.text))
}

/// A set of suggestions sharing one replacement range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Suggestions {
    range: StringRange,
    list: Vec<Suggestion>,
}

impl Suggestions {
    pub fn new(range: StringRange, list: Vec<Suggestion>) -> Self {
        Self { range, list }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A future that resolves immediately to no suggestions.
    pub fn empty_future() -> SuggestionsFuture {
        future::ready(Ok(Self::empty())).boxed_local()
    }

    /// Merges raw suggestions for `command` into one set.
    ///
    /// Every suggestion is expanded to the range covering all of them;
    /// duplicates are dropped and the rest sorted case-insensitively.
    pub fn create(command: &str, suggestions: Vec<Suggestion>) -> Self {
        let Some(first) = suggestions.first() else {
            return Self::empty();
        };
        let range = suggestions
            .iter()
            .fold(first.range(), |acc, s| StringRange::encompassing(acc, s.range()));

        let mut seen = HashSet::new();
        let mut list: Vec<Suggestion> = suggestions
            .iter()
            .map(|s| s.expand(command, range))
            .filter(|s| seen.insert(s.clone()))
            .collect();
        list.sort_by(compare_text);
        Self { range, list }
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn list(&self) -> &[Suggestion] {
        &self.list
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// Collects suggestions for `input` from byte offset `start` onward.
#[derive(Debug, Clone)]
pub struct SuggestionsBuilder {
    input: String,
    start: usize,
    result: Vec<Suggestion>,
}

impl SuggestionsBuilder {
    pub fn new(input: impl Into<String>, start: usize) -> Self {
        Self {
            input: input.into(),
            start,
            result: Vec::new(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// The input from `start` onward: the text being completed.
    pub fn remaining(&self) -> &str {
        self.input.get(self.start..).unwrap_or("")
    }

    pub fn remaining_lower(&self) -> String {
        self.remaining().to_lowercase()
    }

    /// Adds a candidate; ignored if it equals the remaining input.
    pub fn suggest(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text != self.remaining() {
            let range = StringRange::between(self.start, self.input.len());
            self.result.push(Suggestion::new(range, text));
        }
        self
    }

    pub fn suggest_with_tooltip(
        &mut self,
        text: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> &mut Self {
        let text = text.into();
        if text != self.remaining() {
            let range = StringRange::between(self.start, self.input.len());
            self.result.push(Suggestion::new(range, text).with_tooltip(tooltip));
        }
        self
    }

    /// Appends everything `other` collected.
    pub fn add(&mut self, other: &SuggestionsBuilder) -> &mut Self {
        self.result.extend(other.result.iter().cloned());
        self
    }

    /// A fresh builder over the same input starting at `start`.
    pub fn create_offset(&self, start: usize) -> SuggestionsBuilder {
        Self::new(self.input.clone(), start)
    }

    /// A fresh builder over the same input and start.
    pub fn restart(&self) -> SuggestionsBuilder {
        self.create_offset(self.start)
    }

    pub fn build(&self) -> Suggestions {
        Suggestions::create(&self.input, self.result.clone())
    }

    pub fn build_future(&self) -> SuggestionsFuture {
        future::ready(Ok(self.build())).boxed_local()
    }
}

/// Supplies suggestions for an argument node.
///
/// The provider may fail straight away (outer `Err`) or later, through the
/// returned future.
pub struct SuggestionProvider<S> {
    pub(crate) inner: Rc<ProviderFn<S>>,
}

impl<S> SuggestionProvider<S> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<S>, &mut SuggestionsBuilder) -> Result<SuggestionsFuture, TreeError>
            + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    pub fn get_suggestions(
        &self,
        ctx: &CommandContext<S>,
        builder: &mut SuggestionsBuilder,
    ) -> Result<SuggestionsFuture, TreeError> {
        (self.inner)(ctx, builder)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: 'static> SuggestionProvider<S> {
    pub fn map_source<R: 'static>(&self, mapper: &SourceMapper<S, R>) -> SuggestionProvider<R> {
        mapper.remap_suggestions(self)
    }
}

impl<S> Clone for SuggestionProvider<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for SuggestionProvider<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SuggestionProvider@{:p}", Rc::as_ptr(&self.inner) as *const ())
    }
}
