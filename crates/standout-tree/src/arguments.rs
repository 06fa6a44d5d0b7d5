//! Argument types: the parsers behind argument nodes.
//!
//! Argument types do not depend on the source type, so a remapped argument
//! node shares its original's [`ArgumentType`] instance.

use std::fmt;
use std::rc::Rc;

use crate::context::ArgumentValue;
use crate::error::CommandSyntaxError;
use crate::suggestion::{Suggestions, SuggestionsBuilder, SuggestionsFuture};

/// Parses one whitespace-delimited token into a value.
pub trait ArgumentType: fmt::Debug {
    /// Parses `token`, which never contains a space.
    fn parse(&self, token: &str) -> Result<ArgumentValue, CommandSyntaxError>;

    /// Suggestions for the token being typed. None by default.
    fn list_suggestions(&self, _builder: &mut SuggestionsBuilder) -> SuggestionsFuture {
        Suggestions::empty_future()
    }

    /// Sample inputs, used for ambiguity checks and help output.
    fn examples(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A bounded `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerArgumentType {
    min: i32,
    max: i32,
}

impl IntegerArgumentType {
    pub fn new() -> Self {
        Self::between(i32::MIN, i32::MAX)
    }

    pub fn at_least(min: i32) -> Self {
        Self::between(min, i32::MAX)
    }

    pub fn between(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }
}

impl Default for IntegerArgumentType {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgumentType for IntegerArgumentType {
    fn parse(&self, token: &str) -> Result<ArgumentValue, CommandSyntaxError> {
        let value: i32 = token
            .parse()
            .map_err(|_| CommandSyntaxError::new(format!("Invalid integer '{}'", token)))?;
        if value < self.min {
            return Err(CommandSyntaxError::new(format!(
                "Integer must not be less than {}, found {}",
                self.min, value
            )));
        }
        if value > self.max {
            return Err(CommandSyntaxError::new(format!(
                "Integer must not be more than {}, found {}",
                self.max, value
            )));
        }
        Ok(Rc::new(value))
    }

    fn examples(&self) -> Vec<String> {
        vec!["0".into(), "123".into(), "-123".into()]
    }
}

/// `true` or `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolArgumentType;

impl ArgumentType for BoolArgumentType {
    fn parse(&self, token: &str) -> Result<ArgumentValue, CommandSyntaxError> {
        match token {
            "true" => Ok(Rc::new(true)),
            "false" => Ok(Rc::new(false)),
            "" => Err(CommandSyntaxError::new("Expected bool")),
            other => Err(CommandSyntaxError::new(format!(
                "Invalid bool, expected true or false but found '{}'",
                other
            ))),
        }
    }

    fn list_suggestions(&self, builder: &mut SuggestionsBuilder) -> SuggestionsFuture {
        let remaining = builder.remaining_lower();
        for candidate in ["true", "false"] {
            if candidate.starts_with(&remaining) {
                builder.suggest(candidate);
            }
        }
        builder.build_future()
    }

    fn examples(&self) -> Vec<String> {
        vec!["true".into(), "false".into()]
    }
}

/// Any single non-empty word, parsed as a `String`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordArgumentType;

impl ArgumentType for WordArgumentType {
    fn parse(&self, token: &str) -> Result<ArgumentValue, CommandSyntaxError> {
        if token.is_empty() {
            return Err(CommandSyntaxError::new("Expected word"));
        }
        Ok(Rc::new(token.to_string()))
    }

    fn examples(&self) -> Vec<String> {
        vec!["word".into(), "words_with_underscores".into()]
    }
}
