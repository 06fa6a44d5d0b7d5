//! Command trees over an arbitrary source type, and remapping between them.
//!
//! `standout-tree` models a command grammar as a tree of nodes: literals
//! (`give`), typed arguments (`<amount>`) and a root. Nodes carry the
//! behaviours of a command (executor, requirement, redirect modifier,
//! suggestion provider), all parameterized by the *source* type `S`: whoever
//! issued the command.
//!
//! # Features
//!
//! - **Tree model**: shared nodes, redirects (including back to an ancestor),
//!   insertion-ordered children with merge-on-add
//! - **Builders**: `literal(..)` / `argument(..)` fluent builders
//! - **Node-level parsing and suggestions**: one token at a time, recorded
//!   into a [`CommandContextBuilder`]
//! - **Source remapping**: [`SourceMapper`] turns a tree over `S` into a
//!   structurally identical tree over `R`, and rebinds contexts back
//!
//! # Source Remapping
//!
//! A tree built for one source type can be reused by a host with another,
//! given converters both ways:
//!
//! ```rust
//! use standout_tree::{
//!     argument, literal, CommandContext, IntegerArgumentType, RootCommandNode, SourceMapper,
//! };
//!
//! # fn main() -> Result<(), standout_tree::TreeError> {
//! // Original tree: sources are permission levels.
//! let root = RootCommandNode::<u8>::new();
//! root.add_child(
//!     literal("give")
//!         .requires(|level: &u8| *level >= 2)
//!         .then(argument("amount", IntegerArgumentType::at_least(1)).executes(
//!             |ctx: &CommandContext<u8>| ctx.argument::<i32>("amount"),
//!         ))
//!         .build()?,
//! )?;
//!
//! // The host speaks in player names; admins get level 4.
//! let mapper = SourceMapper::new(
//!     |player: &String| if player == "admin" { 4 } else { 0 },
//!     |level: &u8| if *level >= 4 { "admin".to_string() } else { "guest".to_string() },
//! );
//! let remapped = root.map_source(&mapper);
//!
//! let give = remapped.child("give").unwrap();
//! assert!(give.can_use(&"admin".to_string()));
//! assert!(!give.can_use(&"guest".to_string()));
//! # Ok(())
//! # }
//! ```
//!
//! Everything is single-threaded: handles are `Rc` and trees use interior
//! mutability. Parsing a whole input line and dispatching a parsed context
//! are left to the host.

// Core modules
mod arguments;
mod builder;
mod command;
mod context;
mod error;
mod identity;
mod remap;
mod suggestion;
mod tree;

// Re-export core types
pub use arguments::{ArgumentType, BoolArgumentType, IntegerArgumentType, WordArgumentType};

pub use builder::{argument, literal, BuilderChild, LiteralArgumentBuilder, RequiredArgumentBuilder};

pub use command::{Command, CommandResult, RedirectModifier, Requirement, SINGLE_SUCCESS};

pub use context::{
    ArgumentValue, CommandContext, CommandContextBuilder, ParsedArgument, ParsedCommandNode,
    StringRange,
};

pub use error::{CommandSyntaxError, TreeError};

pub use remap::SourceMapper;

pub use suggestion::{
    Suggestion, SuggestionProvider, Suggestions, SuggestionsBuilder, SuggestionsFuture,
};

pub use tree::{ArgumentCommandNode, CommandNode, LiteralCommandNode, RootCommandNode};
