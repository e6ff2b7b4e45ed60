//! The text side of the command pipeline: a raw line becomes words, the words
//! are expanded, and redirection directives are pulled out into a
//! `SimpleCommand` ready to be launched.

pub mod command;
pub mod redirection;
pub mod tokenizer;
pub mod variable_expansion;

pub use self::command::SimpleCommand;
