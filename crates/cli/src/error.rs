// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! A [`DemoError`] says what went wrong, why it might have happened, and how to fix it.

use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct DemoError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DemoError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The config file could not be read at all
    pub fn config_unreadable(path: &Path) -> Self {
        DemoError::new(format!("Cannot read config file '{}'", path.display()))
            .with_context("The file may not exist or may not be readable")
            .with_suggestion("Check the path passed to --config")
    }

    /// The config file is not valid demo TOML
    pub fn invalid_config(detail: &str) -> Self {
        DemoError::new("Invalid demo configuration")
            .with_context(detail.trim().to_string())
            .with_suggestion("Durations are strings such as \"250ms\" or \"1s\"")
            .with_suggestion("Known tables are [philosophers] and [ring]")
    }

    /// A network was asked for fewer processes than it needs
    pub fn too_small(what: &str, requested: usize, minimum: usize) -> Self {
        DemoError::new(format!("{} needs at least {} processes", what, minimum))
            .with_context(format!("Requested: {}", requested))
            .with_suggestion(format!("Pass a size of {} or more", minimum))
    }
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
