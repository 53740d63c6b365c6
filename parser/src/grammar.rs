//! The parser capability and the shared block lifecycle.
//!
//! [`BlockParser`] is the object-safe interface the registry and scanner
//! drive: entry-point detection, `start_block`, `parse_line`,
//! `is_block_complete` and `get_result`. Concrete command grammars do not
//! implement it directly. They implement [`Grammar`] (patterns, cursor
//! state and hooks) and are wrapped in [`GrammarParser`], which supplies the
//! common contract:
//!
//! - rule dispatch in declared order, with handler failures recorded as
//!   document errors;
//! - garbage vs. unrecognized classification for unmatched lines;
//! - the default boundary policy (blank keeps going, a prompt ends the
//!   block, the grammar's own entry point ends the block);
//! - validation and timing when the result is harvested.
//!
//! Lifecycle: Idle → Active (after `start_block`) → Idle (after
//! `get_result` or `discard`). Calls that need an active block are no-ops
//! while Idle.

use netlog_core::{Document, ValidationRule, run_validations};

use crate::block::{Block, EntryMatch};
use crate::classify::{LineClass, classify_unmatched, is_prompt};
use crate::config::ScannerOptions;
use crate::diagnostics::{BlockCounts, BlockTimer, Diagnostics};
use crate::rule::{RuleOutcome, RuleSet};

/// Priority given to grammars that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Object-safe parser interface used by the registry and the scanner.
pub trait BlockParser: Send {
    fn name(&self) -> &'static str;
    fn priority(&self) -> i32;
    fn has_validations(&self) -> bool;
    fn rule_names(&self) -> Vec<&'static str>;
    /// Pure test of whether `line` opens a block of this grammar.
    fn is_entry_point(&self, line: &str) -> Option<EntryMatch>;
    /// Opens a fresh block, discarding any block still in progress.
    fn start_block(&mut self, line: &str, entry: &EntryMatch);
    /// Consumes one line of the active block. Returns whether it was
    /// recognized.
    fn parse_line(&mut self, line: &str) -> bool;
    /// Judges whether `line`, not yet consumed, lies past the active block.
    fn is_block_complete(&self, line: &str) -> bool;
    /// Finalizes and returns the active block's document. Returns `None`
    /// when no block is active, including on a second call.
    fn get_result(&mut self) -> Option<Document>;
    /// Drops the active block without emitting it.
    fn discard(&mut self);
    fn is_active(&self) -> bool;
}

/// What `start_block` does with the entry line after seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// The entry line is a pure header.
    HeaderOnly,
    /// The entry line also carries data and is fed through `parse_line`.
    ParseEntryLine,
}

/// One command-output grammar.
pub trait Grammar: Send + Sized + 'static {
    /// Type tag written on every document this grammar produces.
    const NAME: &'static str;
    const PRIORITY: i32 = DEFAULT_PRIORITY;

    /// Per-block cursor state, reset to its default at every block start.
    type Cursor: Default + Send;

    /// Compiles the grammar's patterns.
    fn build() -> Result<Self, regex::Error>;

    fn entry_point(&self, line: &str) -> Option<EntryMatch>;

    fn rules(&self) -> &RuleSet<Self::Cursor>;

    /// Seeds the fresh document from the entry match.
    fn start(&self, _cursor: &mut Self::Cursor, _block: &mut Block, _entry: &EntryMatch) -> Seed {
        Seed::HeaderOnly
    }

    /// Procedural handling tried before the rules. `None` defers to the
    /// rules; blank lines reach this hook too.
    fn handle(&self, _cursor: &mut Self::Cursor, _block: &mut Block, _line: &str) -> Option<bool> {
        None
    }

    /// Grammar-specific boundary decision. `None` applies
    /// [`standard_boundary`].
    fn ends_block(&self, _cursor: &Self::Cursor, _block: &Block, _line: &str) -> Option<bool> {
        None
    }

    /// Final assembly before validation.
    fn finish(&self, _cursor: &mut Self::Cursor, _block: &mut Block) {}

    fn validations(&self) -> &'static [ValidationRule] {
        &[]
    }
}

/// Default boundary policy: a blank line defers judgment, a prompt line
/// ends the block, and a line opening another block of the same grammar
/// ends the current one.
///
/// The line that opened the block is never offered here, so a header
/// repeated byte for byte still splits two back-to-back blocks.
pub fn standard_boundary<G: Grammar>(grammar: &G, line: &str) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    if is_prompt(line) {
        return true;
    }
    grammar.entry_point(line).is_some()
}

/// Generic base parser wrapping one [`Grammar`].
pub struct GrammarParser<G: Grammar> {
    grammar: G,
    cursor: G::Cursor,
    block: Option<Block>,
    timer: Option<BlockTimer>,
    diagnostics: Diagnostics,
    options: ScannerOptions,
}

impl<G: Grammar> GrammarParser<G> {
    pub fn new(grammar: G, diagnostics: Diagnostics, options: ScannerOptions) -> Self {
        Self {
            grammar,
            cursor: G::Cursor::default(),
            block: None,
            timer: None,
            diagnostics,
            options,
        }
    }

    pub fn build(diagnostics: Diagnostics, options: ScannerOptions) -> Result<Self, regex::Error> {
        Ok(Self::new(G::build()?, diagnostics, options))
    }

    /// Parser with no-op diagnostics and default options.
    pub fn standalone() -> Result<Self, regex::Error> {
        Self::build(Diagnostics::noop(), ScannerOptions::default())
    }

    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    pub fn block(&self) -> Option<&Block> {
        self.block.as_ref()
    }

    fn consume(&mut self, line: &str) -> bool {
        let Some(block) = self.block.as_mut() else {
            tracing::debug!(parser = G::NAME, "line offered with no active block");
            return false;
        };

        if let Some(handled) = self.grammar.handle(&mut self.cursor, block, line) {
            return handled;
        }
        if line.trim().is_empty() {
            block.note_garbage();
            return true;
        }

        match self.grammar.rules().apply(&mut self.cursor, block, line) {
            RuleOutcome::Matched(_) => true,
            RuleOutcome::Failed { rule, error } => {
                tracing::warn!(parser = G::NAME, rule, %error, line, "rule handler failed");
                block.handler_failed(rule, &error, line);
                false
            }
            RuleOutcome::NoMatch => match classify_unmatched(line) {
                LineClass::Garbage => {
                    block.note_garbage();
                    false
                }
                LineClass::Unrecognized => {
                    tracing::debug!(parser = G::NAME, line, "unrecognized line");
                    block.warn_unrecognized(line);
                    false
                }
            },
        }
    }
}

impl<G: Grammar> BlockParser for GrammarParser<G> {
    fn name(&self) -> &'static str {
        G::NAME
    }

    fn priority(&self) -> i32 {
        G::PRIORITY
    }

    fn has_validations(&self) -> bool {
        !self.grammar.validations().is_empty()
    }

    fn rule_names(&self) -> Vec<&'static str> {
        self.grammar.rules().names()
    }

    fn is_entry_point(&self, line: &str) -> Option<EntryMatch> {
        self.grammar.entry_point(line)
    }

    fn start_block(&mut self, line: &str, entry: &EntryMatch) {
        if self.block.is_some() {
            tracing::debug!(parser = G::NAME, "block restarted before harvest; previous block dropped");
        }
        self.cursor = G::Cursor::default();
        let mut block = Block::new(G::NAME, line, self.options.warning_snippet_len);
        block.note_line();
        let seed = self.grammar.start(&mut self.cursor, &mut block, entry);
        self.timer = Some(self.diagnostics.start_timer(G::NAME));
        self.block = Some(block);
        if seed == Seed::ParseEntryLine {
            self.consume(line);
        }
    }

    fn parse_line(&mut self, line: &str) -> bool {
        match self.block.as_mut() {
            Some(block) => block.note_line(),
            None => {
                tracing::debug!(parser = G::NAME, "parse_line called while idle");
                return false;
            }
        }
        self.consume(line)
    }

    fn is_block_complete(&self, line: &str) -> bool {
        let Some(block) = &self.block else {
            return true;
        };
        self.grammar
            .ends_block(&self.cursor, block, line)
            .unwrap_or_else(|| standard_boundary(&self.grammar, line))
    }

    fn get_result(&mut self) -> Option<Document> {
        let mut block = self.block.take()?;
        self.grammar.finish(&mut self.cursor, &mut block);
        let lines = block.lines();
        let garbage_lines = block.garbage_lines();

        let mut doc = block.into_document();
        run_validations(&mut doc, self.grammar.validations());
        self.cursor = G::Cursor::default();

        if let Some(timer) = self.timer.take() {
            self.diagnostics.stop_timer(
                timer,
                BlockCounts {
                    lines,
                    garbage_lines,
                    warnings: doc.warnings.len(),
                    errors: doc.errors.len(),
                },
            );
        }
        Some(doc)
    }

    fn discard(&mut self) {
        if self.block.take().is_some() {
            tracing::debug!(parser = G::NAME, "in-flight block discarded");
        }
        self.timer = None;
        self.cursor = G::Cursor::default();
    }

    fn is_active(&self) -> bool {
        self.block.is_some()
    }
}
