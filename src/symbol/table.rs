use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

/// Property under which the document's ANSI codepage is recorded.
pub const CODEPAGE_PROPERTY: &str = "ansicpg";

/// Code point of the bullet glyph in the Symbol font's private-use block.
const SYMBOL_BULLET: u32 = 0xF0B7;

/// Whether literal text added to a scope is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    #[default]
    Normal,
    Skip,
}

/// Index of a scope in its stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// One nested group of the document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    /// Enclosing scope. Lookup only; the stack owns every scope.
    pub parent: Option<ScopeId>,
    pub properties: HashMap<String, i32>,
    pub text: String,
    pub destination: Destination,
    /// Discard all text when this scope is popped.
    pub suppressed: bool,
    last_keyword: Option<String>,
}

impl Scope {
    fn child_of(parent: ScopeId, destination: Destination) -> Self {
        Self {
            parent: Some(parent),
            destination,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<i32> {
        self.properties.get(name).copied()
    }

    /// Name of the most recent property recorded in this scope
    #[must_use]
    pub fn last_keyword(&self) -> Option<&str> {
        self.last_keyword.as_deref()
    }

    /// Text this scope contributes to its parent when popped.
    #[must_use]
    pub fn effective_text(&self) -> &str {
        if self.suppressed {
            ""
        } else {
            &self.text
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Group end without matching group start")]
pub struct StackUnderflow;

/// Stack of nested scopes, rooted at the document scope.
///
/// Scopes live in an arena ordered by nesting; each one refers to its parent
/// by index.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Number of scopes above the root
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    #[must_use]
    pub fn current_id(&self) -> ScopeId {
        ScopeId(self.depth())
    }

    #[must_use]
    pub fn current(&self) -> &Scope {
        &self.scopes[self.depth()]
    }

    pub fn current_mut(&mut self) -> &mut Scope {
        let top = self.depth();
        &mut self.scopes[top]
    }

    #[must_use]
    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0)
    }

    #[must_use]
    pub fn root(&self) -> &Scope {
        &self.scopes[0]
    }

    /// Enter a new scope that starts with the current destination.
    pub fn push(&mut self) {
        let parent = self.current_id();
        let destination = self.current().destination;
        self.scopes.push(Scope::child_of(parent, destination));
        trace!(depth = self.depth(), ?destination, "push scope");
    }

    /// Leave the current scope, folding its text into the new top.
    /// # Errors
    /// `StackUnderflow` if only the root is left.
    pub fn pop(&mut self) -> Result<Scope, StackUnderflow> {
        if self.depth() == 0 {
            return Err(StackUnderflow);
        }
        let scope = self.scopes.pop().ok_or(StackUnderflow)?;
        trace!(
            depth = self.depth(),
            suppressed = scope.suppressed,
            keyword = scope.last_keyword(),
            "pop scope"
        );
        let text = scope.effective_text();
        if !text.is_empty() {
            self.current_mut().text.push_str(text);
        }
        Ok(scope)
    }

    /// Append text to the current scope unless its destination is skipped.
    pub fn add_text(&mut self, text: &str) {
        let scope = self.current_mut();
        match scope.destination {
            Destination::Normal => scope.text.push_str(text),
            Destination::Skip => trace!(text, "skip text"),
        }
    }

    /// Append a single code point. Invalid code points become U+FFFD.
    pub fn add_char(&mut self, code: u32) {
        if code == SYMBOL_BULLET {
            self.add_text("* ");
            return;
        }
        let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
        let mut buf = [0u8; 4];
        self.add_text(ch.encode_utf8(&mut buf));
    }

    pub fn set_property(&mut self, name: &str, value: i32) {
        let scope = self.current_mut();
        scope.properties.insert(name.to_string(), value);
        scope.last_keyword = Some(name.to_string());
    }

    /// Nearest scope, from the top towards the root, that records a codepage.
    #[must_use]
    pub fn codepage_lookup(&self) -> Option<&Scope> {
        let mut id = Some(self.current_id());
        while let Some(current) = id {
            let scope = self.get(current)?;
            if scope.properties.contains_key(CODEPAGE_PROPERTY) {
                return Some(scope);
            }
            id = scope.parent;
        }
        None
    }

    /// The codepage recorded by [`codepage_lookup`](Self::codepage_lookup).
    #[must_use]
    pub fn codepage(&self) -> Option<i32> {
        self.codepage_lookup()
            .and_then(|scope| scope.property(CODEPAGE_PROPERTY))
    }

    /// Consume the stack and return the root scope.
    #[must_use]
    pub fn into_root(mut self) -> Scope {
        self.scopes.truncate(1);
        self.scopes.pop().unwrap_or_default()
    }
}
