//! Lexical scopes.
//!
//! [`SymbolTable`] is a stack of frames mapping names to declarations.
//! Lookups walk from the innermost frame outward, so an inner binding
//! shadows an outer one until its frame is closed.
//!
//! Frames are opened with [`SymbolTable::scope_start`], which hands out a
//! [`ScopeToken`] that must be given back to [`SymbolTable::scope_end`].
//! The token cannot be copied, so every frame is closed at most once.

use std::collections::HashMap;

use kiln_ast::DeclId;
use kiln_core::Symbol;

/// One frame of bindings.
pub type Scope = HashMap<Symbol, DeclId>;

/// Proof that a frame is open. Consumed by [`SymbolTable::scope_end`].
#[must_use = "a scope must be closed with `scope_end`"]
#[derive(Debug)]
pub struct ScopeToken {
    depth: usize,
}

#[derive(Clone, Debug)]
pub struct SymbolTable {
    frames: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table with a single, permanent root frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Scope::new()],
        }
    }

    /// Bind `name` in the innermost frame, replacing any binding of the same
    /// name in that frame.
    pub fn declare(&mut self, name: Symbol, decl: DeclId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, decl);
        }
    }

    pub fn find(&self, name: Symbol) -> Option<DeclId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(&name).copied())
    }

    /// Look `name` up in the innermost frame only.
    pub fn find_in_frame(&self, name: Symbol) -> Option<DeclId> {
        self.frames.last().and_then(|frame| frame.get(&name).copied())
    }

    /// Number of open frames, the root frame included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn scope_start(&mut self) -> ScopeToken {
        self.frames.push(Scope::new());
        tracing::trace!(depth = self.frames.len(), "scope start");
        ScopeToken {
            depth: self.frames.len(),
        }
    }

    /// Open a frame pre-populated with `bindings`.
    pub fn scope_start_with(&mut self, bindings: &Scope) -> ScopeToken {
        let token = self.scope_start();
        if let Some(frame) = self.frames.last_mut() {
            frame.extend(bindings.iter().map(|(&name, &decl)| (name, decl)));
        }
        token
    }

    /// Close the frame opened by `token`, discarding its bindings.
    pub fn scope_end(&mut self, token: ScopeToken) {
        debug_assert_eq!(
            token.depth,
            self.frames.len(),
            "scopes must be closed innermost first"
        );
        tracing::trace!(depth = token.depth, "scope end");
        self.frames.truncate(token.depth - 1);
    }
}

/// Bindings visible through a qualified `ns::name` path, per namespace.
#[derive(Clone, Debug, Default)]
pub struct NamespaceScopes {
    members: HashMap<DeclId, Scope>,
}

impl NamespaceScopes {
    pub fn declare(&mut self, namespace: DeclId, name: Symbol, decl: DeclId) {
        self.members
            .entry(namespace)
            .or_default()
            .insert(name, decl);
    }

    pub fn find(&self, namespace: DeclId, name: Symbol) -> Option<DeclId> {
        self.members.get(&namespace)?.get(&name).copied()
    }

    pub fn scope(&self, namespace: DeclId) -> Option<&Scope> {
        self.members.get(&namespace)
    }
}
