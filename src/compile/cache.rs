use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{Ast, AstKind};
use crate::error::CompileError;

use super::types::CompiledType;

/// Which family of types a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Leaf,
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Identifier(String),
    Reference(String),
    Node(usize),
}

impl CacheKey {
    /// Identifier (a transformation's `to` side counts), then the reference
    /// annotation, then node identity.
    pub fn of(ast: &Ast) -> Self {
        if let Some(id) = ast.identifier_annotation() {
            return CacheKey::Identifier(id.to_string());
        }
        if let Some(reference) = &ast.annotations().reference {
            return CacheKey::Reference(reference.clone());
        }
        CacheKey::Node(ast.node_id())
    }
}

struct Entry {
    ty: Arc<CompiledType>,
    // Keeps node-keyed entries from being confused with a later allocation.
    _node: Ast,
    // Structure of the node owning the identifier, for identifier keys.
    shape: Option<String>,
}

fn named_node(ast: &Ast) -> &Ast {
    match ast.kind() {
        AstKind::Transformation { to, .. } if ast.annotations().identifier.is_none() => to,
        _ => ast,
    }
}

/// One compiled type per key for the duration of a compilation pass.
#[derive(Default)]
pub struct TypeCache {
    entries: HashMap<(Scope, CacheKey), Entry>,
    order: Vec<Arc<CompiledType>>,
    index: usize,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scope: Scope, ast: &Ast) -> Option<Arc<CompiledType>> {
        self.entries
            .get(&(scope, CacheKey::of(ast)))
            .map(|entry| entry.ty.clone())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn insert(&mut self, scope: Scope, ast: &Ast, ty: CompiledType) -> Arc<CompiledType> {
        let ty = Arc::new(ty);
        let key = CacheKey::of(ast);
        let shape = match key {
            CacheKey::Identifier(_) => Some(named_node(ast).fingerprint()),
            _ => None,
        };
        self.entries.insert(
            (scope, key),
            Entry {
                ty: ty.clone(),
                _node: ast.clone(),
                shape,
            },
        );
        self.order.push(ty.clone());
        self.index += 1;
        ty
    }

    /// Returns the cached type for `ast`, or builds and caches it. `build`
    /// receives the current index for fallback names.
    ///
    /// A cached identifier whose node has a different structure than `ast` is
    /// a [`CompileError::DuplicateTypeName`].
    pub fn get_or_try_insert(
        &mut self,
        scope: Scope,
        ast: &Ast,
        build: impl FnOnce(usize) -> Result<CompiledType, CompileError>,
    ) -> Result<(Arc<CompiledType>, bool), CompileError> {
        if let Some(entry) = self.entries.get(&(scope, CacheKey::of(ast))) {
            if let Some(shape) = &entry.shape {
                if *shape != named_node(ast).fingerprint() {
                    return Err(CompileError::DuplicateTypeName {
                        name: entry.ty.name.clone(),
                    });
                }
            }
            return Ok((entry.ty.clone(), false));
        }
        let ty = build(self.index)?;
        Ok((self.insert(scope, ast, ty), true))
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<CompiledType>> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
