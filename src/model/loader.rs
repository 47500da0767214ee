use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::types::*;

/// Reads a module model serialized as JSON.
pub fn load_module(path: &Path) -> Result<ModuleModel> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read module model {}", path.display()))?;
    load_module_from_str(&json)
        .with_context(|| format!("failed to parse module model {}", path.display()))
}

pub fn load_module_from_str(json: &str) -> Result<ModuleModel> {
    let module: ModuleModel = serde_json::from_str(json).context("invalid module model JSON")?;
    debug!(
        module = %module.name,
        types = module.types.len(),
        exported = module.exported_types.len(),
        "loaded module model"
    );
    Ok(module)
}

/// Lookup of type declarations by metadata name (`Ns.Outer+Inner`1`),
/// covering nested types and referenced declarations.
#[derive(Debug, Default)]
pub struct TypeIndex<'a> {
    by_name: HashMap<String, &'a TypeDeclaration>,
}

impl<'a> TypeIndex<'a> {
    pub fn new(module: &'a ModuleModel) -> Self {
        let mut index = Self::default();
        for decl in &module.types {
            index.insert(None, decl);
        }
        for decl in &module.referenced_types {
            index.insert(None, decl);
        }
        index
    }

    fn insert(&mut self, parent: Option<&str>, decl: &'a TypeDeclaration) {
        let name = match parent {
            Some(parent) => format!("{}+{}", parent, decl.metadata_name()),
            None if decl.namespace.is_empty() => decl.metadata_name(),
            None => format!("{}.{}", decl.namespace, decl.metadata_name()),
        };
        for nested in &decl.nested_types {
            self.insert(Some(&name), nested);
        }
        // Declarations defined by the module win over referenced copies.
        self.by_name.entry(name).or_insert(decl);
    }

    pub fn get(&self, named: &NamedType) -> Option<&'a TypeDeclaration> {
        self.by_name.get(&named.full_name()).copied()
    }
}
