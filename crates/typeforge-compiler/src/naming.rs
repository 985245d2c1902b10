//! Synthesized-name allocation.
//!
//! Every definition identifier is handed out by one [`NameAllocator`]. The
//! flattener calls it from a single thread in a fixed order, so identifiers
//! do not depend on how the later parallel stages are scheduled.

use std::collections::HashSet;

use parking_lot::Mutex;
use typeforge_spec_parser::SourcePointer;

use crate::error::CompileError;
use crate::model::DefinitionId;

/// Fallback for names that have no alphanumeric characters at all.
const FALLBACK_NAME: &str = "Model";

#[derive(Debug)]
pub struct NameAllocator {
    /// Lowercased names already handed out.
    taken: Mutex<HashSet<String>>,
    max_suffix: u32,
}

impl NameAllocator {
    pub fn new(max_suffix: u32) -> Self {
        Self {
            taken: Mutex::new(HashSet::new()),
            max_suffix,
        }
    }

    /// Allocate an identifier derived from `preferred`.
    ///
    /// Collisions are case-insensitive and resolved by appending `2`, `3`, ...
    pub fn allocate(
        &self,
        preferred: &str,
        location: &SourcePointer,
    ) -> Result<DefinitionId, CompileError> {
        let base = identifier(preferred);
        let mut taken = self.taken.lock();

        if taken.insert(base.to_lowercase()) {
            return Ok(DefinitionId::new(base));
        }
        for suffix in 2..=self.max_suffix {
            let candidate = format!("{}{}", base, suffix);
            if taken.insert(candidate.to_lowercase()) {
                return Ok(DefinitionId::new(candidate));
            }
        }
        Err(CompileError::NamingCollision {
            name: base,
            location: location.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.taken.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// PascalCase `s`, dropping every non-alphanumeric character.
///
/// Word boundaries are non-alphanumeric runs; existing capitals are kept,
/// so `petOwner` and `pet_owner` both become `PetOwner`.
pub fn pascal_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// A valid identifier: PascalCase, never empty, never starting with a digit.
pub fn identifier(s: &str) -> String {
    let name = pascal_case(s);
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Nr{}", name)
    } else {
        name
    }
}
