//! Parser trait definition

use std::path::Path;

#[cfg(test)]
use mockall::automock;

use crate::parser::types::ModuleDeclaration;

/// Trait for extracting module declarations from configuration files
#[cfg_attr(test, automock)]
pub trait Parser: Send + Sync {
    /// Check if this parser can handle the given file
    fn can_parse(&self, path: &Path) -> bool;

    /// Extract module declarations in source order.
    ///
    /// Malformed declarations are skipped, so parsing never fails as a whole.
    fn parse(&self, content: &str) -> Vec<ModuleDeclaration>;
}
