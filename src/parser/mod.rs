//! Parser layer
//! - traits.rs: Parser trait definition
//! - types.rs: Common types (ModuleDeclaration, ModuleReference)
//! - lexer.rs: HCL tokenizer used for delimiter-depth scanning
//! - terraform.rs: Terraform module block parser

pub mod lexer;
pub mod terraform;
pub mod traits;
pub mod types;

pub use terraform::TerraformParser;
pub use traits::Parser;
pub use types::{ModuleDeclaration, ModuleReference};
