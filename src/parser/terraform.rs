//! Terraform module block parser
//!
//! Finds `module "<name>" { ... }` blocks and reads their top-level
//! `source` and `version` attributes.
//!
//! Format example:
//! ```text
//! module "vpc" {
//!   source  = "terraform-aws-modules/vpc/aws"
//!   version = "5.1.2"
//!
//!   tags = {
//!     Environment = "prod"
//!   }
//! }
//! ```
//!
//! Block extent is found by tracking delimiter depth over the token stream
//! rather than by pattern matching, so nested maps and sub-blocks such as
//! `tags = { ... }` or `lifecycle { ... }` never cut a module body short.

use std::path::Path;

use tracing::debug;

use crate::parser::lexer::{Lexer, Token, TokenKind, string_value};
use crate::parser::traits::Parser;
use crate::parser::types::ModuleDeclaration;

const MODULE_KEYWORD: &str = "module";
const SOURCE_ATTRIBUTE: &str = "source";
const VERSION_ATTRIBUTE: &str = "version";

/// Parser for Terraform `*.tf` files
#[derive(Debug, Default, Clone, Copy)]
pub struct TerraformParser;

impl TerraformParser {
    pub fn new() -> Self {
        Self
    }

    /// Build a declaration from the tokens between a module's braces
    fn read_module(
        content: &str,
        name: String,
        line: usize,
        body: &[Token],
    ) -> Option<ModuleDeclaration> {
        let mut source = None;
        let mut version = None;
        let mut depth = 0usize;

        for (i, token) in body.iter().enumerate() {
            match token.kind {
                TokenKind::OpenBrace => depth += 1,
                TokenKind::CloseBrace => depth = depth.saturating_sub(1),
                TokenKind::Ident if depth == 0 => {
                    let (Some(eq), Some(value)) = (body.get(i + 1), body.get(i + 2)) else {
                        continue;
                    };
                    if eq.kind != TokenKind::Equals || value.kind != TokenKind::Str {
                        continue;
                    }
                    let slot = match token.text(content) {
                        SOURCE_ATTRIBUTE => &mut source,
                        VERSION_ATTRIBUTE => &mut version,
                        _ => continue,
                    };
                    // First assignment wins
                    if slot.is_none() {
                        *slot = Some(string_value(value.text(content)));
                    }
                }
                _ => {}
            }
        }

        let Some(source) = source.filter(|s| !s.is_empty()) else {
            debug!("Skipping module \"{}\" at line {}: no source", name, line);
            return None;
        };

        Some(ModuleDeclaration {
            name,
            source,
            version: version.filter(|v| !v.is_empty()),
            line,
        })
    }
}

/// Index of the `}` matching the `{` at `open`, if the block is closed
fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..].iter().enumerate() {
        match token.kind {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

impl Parser for TerraformParser {
    fn can_parse(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "tf")
    }

    fn parse(&self, content: &str) -> Vec<ModuleDeclaration> {
        let tokens: Vec<Token> = Lexer::new(content).collect();
        let mut results = Vec::new();
        let mut depth = 0usize;
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];
            match token.kind {
                TokenKind::OpenBrace => depth += 1,
                TokenKind::CloseBrace => depth = depth.saturating_sub(1),
                TokenKind::Ident if depth == 0 && token.text(content) == MODULE_KEYWORD => {
                    let header = (tokens.get(i + 1), tokens.get(i + 2));
                    if let (Some(label), Some(open)) = header
                        && label.kind == TokenKind::Str
                        && open.kind == TokenKind::OpenBrace
                    {
                        let name = string_value(label.text(content));
                        let line = line_of(content, token.start);

                        let Some(close) = matching_close(&tokens, i + 2) else {
                            debug!("Module \"{}\" at line {} is never closed", name, line);
                            break;
                        };

                        if name.is_empty() {
                            debug!("Skipping unnamed module at line {}", line);
                        } else if let Some(declaration) =
                            Self::read_module(content, name, line, &tokens[i + 3..close])
                        {
                            results.push(declaration);
                        }

                        i = close + 1;
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        results
    }
}
