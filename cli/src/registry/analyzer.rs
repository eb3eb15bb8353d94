//! Static import analysis for component source files
//!
//! Source text is first reduced to a list of [`ImportStatement`] values by a
//! small comment- and string-aware scanner ([`parse_imports`]). Dependency
//! extraction then works purely on those values through the named matchers
//! in this module, so it can be exercised without any real source files.
//!
//! Recognized statement forms:
//!
//! ```text
//! import x from "m"              import { a, b as c } from "m"
//! import * as ns from "m"        import type { T } from "m"
//! import "m"                     import x = require("m")
//! export * from "m"              export { a } from "m"
//! ```
//!
//! Dynamic `import("m")` calls and `import.meta` are not statements and are
//! skipped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::source::is_valid_component_name;
use crate::error::ParseError;

/// How a module is brought into the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import ... from "m"` or `import x = require("m")`
    Static,
    /// `import "m"`
    SideEffect,
    /// `export ... from "m"`
    ReExport,
}

/// One import statement: the module path plus where and how it was imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub module: String,
    pub kind: ImportKind,
    pub type_only: bool,
    pub line: usize,
}

impl ImportStatement {
    pub fn new(module: impl Into<String>, kind: ImportKind) -> Self {
        Self {
            module: module.into(),
            kind,
            type_only: false,
            line: 1,
        }
    }
}

/// Host-ecosystem rules for classifying module paths
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Packages assumed to be present in every consumer project
    pub ignore: Vec<String>,

    /// Prefix marking project-internal imports (never external packages)
    pub internal_prefix: String,

    /// Import alias under which sibling components live
    pub components_alias: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ignore: vec![
                "react".to_string(),
                "react-dom".to_string(),
                "tailwind-merge".to_string(),
                "@radix-ui".to_string(),
            ],
            internal_prefix: "@/".to_string(),
            components_alias: "@/components".to_string(),
        }
    }
}

/// Dependencies found in a single file, each sorted and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDependencies {
    pub external: Vec<String>,
    pub registry: Vec<String>,
}

/// Relative imports (`./x`, `../x`) never leave the component
pub fn is_relative(module: &str) -> bool {
    module.starts_with('.')
}

/// Imports through the project's internal alias
pub fn is_internal(module: &str, internal_prefix: &str) -> bool {
    !internal_prefix.is_empty() && module.starts_with(internal_prefix)
}

/// Package name of a bare module path
///
/// Scoped paths keep their first two segments (`@scope/pkg/sub` → `@scope/pkg`),
/// everything else keeps the first one (`pkg/sub` → `pkg`).
pub fn package_name(module: &str) -> Option<String> {
    let mut segments = module.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    if first.starts_with('@') {
        match segments.next() {
            Some(second) => Some(format!("{}/{}", first, second)),
            None => Some(first.to_string()),
        }
    } else {
        Some(first.to_string())
    }
}

/// Whether a package equals, or lives under, an ignore-list entry
pub fn is_ignored(package: &str, ignore: &[String]) -> bool {
    ignore.iter().any(|entry| {
        package == entry
            || package
                .strip_prefix(entry.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Component name captured from `<components alias>/<name>[/...]`
///
/// Path segments that are not usable component names (`..`, `.`) match nothing.
pub fn registry_component<'a>(module: &'a str, components_alias: &str) -> Option<&'a str> {
    let rest = module.strip_prefix(components_alias)?.strip_prefix('/')?;
    let name = rest.split('/').next()?;
    is_valid_component_name(name).then_some(name)
}

/// External package referenced by an import, if any
pub fn external_package(import: &ImportStatement, config: &AnalyzerConfig) -> Option<String> {
    if is_relative(&import.module) || is_internal(&import.module, &config.internal_prefix) {
        return None;
    }
    package_name(&import.module).filter(|pkg| !is_ignored(pkg, &config.ignore))
}

/// Extract external and registry dependencies from one file's imports
///
/// A component importing itself through the components alias is not listed
/// as its own dependency.
pub fn analyze(
    imports: &[ImportStatement],
    component: &str,
    config: &AnalyzerConfig,
) -> FileDependencies {
    let mut external = BTreeSet::new();
    let mut registry = BTreeSet::new();

    for import in imports {
        if let Some(package) = external_package(import, config) {
            external.insert(package);
        }
        if let Some(name) = registry_component(&import.module, &config.components_alias) {
            if name != component {
                registry.insert(name.to_string());
            }
        }
    }

    FileDependencies {
        external: external.into_iter().collect(),
        registry: registry.into_iter().collect(),
    }
}

/// Parse every import statement out of a JavaScript/TypeScript source file
pub fn parse_imports(source: &str) -> Result<Vec<ImportStatement>, ParseError> {
    let mut scanner = Scanner::new(source);
    let mut imports = Vec::new();
    // Last significant character seen and whether a line break followed it
    let mut prev: Option<char> = None;
    let mut newline = false;

    while let Some(c) = scanner.peek() {
        match c {
            '/' if matches!(scanner.peek_at(1), Some('/') | Some('*')) => {
                scanner.skip_comment()?;
            }
            '"' | '\'' | '`' => {
                // Outside import statements a stray quote (JSX text such as
                // `Don't`, regex literals) is not an error.
                let save = (scanner.pos, scanner.line);
                if scanner.read_string().is_err() {
                    (scanner.pos, scanner.line) = save;
                    scanner.advance();
                }
                prev = Some(c);
                newline = false;
            }
            c if is_ident_start(c) => {
                let line = scanner.line;
                let at_start = statement_start(prev, newline);
                let word = scanner.read_ident();
                prev = word.chars().last();
                newline = false;
                if !at_start {
                    continue;
                }
                let found = match word.as_str() {
                    "import" => scanner.import_statement(line)?,
                    "export" => scanner.export_statement(line)?,
                    _ => None,
                };
                if let Some(import) = found {
                    imports.push(import);
                    prev = Some('"');
                }
            }
            c if c.is_whitespace() => {
                if c == '\n' {
                    newline = true;
                }
                scanner.advance();
            }
            c => {
                prev = Some(c);
                newline = false;
                scanner.advance();
            }
        }
    }

    Ok(imports)
}

/// Whether a keyword following `prev` begins a new statement
///
/// Statements start after `;`, `{`, `}`, at the top of the file, or on a new
/// line after something that can end an expression. This keeps property
/// accesses (`obj.import`) and JSX text (`<p>import</p>`) out.
fn statement_start(prev: Option<char>, newline: bool) -> bool {
    match prev {
        None | Some(';') | Some('{') | Some('}') => true,
        Some(c) if newline => {
            is_ident_continue(c) || matches!(c, ')' | ']' | '"' | '\'' | '`')
        }
        Some(_) => false,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            if c == '\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        let start_line = self.line;
        self.advance();
        match self.peek() {
            Some('/') => {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                Ok(())
            }
            Some('*') => {
                self.advance();
                loop {
                    match self.peek() {
                        None => {
                            return Err(ParseError::new(start_line, "unterminated block comment"));
                        }
                        Some('*') if self.peek_at(1) == Some('/') => {
                            self.advance();
                            self.advance();
                            return Ok(());
                        }
                        Some(_) => self.advance(),
                    }
                }
            }
            _ => Ok(()),
        }
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '/' && matches!(self.peek_at(1), Some('/') | Some('*')) {
                self.skip_comment()?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn read_ident(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            word.push(c);
            self.advance();
        }
        word
    }

    /// Read a quoted or template literal, returning its raw contents
    fn read_string(&mut self) -> Result<String, ParseError> {
        let start_line = self.line;
        let Some(quote) = self.peek() else {
            return Err(ParseError::new(start_line, "expected string literal"));
        };
        self.advance();

        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::new(start_line, "unterminated string literal"));
                }
                Some('\n') if quote != '`' => {
                    return Err(ParseError::new(start_line, "unterminated string literal"));
                }
                Some('\\') => {
                    self.advance();
                    if let Some(escaped) = self.peek() {
                        value.push(escaped);
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(value);
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Skip a balanced `{ ... }` group starting at the opening brace
    fn skip_braces(&mut self) -> Result<(), ParseError> {
        let start_line = self.line;
        let mut depth = 0usize;
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Err(ParseError::new(start_line, "unbalanced braces")),
                Some('{') => {
                    depth += 1;
                    self.advance();
                }
                Some('}') => {
                    self.advance();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some('"') | Some('\'') | Some('`') => {
                    self.read_string()?;
                }
                Some(_) => self.advance(),
            }
        }
    }

    /// `from "<module>"` at the current position
    ///
    /// `from` followed by anything but a quoted path (prose in JSX text) is
    /// not a clause.
    fn from_clause(&mut self) -> Result<Option<String>, ParseError> {
        self.skip_trivia()?;
        if !self.peek().is_some_and(is_ident_start) {
            return Ok(None);
        }
        let save = (self.pos, self.line);
        if self.read_ident() != "from" {
            (self.pos, self.line) = save;
            return Ok(None);
        }
        self.skip_trivia()?;
        match self.peek() {
            Some('"') | Some('\'') => self.read_string().map(Some),
            _ => Ok(None),
        }
    }

    /// Body of an `import` statement; the keyword is already consumed
    fn import_statement(&mut self, line: usize) -> Result<Option<ImportStatement>, ParseError> {
        self.skip_trivia()?;
        let mut type_only = false;

        match self.peek() {
            // import("m") and import.meta are expressions
            Some('(') | Some('.') => return Ok(None),
            Some('"') | Some('\'') => {
                let module = self.read_string()?;
                return Ok(Some(ImportStatement {
                    module,
                    kind: ImportKind::SideEffect,
                    type_only,
                    line,
                }));
            }
            _ => {}
        }

        loop {
            self.skip_trivia()?;
            match self.peek() {
                None | Some(';') => {
                    return Err(ParseError::new(line, "import statement has no module path"));
                }
                Some('{') => self.skip_braces()?,
                Some('*') | Some(',') => self.advance(),
                Some('=') => {
                    self.advance();
                    return self.require_clause(line, type_only).map(Some);
                }
                Some(c) if is_ident_start(c) => {
                    let save = (self.pos, self.line);
                    let word = self.read_ident();
                    if word == "from" {
                        (self.pos, self.line) = save;
                        let Some(module) = self.from_clause()? else {
                            return Ok(None);
                        };
                        return Ok(Some(ImportStatement {
                            module,
                            kind: ImportKind::Static,
                            type_only,
                            line,
                        }));
                    }
                    if word == "type" {
                        type_only = true;
                    }
                }
                Some(c) => {
                    return Err(ParseError::new(
                        line,
                        format!("unexpected '{}' in import statement", c),
                    ));
                }
            }
        }
    }

    /// `require("m")` on the right-hand side of `import x = ...`
    fn require_clause(&mut self, line: usize, type_only: bool) -> Result<ImportStatement, ParseError> {
        self.skip_trivia()?;
        if self.read_ident() != "require" {
            return Err(ParseError::new(line, "expected require(...) in import assignment"));
        }
        self.skip_trivia()?;
        if self.peek() != Some('(') {
            return Err(ParseError::new(line, "expected '(' after require"));
        }
        self.advance();
        self.skip_trivia()?;
        let module = self.read_string()?;
        self.skip_trivia()?;
        if self.peek() != Some(')') {
            return Err(ParseError::new(line, "expected ')' after module path"));
        }
        self.advance();
        Ok(ImportStatement {
            module,
            kind: ImportKind::Static,
            type_only,
            line,
        })
    }

    /// Body of an `export` statement; only `export ... from "m"` is an import
    fn export_statement(&mut self, line: usize) -> Result<Option<ImportStatement>, ParseError> {
        self.skip_trivia()?;
        let mut type_only = false;

        if self.peek().is_some_and(is_ident_start) {
            let save = (self.pos, self.line);
            if self.read_ident() == "type" {
                self.skip_trivia()?;
                if matches!(self.peek(), Some('{') | Some('*')) {
                    type_only = true;
                } else {
                    // `export type Foo = ...`
                    return Ok(None);
                }
            } else {
                (self.pos, self.line) = save;
                return Ok(None);
            }
        }

        match self.peek() {
            Some('*') => {
                self.advance();
                self.skip_trivia()?;
                if self.peek().is_some_and(is_ident_start) {
                    let save = (self.pos, self.line);
                    if self.read_ident() == "as" {
                        self.skip_trivia()?;
                        self.read_ident();
                    } else {
                        (self.pos, self.line) = save;
                    }
                }
            }
            Some('{') => self.skip_braces()?,
            _ => return Ok(None),
        }

        Ok(self.from_clause()?.map(|module| ImportStatement {
            module,
            kind: ImportKind::ReExport,
            type_only,
            line,
        }))
    }
}
