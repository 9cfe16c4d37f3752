use crate::error::{Error, Result};
use crate::scanner::SourceText;
use log::{debug, warn};
use std::path::PathBuf;
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceFile, SourceMap, SourceMapper, Span};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax, TsConfig};

/// AST parser for TypeScript sources.
///
/// Every file parsed by one `AstParser` is registered in the same [`SourceMap`], so
/// spans are unique across all of them and any span can be turned back into text.
///
/// # Example
///
/// ```no_run
/// use futen_openapi::parser::AstParser;
///
/// let parser = AstParser::new();
/// let parsed = parser.parse_source("generated.ts", "const a = 1;").unwrap();
/// println!("Parsed {} items", parsed.module.body.len());
/// ```
pub struct AstParser {
    source_map: Lrc<SourceMap>,
}

/// A successfully parsed TypeScript file.
#[derive(Debug)]
pub struct ParsedFile {
    /// Virtual file name
    pub name: String,
    /// The parsed module
    pub module: Module,
    /// Source file registered in the parser's source map
    pub source: Lrc<SourceFile>,
}

impl ParsedFile {
    /// Whether this is a declaration file (`.d.ts` / `.d.mts`).
    pub fn is_declaration(&self) -> bool {
        is_declaration_file(&self.name)
    }

    /// Whether the span lies inside this file.
    pub fn contains(&self, span: Span) -> bool {
        span.lo >= self.source.start_pos && span.lo <= self.source.end_pos
    }

    /// Source text covered by a span of this file.
    pub fn text(&self, span: Span) -> Option<&str> {
        if !self.contains(span) || span.hi > self.source.end_pos || span.hi < span.lo {
            return None;
        }
        let lo = (span.lo.0 - self.source.start_pos.0) as usize;
        let hi = (span.hi.0 - self.source.start_pos.0) as usize;
        self.source.src.get(lo..hi)
    }
}

impl AstParser {
    pub fn new() -> Self {
        Self {
            source_map: Lrc::new(SourceMap::default()),
        }
    }

    pub fn source_map(&self) -> &Lrc<SourceMap> {
        &self.source_map
    }

    /// Parses one source text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the text is not valid TypeScript.
    pub fn parse_source(&self, name: &str, content: &str) -> Result<ParsedFile> {
        debug!("Parsing file: {}", name);

        let source = self
            .source_map
            .new_source_file(FileName::Custom(name.to_string()), content.to_string());
        let lexer = Lexer::new(
            Syntax::Typescript(TsConfig {
                tsx: name.ends_with(".tsx"),
                decorators: true,
                dts: is_declaration_file(name),
                ..Default::default()
            }),
            EsVersion::Es2022,
            StringInput::from(&*source),
            None,
        );
        let mut parser = Parser::new_from(lexer);

        let module = parser.parse_module().map_err(|err| Error::ParseError {
            file: PathBuf::from(name),
            message: err.kind().msg().to_string(),
        })?;

        let recovered = parser.take_errors();
        if !recovered.is_empty() {
            debug!("{} recoverable syntax error(s) in {}", recovered.len(), name);
        }

        Ok(ParsedFile {
            name: name.to_string(),
            module,
            source,
        })
    }

    /// Parses several sources, skipping the ones that fail.
    ///
    /// Failures are logged as warnings so that analysis can continue with the files
    /// that did parse.
    pub fn parse_sources(&self, sources: &[SourceText]) -> Vec<ParsedFile> {
        debug!("Parsing {} files", sources.len());

        let parsed: Vec<ParsedFile> = sources
            .iter()
            .filter_map(|source| match self.parse_source(&source.name, &source.content) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("Skipping {}: {}", source.name, e);
                    None
                }
            })
            .collect();

        debug!(
            "Parsing complete: {} succeeded, {} failed",
            parsed.len(),
            sources.len() - parsed.len()
        );
        parsed
    }

    /// Source text covered by a span.
    pub fn snippet(&self, span: Span) -> Option<String> {
        self.source_map.span_to_snippet(span).ok()
    }
}

impl Default for AstParser {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_declaration_file(name: &str) -> bool {
    name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts")
}
