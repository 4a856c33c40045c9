//! Parallel parsing of independent sources.

use rayon::prelude::*;

use super::{Parser, ParserConfig};
use crate::error::Result;
use crate::language::Language;
use crate::tree::Tree;

/// Parse every source in parallel, one [`Parser`] per worker thread.
/// Results are in input order.
pub fn parse_batch(language: &Language, sources: &[&str], config: &ParserConfig) -> Vec<Result<Tree>> {
    tracing::debug!(language = language.name(), count = sources.len(), "parse_batch");
    sources
        .par_iter()
        .map_init(
            || Parser::with_language(language.clone()).with_config(config.clone()),
            |parser, source| parser.parse(source, None),
        )
        .collect()
}
