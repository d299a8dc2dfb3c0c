use crate::config::QueryConfig;
use crate::error::{QueryError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line of reported context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    /// 1-based line number
    pub number: usize,
    pub text: String,
    pub is_match: bool,
}

/// All matches within one file, with surrounding context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,

    /// Total matches in the file (may exceed the reported groups)
    pub match_count: usize,

    pub context: Vec<ContextLine>,
}

/// Result of one search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub files_scanned: usize,
    pub total_matches: usize,

    /// True when the hit list stopped at the caller's limit
    pub truncated: bool,
}

const REGEX_METACHARACTERS: &[char] = &[
    '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '^', '$', '\\',
];

/// Compile the query: regex when it carries metacharacters, literal
/// otherwise. Case-insensitive unless asked. A query with
/// metacharacters that fails to compile is rejected, not guessed at.
pub(crate) fn compile_query(query: &str, case_sensitive: bool) -> Result<Regex> {
    let pattern = if query.chars().any(|c| REGEX_METACHARACTERS.contains(&c)) {
        query.to_string()
    } else {
        regex::escape(query)
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| QueryError::InvalidRegex {
            pattern: query.to_string(),
            reason: e.to_string(),
        })
}

/// Scan one body for matches and assemble the context block.
pub(crate) fn scan_body(
    path: &str,
    body: &str,
    regex: &Regex,
    config: &QueryConfig,
) -> Option<SearchHit> {
    let match_starts: Vec<usize> = regex.find_iter(body).map(|m| m.start()).collect();
    if match_starts.is_empty() {
        return None;
    }

    let lines: Vec<&str> = body.lines().collect();
    // Offsets -> line numbers without rescanning per match.
    let mut line_starts = vec![0usize];
    for (offset, byte) in body.bytes().enumerate() {
        if byte == b'\n' {
            line_starts.push(offset + 1);
        }
    }

    let mut context: BTreeMap<usize, bool> = BTreeMap::new();
    for start in match_starts.iter().take(config.max_matches_per_file) {
        let line_idx = match line_starts.binary_search(start) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        let from = line_idx.saturating_sub(config.context_lines);
        let to = (line_idx + config.context_lines).min(lines.len().saturating_sub(1));
        for i in from..=to {
            let entry = context.entry(i).or_insert(false);
            *entry |= i == line_idx;
        }
    }

    let context = context
        .into_iter()
        .filter_map(|(idx, is_match)| {
            lines.get(idx).map(|text| ContextLine {
                number: idx + 1,
                text: (*text).to_string(),
                is_match,
            })
        })
        .collect();

    Some(SearchHit {
        path: path.to_string(),
        match_count: match_starts.len(),
        context,
    })
}
