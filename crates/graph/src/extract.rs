use manifold_store::ImportExtractor;
use std::collections::BTreeSet;
use std::path::Path;

/// Default line-scanning extractor covering Rust (`use`, `mod`) and
/// Python (`import`, `from … import`) forms. It is deliberately not a
/// parser: strings inside comments can produce false edges, which is
/// acceptable for risk scoring.
#[derive(Debug, Clone, Default)]
pub struct LineImportExtractor;

impl LineImportExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ImportExtractor for LineImportExtractor {
    fn extract_imports(&self, body: &str) -> BTreeSet<String> {
        let mut imports = BTreeSet::new();
        for line in body.lines() {
            let line = line.trim_start();

            if let Some(rest) = line.strip_prefix("use ") {
                if let Some(module) = first_module_segment(rest, "::") {
                    imports.insert(module);
                }
            } else if let Some(rest) = line.strip_prefix("pub use ") {
                if let Some(module) = first_module_segment(rest, "::") {
                    imports.insert(module);
                }
            } else if let Some(rest) = line.strip_prefix("mod ") {
                if let Some(module) = bare_identifier(rest) {
                    imports.insert(module);
                }
            } else if let Some(rest) = line.strip_prefix("pub mod ") {
                if let Some(module) = bare_identifier(rest) {
                    imports.insert(module);
                }
            } else if let Some(rest) = line.strip_prefix("import ") {
                for target in rest.split(',') {
                    let target = target.trim().split_whitespace().next().unwrap_or("");
                    if let Some(module) = dotted_module(target) {
                        imports.insert(module);
                    }
                }
            } else if let Some(rest) = line.strip_prefix("from ") {
                if let Some((target, _)) = rest.split_once(" import ") {
                    if let Some(module) = dotted_module(target.trim()) {
                        imports.insert(module);
                    }
                }
            }
        }
        imports
    }

    fn path_to_module(&self, path: &str) -> Option<String> {
        let path = Path::new(path);
        let stem = path.file_stem()?.to_str()?;
        let parent = path
            .parent()
            .map(|p| p.to_string_lossy().replace('/', "."))
            .filter(|p| !p.is_empty());

        // mod.rs / lib.rs / __init__.py export the containing directory.
        let module = if matches!(stem, "mod" | "lib" | "__init__") {
            parent?
        } else {
            match parent {
                Some(parent) => format!("{parent}.{stem}"),
                None => stem.to_string(),
            }
        };
        Some(module)
    }
}

fn first_module_segment(rest: &str, separator: &str) -> Option<String> {
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| c == ';' || c == '{' || c.is_whitespace())
        .unwrap_or(rest.len());
    let full = &rest[..end];
    let head = full.split(separator).next()?.trim();
    if head.is_empty() || head == "crate" || head == "super" || head == "self" || head == "std" {
        return None;
    }
    Some(head.to_string())
}

fn bare_identifier(rest: &str) -> Option<String> {
    let name: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

fn dotted_module(target: &str) -> Option<String> {
    let trimmed = target.trim_start_matches('.');
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
    {
        return None;
    }
    Some(trimmed.to_string())
}
