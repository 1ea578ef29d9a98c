use crate::errors::{CoreError, Result};
use crate::namespaces::expand_tag;
use regex::Regex;
use std::sync::OnceLock;

/// One `/`-separated step of an element path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// Match at any depth below the current node instead of direct children only
    pub descendant: bool,
    /// Expanded tag, `None` for `*`
    pub tag: Option<String>,
    /// `[@name="value"]` predicates, all of which must hold
    pub predicates: Vec<(String, String)>,
}

impl PathStep {
    pub fn matches(&self, element: &crate::Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        self.predicates
            .iter()
            .all(|(name, value)| element.get(name) == Some(value.as_str()))
    }
}

/// Small subset of the ElementTree path language.
///
/// Supported: `tag`, `a/b`, `.//tag`, `a//b`, `*`, `tag[@attr="value"]`.
/// Tags may use `prefix:local` shorthand or `{uri}local`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    steps: Vec<PathStep>,
}

impl ElementPath {
    pub fn parse(path: &str) -> Result<Self> {
        let mut steps = Vec::new();
        let mut descendant = false;

        for (index, segment) in split_segments(path)?.into_iter().enumerate() {
            match segment.as_str() {
                "." if index == 0 => continue,
                "" if index == 0 => {
                    return Err(CoreError::InvalidPath(format!(
                        "{} (absolute paths are not supported)",
                        path
                    )))
                }
                "" => {
                    descendant = true;
                    continue;
                }
                _ => {}
            }
            steps.push(parse_step(&segment, descendant, path)?);
            descendant = false;
        }

        if descendant || steps.is_empty() {
            return Err(CoreError::InvalidPath(path.to_string()));
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// True when the path is a single direct-child step
    pub fn is_single_step(&self) -> bool {
        self.steps.len() == 1 && !self.steps[0].descendant
    }
}

/// Split on `/`, ignoring slashes inside `{uri}` and `[...]`
fn split_segments(path: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_braces = false;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    for c in path.chars() {
        match (c, quote) {
            (q, Some(open)) if q == open => quote = None,
            (_, Some(_)) => {}
            ('"' | '\'', None) if in_brackets => quote = Some(c),
            ('{', None) => in_braces = true,
            ('}', None) => in_braces = false,
            ('[', None) => in_brackets = true,
            (']', None) => in_brackets = false,
            ('/', None) if !in_braces && !in_brackets => {
                segments.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }

    if in_braces || in_brackets || quote.is_some() {
        return Err(CoreError::InvalidPath(path.to_string()));
    }
    segments.push(current);
    Ok(segments)
}

fn parse_step(segment: &str, descendant: bool, path: &str) -> Result<PathStep> {
    static PREDICATE: OnceLock<Regex> = OnceLock::new();
    let predicate = PREDICATE.get_or_init(|| {
        Regex::new(r#"\[@([^=\]\s]+)\s*=\s*(?:"([^"]*)"|'([^']*)')\]"#)
            .expect("predicate pattern is valid")
    });

    let (tag, rest) = match segment.find('[') {
        Some(pos) if !segment[..pos].contains('{') || segment[..pos].contains('}') => {
            segment.split_at(pos)
        }
        _ => (segment, ""),
    };

    let mut predicates = Vec::new();
    let mut consumed = 0;
    for caps in predicate.captures_iter(rest) {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        consumed += whole.len();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        predicates.push((caps[1].to_string(), value));
    }

    if tag.is_empty() || consumed != rest.len() {
        return Err(CoreError::InvalidPath(path.to_string()));
    }

    Ok(PathStep {
        descendant,
        tag: (tag != "*").then(|| expand_tag(tag)),
        predicates,
    })
}
