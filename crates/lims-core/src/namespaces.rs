use std::collections::HashMap;
use std::sync::OnceLock;

/// Prefixes understood by the REST API and the namespaces they stand for
pub const STANDARD_NAMESPACES: &[(&str, &str)] = &[
    ("artgr", "http://genologics.com/ri/artifactgroup"),
    ("art", "http://genologics.com/ri/artifact"),
    ("cnf", "http://genologics.com/ri/configuration"),
    ("con", "http://genologics.com/ri/container"),
    ("ctp", "http://genologics.com/ri/containertype"),
    ("exc", "http://genologics.com/ri/exception"),
    ("file", "http://genologics.com/ri/file"),
    ("lab", "http://genologics.com/ri/lab"),
    ("perm", "http://genologics.com/ri/permissions"),
    ("prc", "http://genologics.com/ri/process"),
    ("prj", "http://genologics.com/ri/project"),
    ("prop", "http://genologics.com/ri/property"),
    ("prx", "http://genologics.com/ri/processexecution"),
    ("ptp", "http://genologics.com/ri/processtype"),
    ("res", "http://genologics.com/ri/researcher"),
    ("rgt", "http://genologics.com/ri/reagent"),
    ("ri", "http://genologics.com/ri"),
    ("rtp", "http://genologics.com/ri/reagenttype"),
    ("smp", "http://genologics.com/ri/sample"),
    ("udf", "http://genologics.com/ri/userdefined"),
    ("ver", "http://genologics.com/ri/version"),
];

/// Bidirectional prefix <-> namespace URI table.
///
/// A map is immutable once built. Every prefix maps to exactly one URI and
/// every URI to exactly one prefix; when a table lists the same URI twice the
/// first prefix wins the reverse lookup.
#[derive(Debug, Clone)]
pub struct NamespaceMap {
    by_prefix: HashMap<String, String>,
    by_uri: HashMap<String, String>,
}

impl NamespaceMap {
    /// Build a map from `(prefix, uri)` pairs
    pub fn new<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut by_prefix = HashMap::new();
        let mut by_uri = HashMap::new();
        for (prefix, uri) in entries {
            by_prefix.insert(prefix.to_string(), uri.to_string());
            by_uri
                .entry(uri.to_string())
                .or_insert_with(|| prefix.to_string());
        }
        Self { by_prefix, by_uri }
    }

    /// The table used by the REST API
    pub fn standard() -> &'static NamespaceMap {
        static STANDARD: OnceLock<NamespaceMap> = OnceLock::new();
        STANDARD.get_or_init(|| NamespaceMap::new(STANDARD_NAMESPACES.iter().copied()))
    }

    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.by_prefix.get(prefix).map(String::as_str)
    }

    pub fn prefix(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(String::as_str)
    }

    /// Rewrite `prefix:local` into `{uri}local` when the prefix is known.
    ///
    /// Anything else, including tags that are already qualified, is returned
    /// unchanged.
    pub fn expand(&self, tag: &str) -> String {
        let mut parts = tag.split(':');
        if let (Some(prefix), Some(local), None) = (parts.next(), parts.next(), parts.next()) {
            if let Some(uri) = self.uri(prefix) {
                return format!("{{{}}}{}", uri, local);
            }
        }
        tag.to_string()
    }

    /// Prefix that a qualified tag serializes with, if its namespace is known
    pub fn prefix_of_tag(&self, tag: &str) -> Option<&str> {
        split_qualified(tag).0.and_then(|uri| self.prefix(uri))
    }
}

/// Expand a tag against the standard namespace table
pub fn expand_tag(tag: &str) -> String {
    NamespaceMap::standard().expand(tag)
}

/// Split `{uri}local` into its namespace and local name
pub fn split_qualified(tag: &str) -> (Option<&str>, &str) {
    if let Some(rest) = tag.strip_prefix('{') {
        if let Some(end) = rest.find('}') {
            return (Some(&rest[..end]), &rest[end + 1..]);
        }
    }
    (None, tag)
}
