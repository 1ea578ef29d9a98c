use crate::errors::{CoreError, Result};
use crate::namespaces::{expand_tag, split_qualified};
use crate::path::ElementPath;
use std::collections::BTreeMap;

/// A node of an XML resource representation.
///
/// Tags are stored fully qualified (`{uri}local`) once expanded; the prefix
/// used on the wire is recovered from the namespace table when serializing.
/// `Clone` produces an independent deep copy of the whole subtree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    tag: String,
    text: Option<String>,
    attributes: BTreeMap<String, String>,
    children: Vec<Element>,
}

impl Element {
    /// Create an element, expanding `prefix:local` shorthand
    pub fn new(tag: &str) -> Self {
        Self {
            tag: expand_tag(tag),
            ..Default::default()
        }
    }

    /// Create an element carrying text
    pub fn with_text(tag: &str, text: impl Into<String>) -> Self {
        let mut element = Self::new(tag);
        element.text = Some(text.into());
        element
    }

    /// Builder-style attribute setter
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Create an element from its parts without expanding the tag
    pub(crate) fn from_parts(
        tag: String,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            tag,
            attributes,
            ..Default::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Namespace URI of the tag, if it is qualified
    pub fn namespace(&self) -> Option<&str> {
        split_qualified(&self.tag).0
    }

    pub fn local_name(&self) -> &str {
        split_qualified(&self.tag).1
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    pub(crate) fn text_mut(&mut self) -> &mut Option<String> {
        &mut self.text
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    /// Append a child, returning a reference to it
    pub fn push(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Append a new child built from a tag, optional text and attributes
    pub fn sub_element(
        &mut self,
        tag: &str,
        text: Option<&str>,
        attributes: &[(&str, &str)],
    ) -> &mut Element {
        let mut child = Self::new(tag);
        child.text = text.map(str::to_string);
        for (name, value) in attributes {
            child.set(name, *value);
        }
        self.push(child)
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: &str) -> Option<&Element> {
        let tag = expand_tag(tag);
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        let tag = expand_tag(tag);
        self.children.iter_mut().find(|c| c.tag == tag)
    }

    /// All elements matching an element path, in document order
    pub fn find_all(&self, path: &str) -> Result<Vec<&Element>> {
        let path = ElementPath::parse(path)?;
        Ok(self
            .locate(&path)
            .iter()
            .map(|indices| self.at(indices))
            .collect())
    }

    /// First element matching an element path
    pub fn find(&self, path: &str) -> Result<Option<&Element>> {
        Ok(self.find_all(path)?.into_iter().next())
    }

    pub fn find_mut(&mut self, path: &str) -> Result<Option<&mut Element>> {
        let path = ElementPath::parse(path)?;
        Ok(match self.locate(&path).first() {
            Some(indices) => Some(self.at_mut(indices)),
            None => None,
        })
    }

    /// Update the text of the single element matching `path` and `filters`.
    ///
    /// When nothing matches and `insert_before` names a direct child, a new
    /// element carrying the filters as attributes is inserted at that
    /// child's position. Returns `self` so calls can be chained.
    pub fn set_element_text(
        &mut self,
        path: &str,
        new_value: &str,
        insert_before: Option<&str>,
        filters: &[(&str, &str)],
    ) -> Result<&mut Self> {
        let parsed = ElementPath::parse(path)?;
        let matches: Vec<Vec<usize>> = self
            .locate(&parsed)
            .into_iter()
            .filter(|indices| {
                let candidate = self.at(indices);
                filters
                    .iter()
                    .all(|(name, value)| candidate.get(name) == Some(*value))
            })
            .collect();

        match matches.as_slice() {
            [] => {
                let anchor = insert_before.ok_or_else(|| CoreError::NotFound(path.to_string()))?;
                let step = match parsed.steps() {
                    [step] if parsed.is_single_step() && step.tag.is_some() => step,
                    _ => {
                        return Err(CoreError::InvalidPath(format!(
                            "{} (new elements can only be inserted as direct children)",
                            path
                        )))
                    }
                };
                let anchor_tag = expand_tag(anchor);
                let position = self
                    .children
                    .iter()
                    .position(|c| c.tag == anchor_tag)
                    .ok_or_else(|| CoreError::InsertLocationNotFound(anchor.to_string()))?;

                let mut element = Self::with_text(step.tag.as_deref().unwrap_or(path), new_value);
                for (name, value) in &step.predicates {
                    element.set(name, value.as_str());
                }
                for (name, value) in filters {
                    element.set(name, *value);
                }
                self.children.insert(position, element);
            }
            [only] => {
                let only = only.clone();
                self.at_mut(&only).text = Some(new_value.to_string());
            }
            _ => return Err(CoreError::AmbiguousMatch(path.to_string())),
        }

        Ok(self)
    }

    /// Depth-first iterator over every element below this one
    pub fn descendants(&self) -> impl Iterator<Item = &Element> {
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }

    /// Index paths of every match, relative to `self`, in document order
    fn locate(&self, path: &ElementPath) -> Vec<Vec<usize>> {
        let mut frontier: Vec<Vec<usize>> = vec![Vec::new()];

        for step in path.steps() {
            let mut next: Vec<Vec<usize>> = Vec::new();
            for base in &frontier {
                let node = self.at(base);
                let mut candidates = Vec::new();
                if step.descendant {
                    collect_descendants(node, base.clone(), &mut candidates);
                } else {
                    candidates.extend((0..node.children.len()).map(|i| {
                        let mut indices = base.clone();
                        indices.push(i);
                        indices
                    }));
                }
                for indices in candidates {
                    if step.matches(self.at(&indices)) && !next.contains(&indices) {
                        next.push(indices);
                    }
                }
            }
            frontier = next;
        }

        frontier
    }

    fn at(&self, indices: &[usize]) -> &Element {
        indices.iter().fold(self, |node, &i| &node.children[i])
    }

    fn at_mut(&mut self, indices: &[usize]) -> &mut Element {
        indices.iter().fold(self, |node, &i| &mut node.children[i])
    }
}

fn collect_descendants(node: &Element, base: Vec<usize>, out: &mut Vec<Vec<usize>>) {
    for (i, child) in node.children.iter().enumerate() {
        let mut indices = base.clone();
        indices.push(i);
        out.push(indices.clone());
        collect_descendants(child, indices, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Element {
        let mut root = Element::new("prj:project");
        root.sub_element("name", Some("Alpha"), &[]);
        root.sub_element("udf:field", Some("1"), &[("name", "Depth")]);
        root.sub_element("udf:field", Some("2"), &[("name", "Reads")]);
        let location = root.sub_element("location", None, &[]);
        location.sub_element("value", Some("A:1"), &[]);
        root
    }

    #[test]
    fn test_new_expands_prefix() {
        let element = Element::new("smp:sample");
        assert_eq!(element.tag(), "{http://genologics.com/ri/sample}sample");
        assert_eq!(element.namespace(), Some("http://genologics.com/ri/sample"));
        assert_eq!(element.local_name(), "sample");
    }

    #[test]
    fn test_sub_element_preserves_order() {
        let root = sample_tree();
        let names: Vec<&str> = root.children().iter().map(|c| c.local_name()).collect();
        assert_eq!(names, vec!["name", "field", "field", "location"]);
    }

    #[test]
    fn test_find_paths() {
        let root = sample_tree();
        assert_eq!(
            root.find("location/value").unwrap().and_then(|e| e.text()),
            Some("A:1")
        );
        assert_eq!(root.find_all("udf:field").unwrap().len(), 2);
        assert_eq!(
            root.find(r#"udf:field[@name="Reads"]"#)
                .unwrap()
                .and_then(|e| e.text()),
            Some("2")
        );
        assert_eq!(root.find_all(".//value").unwrap().len(), 1);
        assert!(root.find("missing").unwrap().is_none());
    }

    #[test]
    fn test_set_element_text_single_match() {
        let mut root = sample_tree();
        let before = root.clone();
        root.set_element_text("name", "Beta", None, &[]).unwrap();
        assert_eq!(root.child("name").and_then(|e| e.text()), Some("Beta"));
        // Only the matched element changed
        assert_eq!(root.children()[1..], before.children()[1..]);
    }

    #[test]
    fn test_set_element_text_with_filter() {
        let mut root = sample_tree();
        root.set_element_text("udf:field", "9", None, &[("name", "Depth")])
            .unwrap();
        assert_eq!(root.children()[1].text(), Some("9"));
        assert_eq!(root.children()[2].text(), Some("2"));
    }

    #[test]
    fn test_set_element_text_not_found() {
        let mut root = sample_tree();
        let err = root.set_element_text("open-date", "2024-01-01", None, &[]);
        assert!(matches!(err, Err(CoreError::NotFound(_))));
    }

    #[test]
    fn test_set_element_text_ambiguous() {
        let mut root = sample_tree();
        let err = root.set_element_text("udf:field", "3", None, &[]);
        assert!(matches!(err, Err(CoreError::AmbiguousMatch(_))));
    }

    #[test]
    fn test_set_element_text_inserts_before_anchor() {
        let mut root = sample_tree();
        root.set_element_text("open-date", "2024-01-01", Some("location"), &[])
            .unwrap();
        let names: Vec<&str> = root.children().iter().map(|c| c.local_name()).collect();
        assert_eq!(names, vec!["name", "field", "field", "open-date", "location"]);

        let err = root.set_element_text("other", "x", Some("nowhere"), &[]);
        assert!(matches!(err, Err(CoreError::InsertLocationNotFound(_))));
    }

    #[test]
    fn test_inserted_element_carries_filters() {
        let mut root = sample_tree();
        root.set_element_text("udf:field", "7", Some("location"), &[("name", "Lanes")])
            .unwrap();
        let inserted = &root.children()[3];
        assert_eq!(inserted.get("name"), Some("Lanes"));
        assert_eq!(inserted.text(), Some("7"));

        root.set_element_text(r#"udf:field[@name="Yield"]"#, "30", Some("location"), &[])
            .unwrap();
        let inserted = root.find(r#"udf:field[@name="Yield"]"#).unwrap().unwrap();
        assert_eq!(inserted.text(), Some("30"));

        let err = root.set_element_text(".//missing", "x", Some("location"), &[]);
        assert!(matches!(err, Err(CoreError::InvalidPath(_))));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = sample_tree();
        let names: Vec<&str> = root.descendants().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["name", "field", "field", "location", "value"]);
    }

    #[test]
    fn test_clone_is_deep() {
        let root = sample_tree();
        let mut copy = root.clone();
        copy.set_element_text("location/value", "B:2", None, &[])
            .unwrap();
        assert_eq!(
            root.find("location/value").unwrap().and_then(|e| e.text()),
            Some("A:1")
        );
    }
}
