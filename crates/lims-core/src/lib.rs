//! # LIMS Core
//!
//! XML element model for the LIMS REST API.
//!
//! This crate contains everything that can be done to a resource without
//! talking to the server:
//! - Namespace prefix table and tag expansion
//! - The `Element` tree, path lookup and text updates
//! - XML parsing and serialization
//! - Builders for project, container and sample creation payloads

pub mod element;
pub mod errors;
pub mod namespaces;
pub mod path;
pub mod resources;
pub mod xml;

// Re-export commonly used types
pub use element::Element;
pub use errors::{CoreError, Result};
pub use namespaces::{expand_tag, split_qualified, NamespaceMap};
pub use resources::{
    add_user_defined_fields, container_element, project_element, sample_element,
    UserDefinedFields,
};
