use crate::element::Element;
use log::debug;

/// User-defined fields to attach to a resource.
///
/// Typed groups become `udf:type` children holding `udf:field`
/// grandchildren; plain fields become `udf:field` children. Fields with an
/// empty value are never written because the API rejects empty UDF tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDefinedFields {
    pub types: Vec<(String, Vec<(String, String)>)>,
    pub fields: Vec<(String, String)>,
}

impl UserDefinedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named field-type group
    pub fn with_type<I, K, V>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.types.push((name.into(), fields));
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

/// Append user-defined field elements to `parent`
pub fn add_user_defined_fields<'a>(
    parent: &'a mut Element,
    udfs: &UserDefinedFields,
) -> &'a mut Element {
    for (type_name, fields) in &udfs.types {
        let udt = parent.sub_element("udf:type", None, &[("name", type_name.as_str())]);
        for (name, value) in fields.iter().filter(|(_, v)| !v.is_empty()) {
            udt.sub_element("udf:field", Some(value.as_str()), &[("name", name.as_str())]);
        }
    }
    for (name, value) in udfs.fields.iter().filter(|(_, v)| !v.is_empty()) {
        parent.sub_element("udf:field", Some(value.as_str()), &[("name", name.as_str())]);
    }
    parent
}

fn reference_uri(base_uri: &str, collection: &str, id: &str) -> String {
    format!("{}/{}/{}", base_uri.trim_end_matches('/'), collection, id)
}

fn log_payload(element: &Element) {
    if log::log_enabled!(log::Level::Debug) {
        match element.to_pretty_string() {
            Ok(xml) => debug!("{}", xml),
            Err(e) => debug!("Could not render <{}>: {}", element.local_name(), e),
        }
    }
}

/// Creation payload for a project.
///
/// `open_date` is `YYYY-MM-DD`; the researcher link is built from the
/// versioned `base_uri`.
pub fn project_element(
    base_uri: &str,
    name: &str,
    researcher_id: &str,
    open_date: Option<&str>,
    udfs: &UserDefinedFields,
) -> Element {
    let mut project = Element::new("prj:project");
    project.sub_element("name", Some(name), &[]);
    if let Some(date) = open_date.filter(|d| !d.is_empty()) {
        project.sub_element("open-date", Some(date), &[]);
    }
    let researcher = reference_uri(base_uri, "researchers", researcher_id);
    project.sub_element("researcher", None, &[("uri", researcher.as_str())]);
    add_user_defined_fields(&mut project, udfs);
    log_payload(&project);
    project
}

/// Creation payload for an empty container of the given container type
pub fn container_element(
    base_uri: &str,
    name: &str,
    container_type_id: &str,
    udfs: &UserDefinedFields,
) -> Element {
    let mut container = Element::new("con:container");
    container.sub_element("name", Some(name), &[]);
    let container_type = reference_uri(base_uri, "containertypes", container_type_id);
    container.sub_element("type", None, &[("uri", container_type.as_str())]);
    add_user_defined_fields(&mut container, udfs);
    log_payload(&container);
    container
}

/// Creation payload for a sample placed at `location` (e.g. `1:1`) in an
/// existing empty container
pub fn sample_element(
    base_uri: &str,
    name: &str,
    project_id: &str,
    container_id: &str,
    location: &str,
    date_received: Option<&str>,
    udfs: &UserDefinedFields,
) -> Element {
    let mut sample = Element::new("smp:samplecreation");
    sample.sub_element("name", Some(name), &[]);
    if let Some(date) = date_received.filter(|d| !d.is_empty()) {
        sample.sub_element("date-received", Some(date), &[]);
    }
    let project = reference_uri(base_uri, "projects", project_id);
    sample.sub_element("project", None, &[("uri", project.as_str())]);
    add_user_defined_fields(&mut sample, udfs);
    let placement = sample.sub_element("location", None, &[]);
    placement.sub_element("container", None, &[("limsid", container_id)]);
    placement.sub_element("value", Some(location), &[]);
    log_payload(&sample);
    sample
}
