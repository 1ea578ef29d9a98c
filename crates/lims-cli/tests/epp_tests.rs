use lims_api::{ApiVersion, HttpRequest, HttpResponse, LimsClient, Method, Session, Transport};
use lims_cli::{ProcessErrorFlagger, Script, Severity};
use lims_core::Element;
use lims_utils::Credentials;
use std::sync::{Arc, Mutex};

const PROCESS_URI: &str = "http://lims:8080/api/v2/processes/24-1";
const COMMAND_LINE: &str = "run.sh -p secret http://lims:8080/api/v2/processes/24-1";

const PROCESS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<prc:process xmlns:prc="http://genologics.com/ri/process" uri="http://lims:8080/api/v2/processes/24-1" limsid="24-1">
    <input-output-map>
        <input uri="http://lims:8080/api/v2/artifacts/I1" limsid="I1"/>
        <output uri="http://lims:8080/api/v2/artifacts/O1" output-type="Analyte"/>
    </input-output-map>
    <input-output-map>
        <input uri="http://lims:8080/api/v2/artifacts/I2" limsid="I2"/>
        <output uri="http://lims:8080/api/v2/artifacts/O1" output-type="Analyte"/>
    </input-output-map>
    <input-output-map>
        <input uri="http://lims:8080/api/v2/artifacts/I2" limsid="I2"/>
        <output uri="http://lims:8080/api/v2/artifacts/O2" output-type="Analyte"/>
    </input-output-map>
</prc:process>"#;

const EMPTY_PROCESS: &str = r#"<prc:process xmlns:prc="http://genologics.com/ri/process" uri="http://lims:8080/api/v2/processes/24-1" limsid="24-1">
    <type>Aggregate QC</type>
</prc:process>"#;

const ARTIFACTS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<art:details xmlns:art="http://genologics.com/ri/artifact">
    <art:artifact uri="http://lims:8080/api/v2/artifacts/O1" limsid="O1">
        <name>one</name>
        <artifact-flag name="External Program Error" typeID="-1">
            <creator uri="http://lims:8080/api/v2/researchers/3"/>
            <last-modified-date>2024-01-01</last-modified-date>
            <note>old</note>
        </artifact-flag>
    </art:artifact>
    <art:artifact uri="http://lims:8080/api/v2/artifacts/O2" limsid="O2">
        <name>two</name>
    </art:artifact>
</art:details>"#;

const UPDATED: &str = r#"<ri:links xmlns:ri="http://genologics.com/ri">
    <link uri="http://lims:8080/api/v2/artifacts/O1" rel="artifacts"/>
    <link uri="http://lims:8080/api/v2/artifacts/O2" rel="artifacts"/>
</ri:links>"#;

/// Serves a fixed process plus the batch endpoints and records every request
struct FakeLims {
    process: &'static str,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeLims {
    fn new(process: &'static str) -> Arc<Self> {
        Arc::new(Self {
            process,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeLims {
    fn execute(&self, request: &HttpRequest) -> lims_api::Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let body = if request.url.ends_with("/artifacts/batch/retrieve") {
            ARTIFACTS
        } else if request.url.ends_with("/artifacts/batch/update") {
            UPDATED
        } else {
            self.process
        };
        Ok(HttpResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        })
    }
}

fn client(transport: Arc<FakeLims>) -> LimsClient {
    let session = Session::new(
        "http://lims:8080/api/v2",
        Credentials::new("lims", "alice", "secret"),
    )
    .with_api_version(ApiVersion::parse("v2", "r21").unwrap());
    LimsClient::new(session, transport)
}

fn body(request: &HttpRequest) -> Element {
    Element::parse(request.body.as_deref().unwrap()).unwrap()
}

fn artifact<'a>(details: &'a Element, limsid: &str) -> &'a Element {
    details
        .children()
        .iter()
        .find(|a| a.get("limsid") == Some(limsid))
        .unwrap()
}

fn error_flag_note(artifact: &Element) -> String {
    let flag = artifact
        .find(r#"artifact-flag[@typeID="-1"]"#)
        .unwrap()
        .unwrap();
    flag.child("note").and_then(|n| n.text()).unwrap().to_string()
}

#[test]
fn test_flag_outputs_round_trip() {
    let transport = FakeLims::new(PROCESS);
    let client = client(transport.clone());
    let flagger = ProcessErrorFlagger::new(PROCESS_URI, COMMAND_LINE);

    let updated = flagger.flag_outputs(&client, "boom").unwrap();
    assert_eq!(
        updated,
        vec![
            "http://lims:8080/api/v2/artifacts/O1".to_string(),
            "http://lims:8080/api/v2/artifacts/O2".to_string(),
        ]
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].url, PROCESS_URI);

    // O1 appears in two input-output maps but is retrieved once
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(requests[1].url, "http://lims:8080/api/v2/artifacts/batch/retrieve");
    let links = body(&requests[1]);
    assert_eq!(links.local_name(), "links");
    let uris: Vec<&str> = links.children().iter().filter_map(|l| l.get("uri")).collect();
    assert_eq!(
        uris,
        vec![
            "http://lims:8080/api/v2/artifacts/O1",
            "http://lims:8080/api/v2/artifacts/O2",
        ]
    );

    assert_eq!(requests[2].method, Method::Post);
    assert_eq!(requests[2].url, "http://lims:8080/api/v2/artifacts/batch/update");
    let details = body(&requests[2]);
    assert_eq!(details.local_name(), "details");
    assert_eq!(details.children().len(), 2);

    let extended = error_flag_note(artifact(&details, "O1"));
    assert!(extended.starts_with("old\r\nOops...\r\n"));
    assert!(extended.ends_with("\nrun.sh -p **** http://lims:8080/api/v2/processes/24-1\nboom"));
    assert_eq!(
        artifact(&details, "O1")
            .find_all("artifact-flag")
            .unwrap()
            .len(),
        1
    );

    let created = artifact(&details, "O2")
        .find(r#"artifact-flag[@typeID="-1"]"#)
        .unwrap()
        .unwrap();
    assert_eq!(created.get("name"), Some("External Program Error"));
    assert_eq!(
        created.child("creator").and_then(|c| c.get("uri")),
        Some("http://lims:8080/api/v2/researchers/1")
    );
    let date = created
        .child("last-modified-date")
        .and_then(|d| d.text())
        .unwrap();
    assert_eq!(date.len(), "2024-01-01".len());
    let note = error_flag_note(artifact(&details, "O2"));
    assert!(note.starts_with("Oops...\r\n"));
    assert!(note.ends_with("\nboom"));

    let raw = String::from_utf8(requests[2].body.clone().unwrap()).unwrap();
    assert!(!raw.contains("secret"));
}

#[test]
fn test_process_without_outputs_sends_nothing_else() {
    let transport = FakeLims::new(EMPTY_PROCESS);
    let client = client(transport.clone());
    let flagger = ProcessErrorFlagger::new(PROCESS_URI, COMMAND_LINE);

    assert!(flagger.flag_outputs(&client, "boom").unwrap().is_empty());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].url, PROCESS_URI);
}

#[test]
fn test_failed_exit_flags_process_outputs() {
    let transport = FakeLims::new(PROCESS);
    let script = Script::new("EPP script")
        .with_client(client(transport.clone()))
        .with_exit_hook(ProcessErrorFlagger::new(PROCESS_URI, COMMAND_LINE));

    script.prepare_exit("all good", Severity::Warning, 0, false);
    assert!(transport.requests().is_empty());

    script.prepare_exit("boom", Severity::Error, 1, false);
    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    let update = requests.last().unwrap();
    assert_eq!(update.url, "http://lims:8080/api/v2/artifacts/batch/update");
    let details = body(update);
    assert!(error_flag_note(artifact(&details, "O2")).ends_with("\nboom"));
}
