//! Integration tests against a mock FogBugz server
//!
//! Covers the full flow: probe → logon → command → decoded records

use fogline::config::Config;
use fogline::error::FoglineError;
use fogline::models::{CaseFields, FieldValue, Selector};
use fogline::{FogBugzClient, PeopleFilter, PersonKind};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROBE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<response><version>8</version><minversion>1</minversion><url>api.asp?</url></response>";

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml")
        .set_body_string(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><response>{}</response>",
            body
        ))
}

fn config_for(server: &MockServer) -> Config {
    let host = server.uri().trim_start_matches("http://").to_string();
    Config::new(host).unwrap().with_ssl(false)
}

async fn mount_probe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROBE))
        .mount(server)
        .await;
}

async fn connected(server: &MockServer) -> FogBugzClient {
    mount_probe(server).await;
    FogBugzClient::connect(&config_for(server).with_token("tok123"))
        .await
        .unwrap()
}

/// Answers one POST whose body carries every pair in `params`.
async fn mount_command(server: &MockServer, params: &[&str], body: &str) {
    let mut mock = Mock::given(method("POST")).and(path("/api.asp"));
    for param in params {
        mock = mock.and(body_string_contains(*param));
    }
    mock.respond_with(xml(body)).expect(1).mount(server).await;
}

fn keys(set: &fogline::models::RecordSet) -> Vec<&str> {
    set.keys().map(String::as_str).collect()
}

// ============================================================================
// Probe and session
// ============================================================================

#[tokio::test]
async fn test_connect_reads_probe() {
    let server = MockServer::start().await;
    mount_probe(&server).await;

    let client = FogBugzClient::connect(&config_for(&server)).await.unwrap();
    let session = client.session();

    assert_eq!(session.api_version, 8);
    assert_eq!(session.api_minversion, 1);
    assert_eq!(session.api_url, "/api.asp?");
    assert!(!client.is_logged_on());
    assert_eq!(client.token(), "");
}

#[tokio::test]
async fn test_connect_rejects_newer_protocol() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.xml"))
        .respond_with(xml("<version>12</version><minversion>9</minversion><url>api.asp?</url>"))
        .mount(&server)
        .await;

    let err = FogBugzClient::connect(&config_for(&server))
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        FoglineError::ProtocolVersion {
            required: 9,
            supported: 5
        }
    ));
}

#[tokio::test]
async fn test_connect_rejects_malformed_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>"))
        .mount(&server)
        .await;

    let err = FogBugzClient::connect(&config_for(&server))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, FoglineError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_logon_stores_token() {
    let server = MockServer::start().await;
    mount_probe(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=logon"))
        .and(body_string_contains("email=ada%40example.com"))
        .and(body_string_contains("password=p%40ss%20word"))
        .respond_with(xml("<token><![CDATA[24dsg34lok43un23]]></token>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = FogBugzClient::connect(&config_for(&server)).await.unwrap();
    let token = client.logon("ada@example.com", "p@ss word").await.unwrap();

    assert_eq!(token, "24dsg34lok43un23");
    assert_eq!(client.token(), "24dsg34lok43un23");
    assert!(client.is_logged_on());
}

#[tokio::test]
async fn test_logon_bad_credentials_keeps_token() {
    let server = MockServer::start().await;
    let mut client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=logon"))
        .respond_with(xml("<error code=\"1\">Incorrect password or username</error>"))
        .mount(&server)
        .await;

    let err = client.logon("ada@example.com", "wrong").await.unwrap_err();

    assert!(matches!(err, FoglineError::Authentication { code: 1, .. }));
    assert_eq!(client.token(), "tok123");
}

#[tokio::test]
async fn test_logon_ambiguous_user_lists_candidates() {
    let server = MockServer::start().await;
    mount_probe(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(xml(
            "<error code=\"2\">Ambiguous Logon</error>\
             <people><person><![CDATA[Old MacDonald]]></person>\
             <person><![CDATA[Old MacDonald Jr]]></person></people>",
        ))
        .mount(&server)
        .await;

    let mut client = FogBugzClient::connect(&config_for(&server)).await.unwrap();
    match client.logon("Old", "farm").await.unwrap_err() {
        FoglineError::AmbiguousUser { candidates, .. } => {
            assert_eq!(candidates, vec!["Old MacDonald", "Old MacDonald Jr"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!client.is_logged_on());
}

#[tokio::test]
async fn test_logoff_clears_token() {
    let server = MockServer::start().await;
    let mut client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=logoff"))
        .and(body_string_contains("token=tok123"))
        .respond_with(xml(""))
        .expect(1)
        .mount(&server)
        .await;

    client.logoff().await.unwrap();
    assert!(!client.is_logged_on());
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_categories_keyed_by_name() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=listCategories"))
        .and(body_string_contains("token=tok123"))
        .respond_with(xml(
            "<categories>\
             <category><ixCategory>1</ixCategory><sCategory><![CDATA[Bug]]></sCategory>\
             <fIsScheduleItem>false</fIsScheduleItem></category>\
             <category><ixCategory>2</ixCategory><sCategory><![CDATA[Feature]]></sCategory>\
             <fIsScheduleItem>false</fIsScheduleItem></category>\
             </categories>",
        ))
        .mount(&server)
        .await;

    let categories = client.categories().await.unwrap();

    assert_eq!(categories.keys().collect::<Vec<_>>(), vec!["Bug", "Feature"]);
    let bug = &categories["Bug"];
    assert_eq!(bug["ixCategory"], FieldValue::Integer(1));
    assert_eq!(bug["sCategory"], FieldValue::Text("Bug".to_string()));
    assert_eq!(bug["fIsScheduleItem"], FieldValue::Boolean(false));
}

#[tokio::test]
async fn test_view_project_by_name() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=viewProject"))
        .and(body_string_contains("sProject=Sample%20Project"))
        .respond_with(xml(
            "<project><ixProject>4</ixProject><sProject><![CDATA[Sample Project]]></sProject></project>",
        ))
        .mount(&server)
        .await;

    let project = client
        .project(Selector::from("Sample Project"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project["ixProject"], FieldValue::Integer(4));
}

#[tokio::test]
async fn test_search_expands_events() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=search"))
        .and(body_string_contains("q=assignedto%3Ame"))
        .and(body_string_contains("cols=sTitle%2Cevents%2CixBug"))
        .and(body_string_contains("max=2"))
        .respond_with(xml(
            "<cases count=\"1\"><case ixBug=\"42\" operations=\"edit,assign\">\
             <ixBug>42</ixBug><sTitle><![CDATA[Printer on fire]]></sTitle>\
             <events>\
             <event ixBugEvent=\"100\"><ixBugEvent>100</ixBugEvent><evtDescription><![CDATA[Opened by Ada]]></evtDescription></event>\
             <event ixBugEvent=\"101\"><ixBugEvent>101</ixBugEvent><evtDescription><![CDATA[Assigned to Grace]]></evtDescription></event>\
             </events></case></cases>",
        ))
        .mount(&server)
        .await;

    let cases = client
        .search("assignedto:me", Some(&["sTitle", "events"][..]), Some(2))
        .await
        .unwrap();

    let case = &cases["42"];
    assert_eq!(case["sTitle"], FieldValue::Text("Printer on fire".to_string()));
    let events = case["events"].as_records().unwrap();
    assert_eq!(events.keys().collect::<Vec<_>>(), vec!["100", "101"]);
    assert_eq!(
        events["101"]["evtDescription"],
        FieldValue::Text("Assigned to Grace".to_string())
    );
}

#[tokio::test]
async fn test_search_rejects_blank_query() {
    let server = MockServer::start().await;
    let client = connected(&server).await;

    let err = client.search("  ", None, None).await.unwrap_err();
    assert!(matches!(err, FoglineError::Validation(_)));
}

#[tokio::test]
async fn test_new_case_returns_record() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=new"))
        .and(body_string_contains("sTitle=Crash%20on%20save"))
        .and(body_string_contains("sProject=Inbox"))
        .respond_with(xml(
            "<case ixBug=\"77\" operations=\"edit\"><ixBug>77</ixBug>\
             <sTitle><![CDATA[Crash on save]]></sTitle><events></events></case>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let fields = CaseFields::new().title("Crash on save").project("Inbox");
    let case = client
        .new_case(&fields, Some(&["sTitle", "events"][..]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(case["ixBug"], FieldValue::Integer(77));
    assert!(case["events"].as_records().unwrap().is_empty());
}

#[tokio::test]
async fn test_new_case_requires_fields() {
    let server = MockServer::start().await;
    let client = connected(&server).await;

    let err = client.new_case(&CaseFields::new(), None).await.unwrap_err();
    assert!(matches!(err, FoglineError::Validation(_)));
}

#[tokio::test]
async fn test_new_case_rejects_reserved_fields() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(xml(""))
        .expect(0)
        .mount(&server)
        .await;

    let fields = CaseFields::new().title("x").field("cmd", "logoff");
    let err = client.new_case(&fields, None).await.unwrap_err();
    assert!(matches!(err, FoglineError::Validation(_)));

    let fields = CaseFields::new().title("x").field("a&ixBug", "9");
    let err = client.new_case(&fields, None).await.unwrap_err();
    assert!(matches!(err, FoglineError::Validation(_)));
}

#[tokio::test]
async fn test_new_area_returns_id() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=newArea"))
        .and(body_string_contains("ixPersonPrimaryContact=-1"))
        .respond_with(xml("<area><ixArea>15</ixArea></area>"))
        .mount(&server)
        .await;

    assert_eq!(client.new_area(3, "Backend", None).await.unwrap(), 15);
}

#[tokio::test]
async fn test_working_schedule_merges_work_days() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=listWorkingSchedule"))
        .respond_with(xml(
            "<workingSchedule><ixPerson>5</ixPerson><nWorkdayStarts>9</nWorkdayStarts>\
             <rgWorkDays><sunday>false</sunday><monday>true</monday><tuesday>true</tuesday></rgWorkDays>\
             </workingSchedule>",
        ))
        .mount(&server)
        .await;

    let schedule = client.working_schedule(None).await.unwrap().unwrap();

    assert_eq!(schedule["ixPerson"], FieldValue::Integer(5));
    assert_eq!(schedule["sunday"], FieldValue::Boolean(false));
    assert_eq!(schedule["monday"], FieldValue::Boolean(true));
    assert!(!schedule.contains_key("rgWorkDays"));
}

#[tokio::test]
async fn test_settings_returns_children() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .and(body_string_contains("cmd=viewSettings"))
        .respond_with(xml(
            "<settings><timeZoneOffset><![CDATA[-5]]></timeZoneOffset><locale>en-us</locale></settings>",
        ))
        .mount(&server)
        .await;

    let settings = client.settings(None).await.unwrap();
    assert_eq!(settings["timeZoneOffset"], FieldValue::Text("-5".to_string()));
    assert_eq!(settings["locale"], FieldValue::Text("en-us".to_string()));
}

// ============================================================================
// Errors and retries
// ============================================================================

#[tokio::test]
async fn test_api_error_maps_code() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(xml("<error code=\"3\">Not logged in</error>"))
        .mount(&server)
        .await;

    let err = client.projects(false, None).await.unwrap_err();
    assert_eq!(err.server_code(), Some(3));
    assert!(matches!(err, FoglineError::Api { code: 3, .. }));
}

#[tokio::test]
async fn test_missing_key_field() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(xml("<projects><project><ixProject>1</ixProject></project></projects>"))
        .mount(&server)
        .await;

    let err = client.projects(false, None).await.unwrap_err();
    assert!(matches!(err, FoglineError::MissingKeyField { .. }));
}

#[tokio::test]
async fn test_read_command_retried_on_503() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(xml(
            "<priorities><priority><ixPriority>1</ixPriority><sPriority><![CDATA[Must Fix]]></sPriority></priority></priorities>",
        ))
        .mount(&server)
        .await;

    let priorities = client.priorities().await.unwrap();
    assert!(priorities.contains_key("Must Fix"));
}

#[tokio::test]
async fn test_read_command_not_retried_on_500() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.categories().await.unwrap_err();
    assert!(matches!(err, FoglineError::HttpStatus { .. }));
}

#[tokio::test]
async fn test_write_command_not_retried() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.start_work(42).await.unwrap_err();
    assert!(matches!(err, FoglineError::ServiceUnavailable { .. }));
}

#[tokio::test]
async fn test_retries_disabled() {
    let server = MockServer::start().await;
    mount_probe(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).with_retry_reads(false);
    let client = FogBugzClient::connect(&config).await.unwrap();
    assert!(client.categories().await.is_err());
}

#[tokio::test]
async fn test_http_error_body_is_sanitized() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api.asp"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request for token tok123"))
        .mount(&server)
        .await;

    match client.stop_work().await.unwrap_err() {
        FoglineError::HttpStatus { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert!(!body.contains("tok123"));
            assert!(body.contains("[REDACTED]"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Command table
// ============================================================================

#[tokio::test]
async fn test_filters_keyed_by_text() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listFilters"],
        "<filters><filter type=\"builtin\" sFilter=\"ez349\">My Open Cases</filter>\
         <filter type=\"saved\" sFilter=\"304\">Customer escalations</filter></filters>",
    )
    .await;

    let filters = client.filters().await.unwrap();

    assert_eq!(keys(&filters), vec!["My Open Cases", "Customer escalations"]);
    let saved = &filters["Customer escalations"];
    assert_eq!(saved["type"], FieldValue::Text("saved".to_string()));
    assert_eq!(saved["sFilter"], FieldValue::Text("304".to_string()));
    assert_eq!(saved["name"], FieldValue::Text("Customer escalations".to_string()));
}

#[tokio::test]
async fn test_new_project_params() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &[
            "cmd=newProject",
            "sProject=Hardware%20Lab",
            "ixPersonPrimaryContact=7",
            "fAllowPublicSubmit=1",
            "ixGroup=2",
            "fInbox=0",
        ],
        "<project><ixProject>9</ixProject></project>",
    )
    .await;

    let id = client.new_project("Hardware Lab", 7, true, 2, false).await.unwrap();
    assert_eq!(id, 9);
}

#[tokio::test]
async fn test_areas_params() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listAreas", "fWrite=1", "ixProject=3"],
        "<areas><area><ixArea>5</ixArea><sArea><![CDATA[Backend]]></sArea></area></areas>",
    )
    .await;

    let areas = client.areas(true, Some(3), None).await.unwrap();
    assert_eq!(keys(&areas), vec!["Backend"]);
}

#[tokio::test]
async fn test_view_area_by_id() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=viewArea", "ixArea=5"],
        "<area><ixArea>5</ixArea><sArea><![CDATA[Backend]]></sArea></area>",
    )
    .await;

    let area = client.area(5i64, None).await.unwrap().unwrap();
    assert_eq!(area["sArea"], FieldValue::Text("Backend".to_string()));
}

#[tokio::test]
async fn test_fix_fors_params() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listFixFors", "ixProject=3", "ixFixFor=8"],
        "<fixfors><fixfor><ixFixFor>8</ixFixFor><sFixFor><![CDATA[Undecided]]></sFixFor>\
         <fDeleted>false</fDeleted></fixfor></fixfors>",
    )
    .await;

    let fix_fors = client.fix_fors(Some(3), Some(8)).await.unwrap();
    assert_eq!(keys(&fix_fors), vec!["Undecided"]);
    assert_eq!(fix_fors["Undecided"]["fDeleted"], FieldValue::Boolean(false));
}

#[tokio::test]
async fn test_view_fix_for_by_name() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=viewFixFor", "sFixFor=Release%202.0", "ixProject=3"],
        "<fixfor><ixFixFor>12</ixFixFor><sFixFor><![CDATA[Release 2.0]]></sFixFor></fixfor>",
    )
    .await;

    let fix_for = client.fix_for("Release 2.0", Some(3)).await.unwrap().unwrap();
    assert_eq!(fix_for["ixFixFor"], FieldValue::Integer(12));
}

#[tokio::test]
async fn test_new_fix_for_params() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &[
            "cmd=newFixFor",
            "sFixFor=Release%202.0",
            "fAssignable=1",
            "ixProject=-1",
            "dtRelease=2024-06-01T00%3A00%3A00Z",
        ],
        "<fixfor><ixFixFor>12</ixFixFor></fixfor>",
    )
    .await;

    let id = client
        .new_fix_for("Release 2.0", true, None, Some("2024-06-01T00:00:00Z"))
        .await
        .unwrap();
    assert_eq!(id, 12);
}

#[tokio::test]
async fn test_view_category_and_priority() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=viewCategory", "ixCategory=2"],
        "<category><ixCategory>2</ixCategory><sCategory><![CDATA[Feature]]></sCategory></category>",
    )
    .await;
    mount_command(
        &server,
        &["cmd=viewPriority", "ixPriority=3"],
        "<priority><ixPriority>3</ixPriority><sPriority><![CDATA[Must Fix]]></sPriority></priority>",
    )
    .await;

    let category = client.category(2).await.unwrap().unwrap();
    assert_eq!(category["sCategory"], FieldValue::Text("Feature".to_string()));
    let priority = client.priority(3).await.unwrap().unwrap();
    assert_eq!(priority["sPriority"], FieldValue::Text("Must Fix".to_string()));
}

#[tokio::test]
async fn test_people_filter_params() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listPeople", "fIncludeNormal=1", "fIncludeVirtual=1"],
        "<people>\
         <person><ixPerson>2</ixPerson><sFullName><![CDATA[Ada Lovelace]]></sFullName></person>\
         <person><ixPerson>3</ixPerson><sFullName><![CDATA[Build Robot]]></sFullName></person>\
         </people>",
    )
    .await;

    let people = client.people(PeopleFilter::new().with_virtual()).await.unwrap();
    assert_eq!(keys(&people), vec!["Ada Lovelace", "Build Robot"]);
    assert_eq!(people["Build Robot"]["ixPerson"], FieldValue::Integer(3));
}

#[tokio::test]
async fn test_view_person_by_email() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=viewPerson", "sEmail=ada%40example.com"],
        "<person><ixPerson>2</ixPerson><sFullName><![CDATA[Ada Lovelace]]></sFullName>\
         <fAdministrator>true</fAdministrator></person>",
    )
    .await;

    let person = client
        .person(None, Some("ada@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(person["fAdministrator"], FieldValue::Boolean(true));
}

#[tokio::test]
async fn test_new_person_params() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &[
            "cmd=newPerson",
            "sEmail=grace%40example.com",
            "sFullname=Grace%20Hopper",
            "nType=1",
            "fActive=1",
        ],
        "<person><ixPerson>14</ixPerson></person>",
    )
    .await;

    let id = client
        .new_person("grace@example.com", "Grace Hopper", PersonKind::Administrator, true)
        .await
        .unwrap();
    assert_eq!(id, 14);
}

#[tokio::test]
async fn test_statuses_and_status() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listStatuses", "ixCategory=1", "fResolved=1"],
        "<statuses>\
         <status><ixStatus>2</ixStatus><sStatus><![CDATA[Resolved (Fixed)]]></sStatus>\
         <fResolved>true</fResolved></status></statuses>",
    )
    .await;
    mount_command(
        &server,
        &["cmd=viewStatus", "ixStatus=2"],
        "<status><ixStatus>2</ixStatus><sStatus><![CDATA[Resolved (Fixed)]]></sStatus></status>",
    )
    .await;

    let statuses = client.statuses(Some(1), true).await.unwrap();
    assert_eq!(keys(&statuses), vec!["Resolved (Fixed)"]);
    assert_eq!(statuses["Resolved (Fixed)"]["fResolved"], FieldValue::Boolean(true));

    let status = client.status(2).await.unwrap().unwrap();
    assert_eq!(status["ixStatus"], FieldValue::Integer(2));
}

#[tokio::test]
async fn test_mailboxes_keyed_by_id() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listMailboxes"],
        "<mailboxes><mailbox><ixMailbox>1</ixMailbox><sEmail><![CDATA[help@example.com]]></sEmail></mailbox></mailboxes>",
    )
    .await;
    mount_command(
        &server,
        &["cmd=viewMailbox", "ixMailbox=1"],
        "<mailbox><ixMailbox>1</ixMailbox><sEmail><![CDATA[help@example.com]]></sEmail></mailbox>",
    )
    .await;

    let mailboxes = client.mailboxes().await.unwrap();
    assert_eq!(keys(&mailboxes), vec!["1"]);

    let mailbox = client.mailbox(1).await.unwrap().unwrap();
    assert_eq!(mailbox["sEmail"], FieldValue::Text("help@example.com".to_string()));
}

#[tokio::test]
async fn test_start_work_params() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(&server, &["cmd=startWork", "ixBug=42"], "").await;

    client.start_work(42).await.unwrap();
}

#[tokio::test]
async fn test_checkins_keyed_by_cvs_id() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listCheckins", "ixBug=42"],
        "<checkins><checkin><ixCVS>7</ixCVS><sFile><![CDATA[src/main.rs]]></sFile>\
         <sPrevRev>a1</sPrevRev><sNewRev>b2</sNewRev></checkin></checkins>",
    )
    .await;

    let checkins = client.checkins(42).await.unwrap();
    assert_eq!(keys(&checkins), vec!["7"]);
    assert_eq!(checkins["7"]["sFile"], FieldValue::Text("src/main.rs".to_string()));
}

#[tokio::test]
async fn test_wikis_and_articles() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listWikis"],
        "<wikis><wiki><ixWiki>1</ixWiki><sWiki><![CDATA[Handbook]]></sWiki></wiki></wikis>",
    )
    .await;
    mount_command(
        &server,
        &["cmd=listArticles", "ixWiki=1"],
        "<articles><article><ixWikiPage>5</ixWikiPage><sHeadline><![CDATA[Onboarding]]></sHeadline></article>\
         <article><ixWikiPage>6</ixWikiPage><sHeadline><![CDATA[On-call]]></sHeadline></article></articles>",
    )
    .await;

    let wikis = client.wikis().await.unwrap();
    assert_eq!(keys(&wikis), vec!["1"]);

    let articles = client.articles(1).await.unwrap();
    assert_eq!(keys(&articles), vec!["5", "6"]);
    assert_eq!(articles["6"]["sHeadline"], FieldValue::Text("On-call".to_string()));
}

#[tokio::test]
async fn test_view_article_body() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=viewArticle", "ixWikiPage=5"],
        "<wikipage><ixWikiPage>5</ixWikiPage><sHeadline><![CDATA[Onboarding]]></sHeadline>\
         <sBody><![CDATA[<p>Welcome & hello</p>]]></sBody></wikipage>",
    )
    .await;

    let article = client.article(5).await.unwrap().unwrap();
    assert_eq!(
        article["sBody"],
        FieldValue::Text("<p>Welcome & hello</p>".to_string())
    );
    assert_eq!(article["ixWikiPage"], FieldValue::Integer(5));
}

#[tokio::test]
async fn test_revisions_keyed_by_number() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listRevisions", "ixWikiPage=5"],
        "<revisions>\
         <revision><nRevision>1</nRevision><sPersonFullName><![CDATA[Ada Lovelace]]></sPersonFullName></revision>\
         <revision><nRevision>2</nRevision><sPersonFullName><![CDATA[Grace Hopper]]></sPersonFullName></revision>\
         </revisions>",
    )
    .await;

    let revisions = client.revisions(5).await.unwrap();
    assert_eq!(keys(&revisions), vec!["1", "2"]);
    assert_eq!(revisions["2"]["nRevision"], FieldValue::Integer(2));
}

#[tokio::test]
async fn test_templates_keyed_by_id() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listTemplates"],
        "<templates><template><ixTemplate>1</ixTemplate><sTemplate><![CDATA[Default]]></sTemplate></template></templates>",
    )
    .await;

    let templates = client.templates().await.unwrap();
    assert_eq!(keys(&templates), vec!["1"]);
    assert_eq!(templates["1"]["sTemplate"], FieldValue::Text("Default".to_string()));
}

#[tokio::test]
async fn test_discussion_groups_keyed_by_id() {
    let server = MockServer::start().await;
    let client = connected(&server).await;
    mount_command(
        &server,
        &["cmd=listDiscussGroups"],
        "<discussions><discussion><ixDiscussGroup>3</ixDiscussGroup>\
         <sFullName><![CDATA[Customer Forum]]></sFullName></discussion></discussions>",
    )
    .await;

    let groups = client.discussion_groups().await.unwrap();
    assert_eq!(keys(&groups), vec!["3"]);
    assert_eq!(
        groups["3"]["sFullName"],
        FieldValue::Text("Customer Forum".to_string())
    );
}
