//! End-to-end tool calls against mocked login and Metadata API endpoints.
//!
//!   cargo test --test pipeline

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use busbar_sf_auth::{encrypt_credentials, Credentials, EncryptionKey, Environment};
use busbar_sf_deploy::{ServiceConfig, ToolCall, ToolError, ToolRegistry};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_ID: &str = "00Dxx0000001gPL!AQ4AQFakeSession";

fn login_ok(server: &MockServer) -> String {
    format!(
        "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <soapenv:Body><loginResponse><result>\
         <serverUrl>{}/services/Soap/u/63.0/00Dxx0000001gPL</serverUrl>\
         <sessionId>{}</sessionId>\
         <userId>005xx000001Sv6AAAS</userId>\
         </result></loginResponse></soapenv:Body></soapenv:Envelope>",
        server.uri(),
        SESSION_ID
    )
}

const DEPLOY_OK: &str = "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
    <soapenv:Body><deployResponse><result>\
    <done>false</done><id>0Afxx00000001VPCAY</id><state>Queued</state>\
    </result></deployResponse></soapenv:Body></soapenv:Envelope>";

const SESSION_FAULT: &str = "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
    <soapenv:Body><soapenv:Fault>\
    <faultcode>sf:INVALID_SESSION_ID</faultcode>\
    <faultstring>INVALID_SESSION_ID: Invalid Session ID found in SessionHeader</faultstring>\
    </soapenv:Fault></soapenv:Body></soapenv:Envelope>";

const LOGIN_FAULT: &str = "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
    <soapenv:Body><soapenv:Fault>\
    <faultcode>INVALID_LOGIN</faultcode>\
    <faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>\
    </soapenv:Fault></soapenv:Body></soapenv:Envelope>";

fn registry(server: &MockServer, key: Option<EncryptionKey>, env: Environment) -> ToolRegistry {
    let config = ServiceConfig {
        encryption_key: key,
        login_url: server.uri(),
        environment: env,
        ..ServiceConfig::default()
    };
    ToolRegistry::from_config(&config).unwrap()
}

async fn mount_login(server: &MockServer, username: &str) {
    Mock::given(method("POST"))
        .and(path("/services/Soap/u/63.0"))
        .and(header("SOAPAction", "login"))
        .and(body_string_contains(username))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_ok(server)))
        .expect(1)
        .mount(server)
        .await;
}

/// Entry names and contents of the archive sent with the deploy call.
async fn deployed_archive(server: &MockServer) -> Vec<(String, String)> {
    let requests = server.received_requests().await.unwrap();
    let deploy = requests
        .iter()
        .find(|r| r.url.path() == "/services/Soap/m/63.0")
        .expect("no deploy request received");
    let body = String::from_utf8(deploy.body.clone()).unwrap();
    let start = body.find("<ZipFile>").unwrap() + "<ZipFile>".len();
    let end = body.find("</ZipFile>").unwrap();

    let bytes = STANDARD.decode(&body[start..end]).unwrap();
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entries = Vec::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).unwrap();
        let mut contents = String::new();
        std::io::Read::read_to_string(&mut file, &mut contents).unwrap();
        entries.push((file.name().to_string(), contents));
    }
    entries
}

#[tokio::test]
async fn test_object_with_fields_end_to_end() {
    let server = MockServer::start().await;
    mount_login(&server, "ops@example.com").await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/m/63.0"))
        .and(header("SOAPAction", "deploy"))
        .and(body_string_contains(SESSION_ID))
        .respond_with(ResponseTemplate::new(200).set_body_string(DEPLOY_OK))
        .expect(1)
        .mount(&server)
        .await;

    let key = EncryptionKey::generate();
    let blob = encrypt_credentials(&Credentials::new("ops@example.com", "pw", "tok"), &key)
        .unwrap();
    let registry = registry(&server, Some(key), Environment::default());

    let output = registry
        .call(ToolCall::new(
            "create_object_with_fields",
            json!({
                "api_name": "Invoice__c",
                "name": "Invoice",
                "plural_name": "Invoices",
                "fields": [{"label": "Amount", "api_name": "Amount__c", "type": "Number"}],
                "_sf_encrypted_credentials": blob,
                "_sf_credentials": {"username": "someone@else.com", "password": "pw"}
            }),
        ))
        .await
        .unwrap();

    assert!(!output.is_error, "{}", output.text);
    assert!(output.text.contains("Invoice__c"));
    assert!(output.text.contains("0Afxx00000001VPCAY"));
    assert!(output.text.contains("HTTP 200"));

    let entries = deployed_archive(&server).await;
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "objects/Invoice__c.object",
            "package.xml",
            "profiles/Admin.profile"
        ]
    );
    let (_, profile) = &entries[2];
    assert_eq!(
        profile
            .matches("<field>Invoice__c.Amount__c</field>")
            .count(),
        1
    );
    let (_, manifest) = &entries[1];
    assert!(manifest.contains("<members>Invoice__c</members>"));
    assert!(manifest.contains("<members>Admin</members>"));
    assert!(!entries.iter().any(|(_, body)| body.contains("##")));
}

#[tokio::test]
async fn test_environment_credentials_and_soap_fault() {
    let server = MockServer::start().await;
    mount_login(&server, "env@example.com").await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/m/63.0"))
        .respond_with(ResponseTemplate::new(500).set_body_string(SESSION_FAULT))
        .expect(1)
        .mount(&server)
        .await;

    let env = Environment::from_pairs([
        ("USERNAME", "env@example.com"),
        ("PASSWORD", "pw"),
        ("SECURITY_TOKEN", ""),
    ]);
    let output = registry(&server, None, env)
        .call(ToolCall::new(
            "create_report_folder",
            json!({"developer_name": "Finance"}),
        ))
        .await
        .unwrap();

    assert!(output.is_error);
    assert!(output.text.contains("Report folder 'Finance'"));
    assert!(output.text.contains("sf:INVALID_SESSION_ID"));
}

#[tokio::test]
async fn test_build_failure_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/u/63.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_ok(&server)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/m/63.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DEPLOY_OK))
        .expect(0)
        .mount(&server)
        .await;

    let output = registry(&server, None, Environment::default())
        .call(ToolCall::new(
            "create_object_with_fields",
            json!({
                "api_name": "Invoice__c",
                "name": "Invoice",
                "plural_name": "Invoices",
                "fields": [{"label": "Stage", "api_name": "Stage__c", "type": "Picklist"}],
                "_sf_credentials": {"username": "ops@example.com", "password": "pw"}
            }),
        ))
        .await
        .unwrap();

    assert!(output.is_error);
    assert!(output.text.contains("Package build failed"));
    assert!(output.text.contains("Stage__c"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_failure_is_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/u/63.0"))
        .respond_with(ResponseTemplate::new(500).set_body_string(LOGIN_FAULT))
        .expect(1)
        .mount(&server)
        .await;

    let output = registry(&server, None, Environment::default())
        .call(
            ToolCall::new("create_dashboard_folder", json!({"developer_name": "Exec"}))
                .with_header(
                    "X-Salesforce-Credentials",
                    r#"{"username": "ops@example.com", "password": "wrong"}"#,
                ),
        )
        .await
        .unwrap();

    assert!(output.is_error);
    assert!(output.text.contains("Connection failed"));
    assert!(output.text.contains("INVALID_LOGIN"));
    assert!(!output.text.contains("wrong"));
}

#[tokio::test]
async fn test_undecryptable_credentials_are_invalid_params() {
    let server = MockServer::start().await;
    let registry = registry(&server, Some(EncryptionKey::generate()), Environment::default());

    let other_key = EncryptionKey::generate();
    let blob = encrypt_credentials(&Credentials::new("ops@example.com", "pw", ""), &other_key)
        .unwrap();

    let err = registry
        .call(ToolCall::new(
            "create_tab",
            json!({
                "tab_api_name": "Docs", "label": "Docs", "motif": "Custom20: Airplane",
                "tab_type": "Web", "web_url": "https://example.com",
                "_sf_encrypted_credentials": blob
            }),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidParams(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
