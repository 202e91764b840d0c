use busbar_sf_client::security::xml;
use busbar_sf_client::soap;
use tracing::{info, instrument, warn};

use crate::deploy::{DeployOptions, DeployResult};
use crate::error::Result;
use crate::packager::EncodedPackage;

impl super::MetadataClient {
    /// Submit an encoded package with the `deploy` call.
    ///
    /// Any HTTP response becomes a [`DeployResult`]; only a failure to get a
    /// response at all is an error. The deploy is not polled.
    #[instrument(skip(self, package, options), fields(family = %package.family, bytes = package.archive_len))]
    pub async fn deploy(
        &self,
        package: &EncodedPackage,
        options: DeployOptions,
    ) -> Result<DeployResult> {
        let envelope = self.deploy_envelope(&package.zip_base64, &options);

        let response = self
            .http_client
            .post_soap(&self.metadata_url(), "deploy", envelope)
            .await?;

        if !response.is_success() {
            let result = match soap::parse_fault(&response.body) {
                Some(fault) => DeployResult {
                    accepted: false,
                    http_status: response.status,
                    fault_code: Some(fault.fault_code),
                    fault_message: Some(fault.fault_string),
                    async_process_id: None,
                },
                None => DeployResult {
                    accepted: false,
                    http_status: response.status,
                    fault_code: None,
                    fault_message: Some(response.error_snippet()),
                    async_process_id: None,
                },
            };
            warn!(status = response.status, code = ?result.fault_code, "Deploy rejected");
            return Ok(result);
        }

        let async_process_id =
            soap::extract_element(&response.body, "id").filter(|id| !id.is_empty());
        info!(status = response.status, id = ?async_process_id, "Deploy accepted");

        Ok(DeployResult {
            accepted: true,
            http_status: response.status,
            fault_code: None,
            fault_message: None,
            async_process_id,
        })
    }

    fn deploy_envelope(&self, zip_base64: &str, options: &DeployOptions) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <soap:Header>
    <SessionHeader xmlns="http://soap.sforce.com/2006/04/metadata">
      <sessionId>{session_id}</sessionId>
    </SessionHeader>
  </soap:Header>
  <soap:Body>
    <deploy xmlns="http://soap.sforce.com/2006/04/metadata">
      <ZipFile>{zip_file}</ZipFile>
      <DeployOptions>
        <allowMissingFiles>{allow_missing}</allowMissingFiles>
        <autoUpdatePackage>{auto_update}</autoUpdatePackage>
        <checkOnly>{check_only}</checkOnly>
        <ignoreWarnings>{ignore_warnings}</ignoreWarnings>
        <performRetrieve>{perform_retrieve}</performRetrieve>
        <purgeOnDelete>{purge_on_delete}</purgeOnDelete>
        <rollbackOnError>{rollback_on_error}</rollbackOnError>
        <singlePackage>{single_package}</singlePackage>
      </DeployOptions>
    </deploy>
  </soap:Body>
</soap:Envelope>"#,
            session_id = xml::escape(&self.session_id),
            zip_file = zip_base64,
            allow_missing = options.allow_missing_files,
            auto_update = options.auto_update_package,
            check_only = options.check_only,
            ignore_warnings = options.ignore_warnings,
            perform_retrieve = options.perform_retrieve,
            purge_on_delete = options.purge_on_delete,
            rollback_on_error = options.rollback_on_error,
            single_package = options.single_package,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::client::MetadataClient;
    use crate::deploy::DeployOptions;
    use crate::error::ErrorKind;
    use crate::manifest::PackageManifest;
    use crate::packager::EncodedPackage;
    use crate::templates::TemplateFamily;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encoded() -> EncodedPackage {
        EncodedPackage {
            family: TemplateFamily::Tab,
            manifest: PackageManifest::new(),
            destructive: None,
            archive_len: 4,
            zip_base64: "UEsFBg==".to_string(),
        }
    }

    #[test]
    fn test_envelope_options() {
        let client = MetadataClient::from_parts("https://na1.salesforce.com", "00D!a&b").unwrap();
        let envelope = client.deploy_envelope("UEsFBg==", &DeployOptions::default());

        assert!(envelope.contains("<sessionId>00D!a&amp;b</sessionId>"));
        assert!(envelope.contains("<ZipFile>UEsFBg==</ZipFile>"));
        assert!(envelope.contains("<allowMissingFiles>false</allowMissingFiles>"));
        assert!(envelope.contains("<ignoreWarnings>false</ignoreWarnings>"));
        assert!(envelope.contains("<rollbackOnError>true</rollbackOnError>"));
        assert!(envelope.contains("<singlePackage>true</singlePackage>"));
    }

    #[tokio::test]
    async fn test_deploy_accepted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/Soap/m/63.0"))
            .and(header("SOAPAction", "deploy"))
            .and(header("Content-Type", "text/xml; charset=utf-8"))
            .and(body_string_contains("<sessionId>00D!sess</sessionId>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="http://soap.sforce.com/2006/04/metadata">
                <soapenv:Body><deployResponse><result><done>false</done><id>0Af000000000001AAA</id><state>Queued</state></result></deployResponse></soapenv:Body></soapenv:Envelope>"#,
            ))
            .mount(&mock_server)
            .await;

        let client = MetadataClient::from_parts(mock_server.uri(), "00D!sess").unwrap();
        let result = client
            .deploy(&encoded(), DeployOptions::default())
            .await
            .unwrap();

        assert!(result.accepted);
        assert_eq!(result.http_status, 200);
        assert_eq!(result.async_process_id.as_deref(), Some("0Af000000000001AAA"));
    }

    #[tokio::test]
    async fn test_deploy_fault_is_verbatim() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/Soap/m/63.0"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><soapenv:Fault>
                <faultcode>INVALID_SESSION_ID</faultcode>
                <faultstring>Invalid Session ID found in SessionHeader: Illegal Session</faultstring>
                </soapenv:Fault></soapenv:Body></soapenv:Envelope>"#,
            ))
            .mount(&mock_server)
            .await;

        let client = MetadataClient::from_parts(mock_server.uri(), "expired").unwrap();
        let result = client
            .deploy(&encoded(), DeployOptions::default())
            .await
            .unwrap();

        assert!(!result.accepted);
        assert_eq!(result.http_status, 500);
        assert_eq!(result.fault_code.as_deref(), Some("INVALID_SESSION_ID"));
        assert!(result.fault_message.unwrap().starts_with("Invalid Session ID"));
    }

    #[tokio::test]
    async fn test_deploy_error_without_fault() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("x".repeat(800)))
            .mount(&mock_server)
            .await;

        let client = MetadataClient::from_parts(mock_server.uri(), "s").unwrap();
        let result = client
            .deploy(&encoded(), DeployOptions::default())
            .await
            .unwrap();

        let message = result.fault_message.unwrap();
        assert!(result.fault_code.is_none());
        assert!(message.starts_with("HTTP Error 503. Response Text: "));
        assert!(message.ends_with(&format!("{}...", "x".repeat(500))));
        assert!(!message.contains(&"x".repeat(501)));
    }

    #[tokio::test]
    async fn test_deploy_transport_failure_is_error() {
        let client = MetadataClient::from_parts("http://127.0.0.1:1", "s").unwrap();
        let err = client
            .deploy(&encoded(), DeployOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Transport(_)));
    }
}
