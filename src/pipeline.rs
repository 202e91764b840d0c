//! The end-to-end deploy pipeline: build, package, resolve credentials,
//! deploy.

use busbar_sf_auth::{CredentialRequest, CredentialResolver, Session, SoapLoginClient};
use busbar_sf_client::SfHttpClient;
use busbar_sf_metadata::{
    package, ChangeRequest, DeployOptions, DeployResult, MetadataClient, PackageBuilder,
    PackageManifest, TemplateFamily,
};
use tracing::{debug, info, instrument};

use crate::config::ServiceConfig;
use crate::error::{PipelineError, Result, ToolError};

/// What a successful run deployed.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub subject: String,
    pub family: TemplateFamily,
    pub manifest: PackageManifest,
    pub destructive: Option<PackageManifest>,
    pub result: DeployResult,
}

impl DeployOutcome {
    pub fn message(&self) -> String {
        format!(
            "{} package prepared and deployment initiated. {}",
            self.subject,
            self.result.summary()
        )
    }
}

/// Runs one change request from credentials to deploy submission.
#[derive(Debug, Clone)]
pub struct DeployPipeline {
    resolver: CredentialResolver,
    builder: PackageBuilder,
    http_client: Option<SfHttpClient>,
}

impl DeployPipeline {
    pub fn new(resolver: CredentialResolver, builder: PackageBuilder) -> Self {
        Self {
            resolver,
            builder,
            http_client: None,
        }
    }

    /// Build a pipeline from service configuration.
    pub fn from_config(config: &ServiceConfig) -> std::result::Result<Self, ToolError> {
        let login = SoapLoginClient::new(config.login_url.as_str())
            .map_err(|e| ToolError::Config(e.to_string()))?
            .with_api_version(config.api_version.as_str());
        let resolver = CredentialResolver::new(login, config.environment.clone())
            .with_encryption_key(config.encryption_key.clone())
            .with_timeout(config.connect_timeout);

        Ok(Self::new(
            resolver,
            PackageBuilder::new(config.api_version.as_str()),
        ))
    }

    /// Use a specific HTTP client for deploy calls.
    pub fn with_http_client(mut self, client: SfHttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build and package `request` off the async runtime, resolve a
    /// session, then submit it.
    ///
    /// A build failure never reaches the network. A rejected deploy is an
    /// error carrying the fault as reported.
    #[instrument(skip_all, fields(family = %request.family()))]
    pub async fn run(
        &self,
        request: ChangeRequest,
        credentials: &CredentialRequest,
    ) -> Result<DeployOutcome> {
        let subject = request.subject();
        let family = request.family();

        let builder = self.builder.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            let descriptor = builder.build_request(&request)?;
            package(descriptor)
        })
        .await??;
        debug!(bytes = encoded.archive_len, "Package encoded");

        let handle = self.resolver.resolve(credentials).await?;
        debug!(instance = handle.instance_url(), "Session ready");

        let mut client = MetadataClient::new(&handle)?;
        if let Some(http_client) = &self.http_client {
            client = client.with_http_client(http_client.clone());
        }
        let result = client.deploy(&encoded, DeployOptions::default()).await?;

        if !result.accepted {
            return Err(PipelineError::from_rejected(&result));
        }
        info!(%subject, id = ?result.async_process_id, "Deployment submitted");

        Ok(DeployOutcome {
            subject,
            family,
            manifest: encoded.manifest,
            destructive: encoded.destructive,
            result,
        })
    }
}
