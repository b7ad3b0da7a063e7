//! RDS control-plane client
//!
//! One SDK call per trait method. The SDK's own retry layer is the only
//! retrying that happens; everything it gives up on is mapped into
//! [`Error::ControlPlane`] with the service error code preserved.

use std::fmt::Debug;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_rds::Client;
use tracing::{debug, info, instrument};

use dbendpoint_common::{Error, Result};
use dbendpoint_lifecycle::{
    ControlPlane, CreateEndpointRequest, DeleteEndpointRequest, DescribeEndpointsRequest,
    EndpointRecord, ModifyEndpointRequest,
};

use crate::config::RdsConfig;

/// Error codes the service returns when it is shedding load
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestLimitExceeded",
    "RequestThrottled",
    "RequestThrottledException",
    "TooManyRequestsException",
];

/// Error codes for service-side faults that clear on their own
const SERVICE_FAULT_CODES: &[&str] = &["InternalFailure", "ServiceUnavailable"];

/// Whether a service error code describes a transient condition
pub fn is_transient_code(code: &str) -> bool {
    THROTTLING_CODES.contains(&code) || SERVICE_FAULT_CODES.contains(&code)
}

/// Copy the endpoint fields shared by every RDS endpoint response shape
macro_rules! endpoint_record {
    ($source:expr) => {{
        let source = $source;
        EndpointRecord {
            endpoint_identifier: source
                .db_cluster_endpoint_identifier()
                .unwrap_or_default()
                .to_string(),
            cluster_identifier: source.db_cluster_identifier().map(str::to_string),
            resource_identifier: source
                .db_cluster_endpoint_resource_identifier()
                .map(str::to_string),
            endpoint: source.endpoint().map(str::to_string),
            status: source.status().map(str::to_string),
            endpoint_type: source.endpoint_type().map(str::to_string),
            custom_endpoint_type: source.custom_endpoint_type().map(str::to_string),
            static_members: source.static_members().to_vec(),
            excluded_members: source.excluded_members().to_vec(),
            arn: source.db_cluster_endpoint_arn().map(str::to_string),
        }
    }};
}

/// Map an SDK failure into a control-plane error
///
/// Timeouts, dispatch failures, unparseable responses and throttling are
/// retryable; every other service error is not.
fn control_plane_error<E, R>(operation: &str, endpoint: &str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    let retryable = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(_) => code.as_deref().is_some_and(is_transient_code),
        _ => false,
    };

    if retryable {
        Error::control_plane_transient(operation, endpoint, code, message)
    } else {
        Error::control_plane(operation, endpoint, code, message)
    }
}

/// [`ControlPlane`] backed by the RDS API
#[derive(Clone, Debug)]
pub struct RdsControlPlane {
    client: Client,
}

impl RdsControlPlane {
    /// Wrap an existing SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default credential chain plus overrides
    pub async fn from_config(config: &RdsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_rds::config::Builder::from(&shared);
        if let Some(url) = &config.endpoint_url {
            builder = builder.endpoint_url(url);
        }

        info!(
            region = ?shared.region().map(|r| r.as_ref().to_string()),
            endpoint_url = ?config.endpoint_url,
            "RDS client configured"
        );

        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl ControlPlane for RdsControlPlane {
    #[instrument(skip(self, request), fields(endpoint = %request.endpoint_identifier))]
    async fn create_endpoint(&self, request: &CreateEndpointRequest) -> Result<EndpointRecord> {
        let output = self
            .client
            .create_db_cluster_endpoint()
            .db_cluster_identifier(&request.cluster_identifier)
            .db_cluster_endpoint_identifier(&request.endpoint_identifier)
            .endpoint_type(request.endpoint_type.as_str())
            .set_static_members(request.members.static_members.clone())
            .set_excluded_members(request.members.excluded_members.clone())
            .send()
            .await
            .map_err(|e| {
                control_plane_error("CreateDBClusterEndpoint", &request.endpoint_identifier, e)
            })?;

        Ok(endpoint_record!(&output))
    }

    #[instrument(skip(self, request), fields(endpoint = %request.endpoint_identifier))]
    async fn modify_endpoint(&self, request: &ModifyEndpointRequest) -> Result<EndpointRecord> {
        let output = self
            .client
            .modify_db_cluster_endpoint()
            .db_cluster_endpoint_identifier(&request.endpoint_identifier)
            .endpoint_type(request.endpoint_type.as_str())
            .set_static_members(request.members.static_members.clone())
            .set_excluded_members(request.members.excluded_members.clone())
            .send()
            .await
            .map_err(|e| {
                control_plane_error("ModifyDBClusterEndpoint", &request.endpoint_identifier, e)
            })?;

        Ok(endpoint_record!(&output))
    }

    #[instrument(skip(self, request), fields(endpoint = %request.endpoint_identifier))]
    async fn delete_endpoint(&self, request: &DeleteEndpointRequest) -> Result<EndpointRecord> {
        let output = self
            .client
            .delete_db_cluster_endpoint()
            .db_cluster_endpoint_identifier(&request.endpoint_identifier)
            .send()
            .await
            .map_err(|e| {
                control_plane_error("DeleteDBClusterEndpoint", &request.endpoint_identifier, e)
            })?;

        Ok(endpoint_record!(&output))
    }

    #[instrument(skip(self, request), fields(endpoint = %request.endpoint_identifier))]
    async fn describe_endpoints(
        &self,
        request: &DescribeEndpointsRequest,
    ) -> Result<Vec<EndpointRecord>> {
        let output = self
            .client
            .describe_db_cluster_endpoints()
            .db_cluster_identifier(&request.cluster_identifier)
            .db_cluster_endpoint_identifier(&request.endpoint_identifier)
            .send()
            .await
            .map_err(|e| {
                control_plane_error("DescribeDBClusterEndpoints", &request.endpoint_identifier, e)
            })?;

        let records: Vec<EndpointRecord> = output
            .db_cluster_endpoints()
            .iter()
            .map(|endpoint| endpoint_record!(endpoint))
            .collect();
        debug!(count = records.len(), "described cluster endpoints");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_rds::error::ErrorMetadata;
    use aws_sdk_rds::operation::delete_db_cluster_endpoint::DeleteDBClusterEndpointError;
    use aws_sdk_rds::types::DbClusterEndpoint;
    use dbendpoint_common::ENDPOINT_NOT_FOUND_CODE;

    fn service_error(code: &str, message: &str) -> SdkError<DeleteDBClusterEndpointError, ()> {
        let meta = ErrorMetadata::builder().code(code).message(message).build();
        SdkError::service_error(DeleteDBClusterEndpointError::generic(meta), ())
    }

    // =========================================================================
    // Error classification
    // =========================================================================

    #[test]
    fn throttling_codes_are_transient() {
        assert!(is_transient_code("Throttling"));
        assert!(is_transient_code("RequestLimitExceeded"));
        assert!(is_transient_code("InternalFailure"));
    }

    #[test]
    fn client_faults_are_not_transient() {
        assert!(!is_transient_code(ENDPOINT_NOT_FOUND_CODE));
        assert!(!is_transient_code("InvalidDBClusterStateFault"));
        assert!(!is_transient_code("DBClusterEndpointAlreadyExistsFault"));
    }

    #[test]
    fn not_found_keeps_code_and_is_permanent() {
        let err = control_plane_error(
            "DeleteDBClusterEndpoint",
            "analytics",
            service_error(ENDPOINT_NOT_FOUND_CODE, "DBClusterEndpoint analytics not found"),
        );

        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.endpoint(), Some("analytics"));
        assert!(err.to_string().contains("DBClusterEndpoint analytics not found"));
    }

    #[test]
    fn throttled_service_error_is_retryable() {
        let err = control_plane_error(
            "DeleteDBClusterEndpoint",
            "analytics",
            service_error("Throttling", "Rate exceeded"),
        );

        assert!(err.is_retryable());
        assert_eq!(err.code(), Some("Throttling"));
    }

    #[test]
    fn timeout_is_retryable() {
        let err = control_plane_error(
            "DescribeDBClusterEndpoints",
            "analytics",
            SdkError::<DeleteDBClusterEndpointError, ()>::timeout_error("operation timed out"),
        );

        assert!(err.is_retryable());
        assert_eq!(err.code(), None);
    }

    // =========================================================================
    // Record conversion
    // =========================================================================

    #[test]
    fn described_endpoint_converts_to_record() {
        let endpoint = DbClusterEndpoint::builder()
            .db_cluster_endpoint_identifier("analytics")
            .db_cluster_identifier("aurora-main")
            .endpoint("analytics.cluster-custom-abc.eu-west-1.rds.amazonaws.com")
            .status("available")
            .endpoint_type("CUSTOM")
            .custom_endpoint_type("READER")
            .static_members("i1")
            .static_members("i2")
            .build();

        let record = endpoint_record!(&endpoint);
        assert_eq!(record.endpoint_identifier, "analytics");
        assert_eq!(record.status.as_deref(), Some("available"));
        assert_eq!(record.custom_endpoint_type.as_deref(), Some("READER"));
        assert_eq!(record.static_members, vec!["i1", "i2"]);
        assert!(record.excluded_members.is_empty());
        assert!(record.arn.is_none());
    }

    #[test]
    fn endpoint_without_status_reads_as_gone() {
        let endpoint = DbClusterEndpoint::builder()
            .db_cluster_endpoint_identifier("analytics")
            .build();

        let record = endpoint_record!(&endpoint);
        assert_eq!(record.status(), dbendpoint_common::EndpointStatus::Deleted);
    }
}
