use super::*;
use crate::errors::ErrorKind;
use crate::managed::{ConditionReason, ConditionStatus, ConditionType};
use crate::types::{BranchPermissionOptions, ProtectedBranchParameters, Reference};
use gitlab_client::{
    AccessLevelValue, BranchAccessDescription, ProtectRepositoryBranchesOptions,
    UpdateProtectedBranchOptions,
};
use std::any::Any;
use std::sync::Mutex;

const PROJECT_ID: i64 = 1234;
const BRANCH_NAME: &str = "main";

/// Failure the mock reports in place of a response.
#[derive(Clone, Copy, Debug)]
enum Failure {
    NotFound,
    Status(u16),
}

impl Failure {
    fn into_error(self) -> gitlab_client::Error {
        match self {
            Failure::NotFound => gitlab_client::Error::NotFound,
            Failure::Status(status) => gitlab_client::Error::ApiError {
                status,
                message: "boom".to_string(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Get(i64, String),
    Protect(i64, ProtectRepositoryBranchesOptions),
    Update(i64, String, UpdateProtectedBranchOptions),
    Unprotect(i64, String),
}

#[derive(Clone, Default)]
struct MockProtectedBranchClient {
    get_result: Arc<Mutex<Option<Result<gitlab_client::ProtectedBranch, Failure>>>>,
    write_failure: Arc<Mutex<Option<Failure>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockProtectedBranchClient {
    fn new() -> Self {
        Self::default()
    }

    fn set_get_result(&self, result: Result<gitlab_client::ProtectedBranch, Failure>) {
        *self.get_result.lock().unwrap() = Some(result);
    }

    fn fail_writes(&self, failure: Failure) {
        *self.write_failure.lock().unwrap() = Some(failure);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn write_result(&self, name: &str) -> Result<gitlab_client::ProtectedBranch, gitlab_client::Error> {
        match *self.write_failure.lock().unwrap() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(gitlab_client::ProtectedBranch {
                id: 1,
                name: name.to_string(),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl ProtectedBranchClient for MockProtectedBranchClient {
    async fn get_protected_branch(
        &self,
        project_id: i64,
        branch: &str,
    ) -> Result<gitlab_client::ProtectedBranch, gitlab_client::Error> {
        self.record(Call::Get(project_id, branch.to_string()));
        match self.get_result.lock().unwrap().clone() {
            Some(Ok(observed)) => Ok(observed),
            Some(Err(failure)) => Err(failure.into_error()),
            None => Err(gitlab_client::Error::NotFound),
        }
    }

    async fn protect_repository_branches(
        &self,
        project_id: i64,
        options: &ProtectRepositoryBranchesOptions,
    ) -> Result<gitlab_client::ProtectedBranch, gitlab_client::Error> {
        self.record(Call::Protect(project_id, options.clone()));
        self.write_result(&options.name)
    }

    async fn update_protected_branch(
        &self,
        project_id: i64,
        branch: &str,
        options: &UpdateProtectedBranchOptions,
    ) -> Result<gitlab_client::ProtectedBranch, gitlab_client::Error> {
        self.record(Call::Update(project_id, branch.to_string(), options.clone()));
        self.write_result(branch)
    }

    async fn unprotect_repository_branches(
        &self,
        project_id: i64,
        branch: &str,
    ) -> Result<(), gitlab_client::Error> {
        self.record(Call::Unprotect(project_id, branch.to_string()));
        self.write_result(branch).map(|_| ())
    }
}

/// A managed resource of another kind.
struct OtherResource;

impl Managed for OtherResource {
    fn kind(&self) -> &'static str {
        "Project"
    }

    fn name(&self) -> &str {
        "other"
    }

    fn provider_config_name(&self) -> &str {
        "default"
    }

    fn deletion_requested(&self) -> bool {
        false
    }

    fn conditions(&self) -> &[Condition] {
        &[]
    }

    fn set_conditions(&mut self, _conditions: &[Condition]) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn maintainer_permission() -> Vec<BranchPermissionOptions> {
    vec![BranchPermissionOptions {
        access_level: Some(AccessLevelValue::MAINTAINER),
        user_id: Some(0),
        group_id: Some(0),
        ..Default::default()
    }]
}

fn protected_branch_resource(params: ProtectedBranchParameters) -> ProtectedBranch {
    ProtectedBranch::new("main-protection", params)
}

fn params_with_project() -> ProtectedBranchParameters {
    ProtectedBranchParameters {
        project_id: Some(PROJECT_ID),
        name: BRANCH_NAME.to_string(),
        ..Default::default()
    }
}

fn observed_branch() -> gitlab_client::ProtectedBranch {
    gitlab_client::ProtectedBranch {
        id: 1,
        name: BRANCH_NAME.to_string(),
        push_access_levels: vec![BranchAccessDescription {
            id: 1,
            access_level: AccessLevelValue::MAINTAINER,
            access_level_description: "Maintainers".to_string(),
            user_id: 0,
            group_id: 0,
        }],
        ..Default::default()
    }
}

fn external(mock: &MockProtectedBranchClient) -> External {
    External::new(Arc::new(mock.clone()))
}

fn ready_reason(cr: &ProtectedBranch) -> Option<ConditionReason> {
    cr.status
        .get_condition(ConditionType::Ready)
        .map(|c| c.reason)
}

// ============================================================================
// Connect
// ============================================================================

fn mock_factory(mock: &MockProtectedBranchClient) -> ClientFactory {
    let mock = mock.clone();
    Arc::new(move |_config: &ClientConfig| {
        let client: Arc<dyn ProtectedBranchClient> = Arc::new(mock.clone());
        Ok(client)
    })
}

fn default_configs() -> HashMap<String, ClientConfig> {
    let mut configs = HashMap::new();
    configs.insert(
        "default".to_string(),
        ClientConfig {
            base_url: "https://gitlab.example.com/api/v4".to_string(),
            token: SecretString::from("glpat-test".to_string()),
        },
    );
    configs
}

#[tokio::test]
async fn test_connect_uses_default_provider_config() {
    let mock = MockProtectedBranchClient::new();
    let connector = Connector::with_client_factory(default_configs(), mock_factory(&mock));
    let mut cr = protected_branch_resource(params_with_project());

    let client = connector.connect(&cr).await.unwrap();
    let observation = client.observe(&mut cr).await.unwrap();

    assert!(!observation.resource_exists);
    assert_eq!(
        mock.calls(),
        vec![Call::Get(PROJECT_ID, BRANCH_NAME.to_string())]
    );
}

#[tokio::test]
async fn test_connect_fails_for_unknown_provider_config() {
    let mock = MockProtectedBranchClient::new();
    let connector = Connector::with_client_factory(default_configs(), mock_factory(&mock));
    let mut cr = protected_branch_resource(params_with_project());
    cr.spec.provider_config_ref = Some(Reference {
        name: "self-hosted".to_string(),
    });

    let err = connector.connect(&cr).await.err().unwrap();

    assert!(matches!(err, Error::ProviderConfigNotFound(ref name) if name == "self-hosted"));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_connect_rejects_other_resource_kinds() {
    let mock = MockProtectedBranchClient::new();
    let connector = Connector::with_client_factory(default_configs(), mock_factory(&mock));

    let err = connector.connect(&OtherResource).await.err().unwrap();

    assert!(matches!(err, Error::NotProtectedBranch));
}

#[tokio::test]
async fn test_connect_reports_client_construction_failure() {
    let mut configs = default_configs();
    if let Some(config) = configs.get_mut("default") {
        config.base_url = "not a url".to_string();
    }
    let connector = Connector::new(configs);
    let cr = protected_branch_resource(params_with_project());

    let err = connector.connect(&cr).await.err().unwrap();

    assert!(matches!(
        err,
        Error::Connect(gitlab_client::Error::InvalidUrl(_))
    ));
}

#[test]
fn test_client_config_debug_redacts_token() {
    let configs = default_configs();
    let debug = format!("{:?}", configs["default"]);

    assert!(debug.contains("gitlab.example.com"));
    assert!(!debug.contains("glpat-test"));
}

// ============================================================================
// Observe
// ============================================================================

#[tokio::test]
async fn test_observe_rejects_other_resource_kinds() {
    let mock = MockProtectedBranchClient::new();

    let err = external(&mock)
        .observe(&mut OtherResource)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotProtectedBranch));
    assert_eq!(err.to_string(), "managed resource is not a protected branch");
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_observe_requires_project_id() {
    let mock = MockProtectedBranchClient::new();
    let mut cr = protected_branch_resource(ProtectedBranchParameters {
        name: BRANCH_NAME.to_string(),
        ..Default::default()
    });

    let err = external(&mock).observe(&mut cr).await.unwrap_err();

    assert!(matches!(err, Error::ProjectIdMissing));
    assert!(!err.is_retryable());
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_observe_missing_branch_is_not_an_error() {
    let mock = MockProtectedBranchClient::new();
    mock.set_get_result(Err(Failure::NotFound));
    let mut cr = protected_branch_resource(params_with_project());
    let before = cr.clone();

    let observation = external(&mock).observe(&mut cr).await.unwrap();

    assert_eq!(observation, ExternalObservation::default());
    assert_eq!(cr, before);
}

#[tokio::test]
async fn test_observe_wraps_remote_failure() {
    let mock = MockProtectedBranchClient::new();
    mock.set_get_result(Err(Failure::Status(500)));
    let mut cr = protected_branch_resource(params_with_project());

    let err = external(&mock).observe(&mut cr).await.unwrap_err();

    assert!(matches!(err, Error::GetFailed(_)));
    assert!(err.is_retryable());
    assert!(err.to_string().starts_with("cannot get protected branch"));
}

#[tokio::test]
async fn test_observe_late_initializes_and_reports_up_to_date() {
    let mock = MockProtectedBranchClient::new();
    mock.set_get_result(Ok(observed_branch()));
    let mut cr = protected_branch_resource(params_with_project());

    let observation = external(&mock).observe(&mut cr).await.unwrap();

    assert_eq!(
        observation,
        ExternalObservation {
            resource_exists: true,
            resource_up_to_date: true,
            resource_late_initialized: true,
        }
    );
    let p = &cr.spec.for_provider;
    assert_eq!(p.id, Some(1));
    assert_eq!(p.project_id, Some(PROJECT_ID));
    assert_eq!(p.allowed_to_push, Some(maintainer_permission()));
    assert_eq!(p.allow_force_push, Some(false));
    assert_eq!(ready_reason(&cr), Some(ConditionReason::Available));
    assert_eq!(
        cr.status.get_condition(ConditionType::Ready).map(|c| c.status),
        Some(ConditionStatus::True)
    );
}

#[tokio::test]
async fn test_second_observe_reports_no_late_initialization() {
    let mock = MockProtectedBranchClient::new();
    mock.set_get_result(Ok(observed_branch()));
    let mut cr = protected_branch_resource(params_with_project());
    let ext = external(&mock);

    ext.observe(&mut cr).await.unwrap();
    let observation = ext.observe(&mut cr).await.unwrap();

    assert!(observation.resource_up_to_date);
    assert!(!observation.resource_late_initialized);
}

#[tokio::test]
async fn test_observe_detects_drift() {
    let mock = MockProtectedBranchClient::new();
    mock.set_get_result(Ok(observed_branch()));
    let mut cr = protected_branch_resource(ProtectedBranchParameters {
        allow_force_push: Some(true),
        ..params_with_project()
    });

    let observation = external(&mock).observe(&mut cr).await.unwrap();

    assert!(observation.resource_exists);
    assert!(!observation.resource_up_to_date);
    assert_eq!(cr.spec.for_provider.allow_force_push, Some(true));
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_sends_payload_and_records_id() {
    let mock = MockProtectedBranchClient::new();
    let mut cr = protected_branch_resource(ProtectedBranchParameters {
        allowed_to_push: Some(maintainer_permission()),
        ..params_with_project()
    });

    let creation = external(&mock).create(&mut cr).await.unwrap();

    assert_eq!(creation.external_id, Some(1));
    assert_eq!(cr.spec.for_provider.id, Some(1));
    assert_eq!(ready_reason(&cr), Some(ConditionReason::Creating));
    let expected = generate_protect_repository_branches_options(&cr.spec.for_provider);
    assert_eq!(mock.calls(), vec![Call::Protect(PROJECT_ID, expected)]);
}

#[tokio::test]
async fn test_create_requires_project_id() {
    let mock = MockProtectedBranchClient::new();
    let mut cr = protected_branch_resource(ProtectedBranchParameters {
        name: BRANCH_NAME.to_string(),
        ..Default::default()
    });

    let err = external(&mock).create(&mut cr).await.unwrap_err();

    assert!(matches!(err, Error::ProjectIdMissing));
    assert!(mock.calls().is_empty());
    assert!(cr.status.conditions.is_empty());
}

#[tokio::test]
async fn test_create_wraps_remote_failure() {
    let mock = MockProtectedBranchClient::new();
    mock.fail_writes(Failure::Status(409));
    let mut cr = protected_branch_resource(params_with_project());

    let err = external(&mock).create(&mut cr).await.unwrap_err();

    assert!(matches!(err, Error::CreateFailed(_)));
    assert_eq!(cr.spec.for_provider.id, None);
}

#[tokio::test]
async fn test_create_rejects_other_resource_kinds() {
    let mock = MockProtectedBranchClient::new();

    let err = external(&mock)
        .create(&mut OtherResource)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotProtectedBranch));
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_addresses_branch_by_name() {
    let mock = MockProtectedBranchClient::new();
    let mut cr = protected_branch_resource(ProtectedBranchParameters {
        id: Some(1),
        code_owner_approval_required: Some(true),
        ..params_with_project()
    });

    external(&mock).update(&mut cr).await.unwrap();

    let expected = generate_update_protected_branch_options(&cr.spec.for_provider);
    assert_eq!(
        mock.calls(),
        vec![Call::Update(PROJECT_ID, BRANCH_NAME.to_string(), expected)]
    );
}

#[tokio::test]
async fn test_update_wraps_remote_failure() {
    let mock = MockProtectedBranchClient::new();
    mock.fail_writes(Failure::Status(500));
    let mut cr = protected_branch_resource(params_with_project());

    let err = external(&mock).update(&mut cr).await.unwrap_err();

    assert!(matches!(err, Error::UpdateFailed(_)));
}

#[tokio::test]
async fn test_update_requires_project_id() {
    let mock = MockProtectedBranchClient::new();
    let mut cr = protected_branch_resource(ProtectedBranchParameters {
        name: BRANCH_NAME.to_string(),
        ..Default::default()
    });

    let err = external(&mock).update(&mut cr).await.unwrap_err();

    assert!(matches!(err, Error::ProjectIdMissing));
    assert!(mock.calls().is_empty());
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_unprotects_branch() {
    let mock = MockProtectedBranchClient::new();
    let mut cr = protected_branch_resource(params_with_project());

    external(&mock).delete(&mut cr).await.unwrap();

    assert_eq!(
        mock.calls(),
        vec![Call::Unprotect(PROJECT_ID, BRANCH_NAME.to_string())]
    );
    assert_eq!(ready_reason(&cr), Some(ConditionReason::Deleting));
}

#[tokio::test]
async fn test_delete_wraps_remote_failure() {
    let mock = MockProtectedBranchClient::new();
    mock.fail_writes(Failure::Status(500));
    let mut cr = protected_branch_resource(params_with_project());

    let err = external(&mock).delete(&mut cr).await.unwrap_err();

    assert!(matches!(err, Error::DeleteFailed(_)));
    assert!(err.to_string().starts_with("cannot delete protected branch"));
}

#[tokio::test]
async fn test_delete_requires_project_id() {
    let mock = MockProtectedBranchClient::new();
    let mut cr = protected_branch_resource(ProtectedBranchParameters {
        name: BRANCH_NAME.to_string(),
        ..Default::default()
    });

    let err = external(&mock).delete(&mut cr).await.unwrap_err();

    assert!(matches!(err, Error::ProjectIdMissing));
    assert!(mock.calls().is_empty());
}
