use crate::factory::ClientFactory;
use crate::{
    CreateMappingRequest, CreateOutcome, EventSourceMapping, LambdaApi, ListMappingsFilter,
    RemoteError, UpdateMappingRequest,
};
use slipway_config::ComposedConfig;
use std::sync::{Arc, Mutex, MutexGuard};

/// A call observed by [`MockLambda`], in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Create(CreateMappingRequest),
    List(ListMappingsFilter),
    Update(UpdateMappingRequest),
}

#[derive(Debug, Default)]
struct MockState {
    mappings: Vec<EventSourceMapping>,
    function_of: Vec<String>,
    calls: Vec<ApiCall>,
    create_failure: Option<u16>,
    next_id: usize,
}

/// In-memory event-source mapping API that records every call.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the calls through another.
#[derive(Debug, Clone, Default)]
pub struct MockLambda {
    state: Arc<Mutex<MockState>>,
}

impl MockLambda {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register an association that already exists remotely.
    pub fn with_existing(self, event_source_arn: &str, function_name: &str, uuid: &str) -> Self {
        {
            let mut state = self.lock();
            state.mappings.push(EventSourceMapping {
                uuid: uuid.to_owned(),
                event_source_arn: Some(event_source_arn.to_owned()),
                function_arn: None,
                state: Some("Enabled".to_owned()),
                batch_size: None,
            });
            state.function_of.push(function_name.to_owned());
        }
        self
    }

    /// Make every create fail with the given HTTP status.
    pub fn with_create_failure(self, status: u16) -> Self {
        self.lock().create_failure = Some(status);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn mappings(&self) -> Vec<EventSourceMapping> {
        self.lock().mappings.clone()
    }
}

impl MockState {
    fn find(&self, event_source_arn: &str, function_name: &str) -> Option<usize> {
        self.mappings.iter().zip(&self.function_of).position(|(m, f)| {
            m.event_source_arn.as_deref() == Some(event_source_arn) && f == function_name
        })
    }
}

impl LambdaApi for MockLambda {
    fn create_event_source_mapping(
        &self,
        request: &CreateMappingRequest,
    ) -> Result<CreateOutcome, RemoteError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::Create(request.clone()));
        if let Some(status) = state.create_failure {
            return Err(RemoteError::Status {
                operation: "CreateEventSourceMapping",
                status,
            });
        }
        if state
            .find(&request.event_source_arn, &request.function_name)
            .is_some()
        {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.next_id += 1;
        let mapping = EventSourceMapping {
            uuid: format!("mock-uuid-{}", state.next_id),
            event_source_arn: Some(request.event_source_arn.clone()),
            function_arn: None,
            state: Some("Creating".to_owned()),
            batch_size: request.batch_size,
        };
        state.mappings.push(mapping.clone());
        state.function_of.push(request.function_name.clone());
        Ok(CreateOutcome::Created(mapping))
    }

    fn list_event_source_mappings(
        &self,
        filter: &ListMappingsFilter,
    ) -> Result<Vec<EventSourceMapping>, RemoteError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::List(filter.clone()));
        Ok(state
            .mappings
            .iter()
            .zip(&state.function_of)
            .filter(|(m, f)| {
                m.event_source_arn.as_deref() == Some(filter.event_source_arn.as_str())
                    && **f == filter.function_name
            })
            .map(|(m, _)| m.clone())
            .take(filter.max_items as usize)
            .collect())
    }

    fn update_event_source_mapping(
        &self,
        request: &UpdateMappingRequest,
    ) -> Result<EventSourceMapping, RemoteError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::Update(request.clone()));
        let mapping = state
            .mappings
            .iter_mut()
            .find(|m| m.uuid == request.uuid)
            .ok_or(RemoteError::Status {
                operation: "UpdateEventSourceMapping",
                status: 404,
            })?;
        if request.batch_size.is_some() {
            mapping.batch_size = request.batch_size;
        }
        if let Some(enabled) = request.enabled {
            mapping.state = Some(if enabled { "Enabled" } else { "Disabled" }.to_owned());
        }
        Ok(mapping.clone())
    }
}

/// Factory handing out clones of one [`MockLambda`] and counting builds.
#[derive(Debug, Clone, Default)]
pub struct MockClientFactory {
    api: MockLambda,
    builds: Arc<Mutex<usize>>,
}

impl MockClientFactory {
    pub fn new(api: MockLambda) -> Self {
        Self {
            api,
            builds: Arc::new(Mutex::new(0)),
        }
    }

    pub fn builds(&self) -> usize {
        match self.builds.lock() {
            Ok(count) => *count,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl ClientFactory for MockClientFactory {
    fn build(&self, _config: &ComposedConfig) -> Result<Box<dyn LambdaApi>, RemoteError> {
        let mut count = self
            .builds
            .lock()
            .map_err(|e| RemoteError::Config(format!("mutex poisoned: {e}")))?;
        *count += 1;
        Ok(Box::new(self.api.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(arn: &str) -> CreateMappingRequest {
        CreateMappingRequest {
            event_source_arn: arn.to_owned(),
            function_name: "tester".to_owned(),
            enabled: Some(true),
            batch_size: Some(10),
            starting_position: None,
            starting_position_timestamp: None,
        }
    }

    #[test]
    fn second_create_conflicts() {
        let api = MockLambda::new();
        assert!(matches!(
            api.create_event_source_mapping(&create("arn:a")).unwrap(),
            CreateOutcome::Created(_)
        ));
        assert_eq!(
            api.create_event_source_mapping(&create("arn:a")).unwrap(),
            CreateOutcome::AlreadyExists
        );
        assert_eq!(api.calls().len(), 2);
    }

    #[test]
    fn list_is_scoped_to_source_and_function() {
        let api = MockLambda::new()
            .with_existing("arn:a", "tester", "u-a")
            .with_existing("arn:a", "other", "u-b");
        let found = api
            .list_event_source_mappings(&ListMappingsFilter::single("arn:a", "other"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uuid, "u-b");
    }

    #[test]
    fn factory_counts_builds_and_shares_state() {
        let api = MockLambda::new();
        let factory = MockClientFactory::new(api.clone());
        let client = factory.build(&ComposedConfig::default()).unwrap();
        client.create_event_source_mapping(&create("arn:z")).unwrap();
        assert_eq!(factory.builds(), 1);
        assert_eq!(api.mappings().len(), 1);
    }
}
