use serde::Serialize;
use slipway_config::EventSourceDescriptor;
use slipway_remote::{
    CreateMappingRequest, CreateOutcome, LambdaApi, ListMappingsFilter, RemoteError,
    UpdateMappingRequest,
};
use tracing::{debug, info};

/// What happened to one declared trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconcileAction {
    Created {
        event_source_arn: String,
        uuid: String,
    },
    Updated {
        event_source_arn: String,
        uuid: String,
    },
}

/// Make the remote associations match `descriptors`, in manifest order.
///
/// Each trigger is created; when the platform reports it already exists, the
/// existing association is looked up and updated in place. Any other remote
/// failure stops the run and is returned unchanged.
pub fn reconcile(
    descriptors: &[EventSourceDescriptor],
    function_name: &str,
    api: &dyn LambdaApi,
) -> Result<Vec<ReconcileAction>, RemoteError> {
    let mut actions = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        actions.push(reconcile_one(descriptor, function_name, api)?);
    }
    Ok(actions)
}

fn reconcile_one(
    descriptor: &EventSourceDescriptor,
    function_name: &str,
    api: &dyn LambdaApi,
) -> Result<ReconcileAction, RemoteError> {
    let arn = &descriptor.event_source_arn;
    let request = CreateMappingRequest::from_descriptor(descriptor, function_name);

    match api.create_event_source_mapping(&request)? {
        CreateOutcome::Created(mapping) => {
            info!("created event source mapping {arn} -> {function_name}");
            Ok(ReconcileAction::Created {
                event_source_arn: arn.clone(),
                uuid: mapping.uuid,
            })
        }
        CreateOutcome::AlreadyExists => {
            debug!("{arn} is already mapped to {function_name}, updating in place");
            let existing = api
                .list_event_source_mappings(&ListMappingsFilter::single(arn, function_name))?
                .into_iter()
                .next()
                .ok_or_else(|| RemoteError::MappingNotFound {
                    event_source_arn: arn.clone(),
                    function_name: function_name.to_owned(),
                })?;

            let update = UpdateMappingRequest::from_descriptor(&existing.uuid, descriptor, function_name);
            api.update_event_source_mapping(&update)?;
            info!("updated event source mapping {} ({arn})", existing.uuid);
            Ok(ReconcileAction::Updated {
                event_source_arn: arn.clone(),
                uuid: existing.uuid,
            })
        }
    }
}
