use serde::{Deserialize, Serialize};
use slipway_config::{EventSourceDescriptor, StartingPosition};

/// Request to associate an event source with a function.
///
/// Optional fields that are not set on the descriptor are left out of the
/// serialized request entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMappingRequest {
    pub event_source_arn: String,
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_position: Option<StartingPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_position_timestamp: Option<String>,
}

impl CreateMappingRequest {
    pub fn from_descriptor(descriptor: &EventSourceDescriptor, function_name: &str) -> Self {
        Self {
            event_source_arn: descriptor.event_source_arn.clone(),
            function_name: function_name.to_owned(),
            enabled: descriptor.enabled,
            batch_size: descriptor.batch_size,
            starting_position: descriptor.starting_position,
            starting_position_timestamp: descriptor.effective_timestamp().map(str::to_owned),
        }
    }
}

/// Lookup of existing associations for one source/function pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMappingsFilter {
    pub event_source_arn: String,
    pub function_name: String,
    pub max_items: u32,
}

impl ListMappingsFilter {
    /// Filter expecting at most one association.
    pub fn single(event_source_arn: &str, function_name: &str) -> Self {
        Self {
            event_source_arn: event_source_arn.to_owned(),
            function_name: function_name.to_owned(),
            max_items: 1,
        }
    }
}

/// Update of an existing association's mutable fields.
///
/// `uuid` addresses the mapping and travels in the request path, not the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateMappingRequest {
    #[serde(skip)]
    pub uuid: String,
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

impl UpdateMappingRequest {
    pub fn from_descriptor(
        uuid: &str,
        descriptor: &EventSourceDescriptor,
        function_name: &str,
    ) -> Self {
        Self {
            uuid: uuid.to_owned(),
            function_name: function_name.to_owned(),
            enabled: descriptor.enabled,
            batch_size: descriptor.batch_size,
        }
    }
}

/// An association as reported by the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSourceMapping {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListMappingsResponse {
    #[serde(default)]
    pub event_source_mappings: Vec<EventSourceMapping>,
}

/// Result of a create attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(EventSourceMapping),
    AlreadyExists,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> EventSourceDescriptor {
        EventSourceDescriptor {
            event_source_arn: "arn:x".to_owned(),
            enabled: Some(true),
            batch_size: Some(10),
            starting_position: Some(StartingPosition::AtTimestamp),
            starting_position_timestamp: Some("2020-01-01T00:00:00Z".to_owned()),
        }
    }

    #[test]
    fn create_request_carries_exactly_the_declared_fields() {
        let request = CreateMappingRequest::from_descriptor(&descriptor(), "tester");
        let value = serde_json::to_value(&request).unwrap();
        let expected = serde_json::json!({
            "EventSourceArn": "arn:x",
            "FunctionName": "tester",
            "Enabled": true,
            "BatchSize": 10,
            "StartingPosition": "AT_TIMESTAMP",
            "StartingPositionTimestamp": "2020-01-01T00:00:00Z",
        });
        assert_eq!(value, expected);
    }

    #[test]
    fn create_request_omits_absent_fields() {
        let d = EventSourceDescriptor {
            event_source_arn: "arn:y".to_owned(),
            enabled: None,
            batch_size: None,
            starting_position: None,
            starting_position_timestamp: None,
        };
        let value = serde_json::to_value(CreateMappingRequest::from_descriptor(&d, "f")).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["EventSourceArn", "FunctionName"]);
    }

    #[test]
    fn create_request_drops_timestamp_for_other_positions() {
        let mut d = descriptor();
        d.starting_position = Some(StartingPosition::TrimHorizon);
        let request = CreateMappingRequest::from_descriptor(&d, "f");
        assert!(request.starting_position_timestamp.is_none());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["StartingPosition"], "TRIM_HORIZON");
        assert!(value.get("StartingPositionTimestamp").is_none());
    }

    #[test]
    fn update_body_leaves_uuid_in_path() {
        let request = UpdateMappingRequest::from_descriptor("u-1", &descriptor(), "tester");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"FunctionName": "tester", "Enabled": true, "BatchSize": 10})
        );
        assert_eq!(request.uuid, "u-1");
    }

    #[test]
    fn mapping_parses_remote_shape() {
        let mapping: EventSourceMapping = serde_json::from_str(
            r#"{"UUID": "abc", "EventSourceArn": "arn:x", "FunctionArn": "arn:fn", "State": "Enabled", "BatchSize": 5, "LastModified": 1.6e9}"#,
        )
        .unwrap();
        assert_eq!(mapping.uuid, "abc");
        assert_eq!(mapping.state.as_deref(), Some("Enabled"));
    }
}
