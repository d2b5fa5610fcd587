use crate::sigv4::{
    canonical_query, sign, uri_encode, SignableRequest, SigningScope, LAMBDA_SERVICE,
};
use crate::types::ListMappingsResponse;
use crate::{
    ClientSettings, CreateMappingRequest, CreateOutcome, EventSourceMapping, LambdaApi,
    ListMappingsFilter, RemoteError, UpdateMappingRequest,
};
use serde::Serialize;
use slipway_config::StartingPosition;
use std::io::Read;
use tracing::debug;

const MAPPINGS_PATH: &str = "/2015-03-31/event-source-mappings/";

/// HTTP backend for the Lambda event-source mapping REST API.
///
/// - `POST /2015-03-31/event-source-mappings/`        create (409 on conflict)
/// - `GET  /2015-03-31/event-source-mappings/?...`    list by source and function
/// - `PUT  /2015-03-31/event-source-mappings/<uuid>`  update
///
/// Every request is signed with SigV4.
pub struct HttpBackend {
    settings: ClientSettings,
    agent: ureq::Agent,
}

/// Create body as sent on the wire: the timestamp travels as epoch seconds.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateBody<'a> {
    event_source_arn: &'a str,
    function_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    starting_position: Option<StartingPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    starting_position_timestamp: Option<i64>,
}

impl<'a> CreateBody<'a> {
    fn from_request(request: &'a CreateMappingRequest) -> Result<Self, RemoteError> {
        let starting_position_timestamp = request
            .starting_position_timestamp
            .as_deref()
            .map(|ts| {
                chrono::DateTime::parse_from_rfc3339(ts)
                    .map(|t| t.timestamp())
                    .map_err(|e| {
                        RemoteError::Serialization(format!(
                            "StartingPositionTimestamp '{ts}' is not RFC 3339: {e}"
                        ))
                    })
            })
            .transpose()?;
        Ok(Self {
            event_source_arn: &request.event_source_arn,
            function_name: &request.function_name,
            enabled: request.enabled,
            batch_size: request.batch_size,
            starting_position: request.starting_position,
            starting_position_timestamp,
        })
    }
}

impl HttpBackend {
    pub fn new(settings: ClientSettings) -> Self {
        let agent = ureq::Agent::new_with_defaults();
        Self { settings, agent }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{path}", self.settings.endpoint)
        } else {
            format!("{}{path}?{query}", self.settings.endpoint)
        }
    }

    fn auth_headers(
        &self,
        method: &str,
        path: &str,
        query: &str,
        payload: &[u8],
    ) -> Result<Vec<(&'static str, String)>, RemoteError> {
        let credentials = self.settings.credentials.resolve()?;
        sign(
            &SignableRequest {
                method,
                path,
                query,
                host: self.settings.host(),
                payload,
            },
            &credentials,
            &SigningScope {
                region: &self.settings.region,
                service: LAMBDA_SERVICE,
                time: chrono::Utc::now(),
            },
        )
    }

    fn do_send(
        &self,
        method: &str,
        path: &str,
        headers: &[(&'static str, String)],
        body: &[u8],
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = self.url(path, "");
        let mut req = match method {
            "POST" => self.agent.post(&url),
            _ => self.agent.put(&url),
        }
        .header("Content-Type", "application/json");
        for (name, value) in headers {
            req = req.header(*name, value);
        }
        req.send(body)
    }

    fn do_get(
        &self,
        path: &str,
        query: &str,
        headers: &[(&'static str, String)],
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = self.url(path, query);
        let mut req = self.agent.get(&url);
        for (name, value) in headers {
            req = req.header(*name, value);
        }
        req.call()
    }
}

fn transport_error(operation: &'static str, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::StatusCode(status) => RemoteError::Status { operation, status },
        other => RemoteError::Http(format!("{operation}: {other}")),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(
    resp: ureq::http::Response<ureq::Body>,
) -> Result<T, RemoteError> {
    let mut reader = resp.into_body().into_reader();
    let mut body = Vec::new();
    reader
        .read_to_end(&mut body)
        .map_err(|e| RemoteError::Http(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| RemoteError::Serialization(e.to_string()))
}

impl LambdaApi for HttpBackend {
    fn create_event_source_mapping(
        &self,
        request: &CreateMappingRequest,
    ) -> Result<CreateOutcome, RemoteError> {
        let body = serde_json::to_vec(&CreateBody::from_request(request)?)
            .map_err(|e| RemoteError::Serialization(e.to_string()))?;
        debug!(
            "POST {MAPPINGS_PATH} {} -> {}",
            request.event_source_arn, request.function_name
        );
        let headers = self.auth_headers("POST", MAPPINGS_PATH, "", &body)?;
        match self.do_send("POST", MAPPINGS_PATH, &headers, &body) {
            Ok(resp) => Ok(CreateOutcome::Created(read_json(resp)?)),
            Err(ureq::Error::StatusCode(409)) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(transport_error("CreateEventSourceMapping", e)),
        }
    }

    fn list_event_source_mappings(
        &self,
        filter: &ListMappingsFilter,
    ) -> Result<Vec<EventSourceMapping>, RemoteError> {
        let max_items = filter.max_items.to_string();
        let query = canonical_query(&[
            ("EventSourceArn", filter.event_source_arn.as_str()),
            ("FunctionName", filter.function_name.as_str()),
            ("MaxItems", max_items.as_str()),
        ]);
        debug!("GET {MAPPINGS_PATH}?{query}");
        let headers = self.auth_headers("GET", MAPPINGS_PATH, &query, b"")?;
        let resp = self
            .do_get(MAPPINGS_PATH, &query, &headers)
            .map_err(|e| transport_error("ListEventSourceMappings", e))?;
        let list: ListMappingsResponse = read_json(resp)?;
        Ok(list.event_source_mappings)
    }

    fn update_event_source_mapping(
        &self,
        request: &UpdateMappingRequest,
    ) -> Result<EventSourceMapping, RemoteError> {
        let path = format!("{MAPPINGS_PATH}{}", uri_encode(&request.uuid, true));
        let body =
            serde_json::to_vec(request).map_err(|e| RemoteError::Serialization(e.to_string()))?;
        debug!("PUT {path}");
        let headers = self.auth_headers("PUT", &path, "", &body)?;
        let resp = self
            .do_send("PUT", &path, &headers, &body)
            .map_err(|e| transport_error("UpdateEventSourceMapping", e))?;
        read_json(resp)
    }
}
