// API client module: a small blocking client for the Mockaroo service.
//
// Each operation builds one `ApiRequest`, attaches the API key as the `key`
// query parameter, sends it through the configured `Transport` and maps the
// response onto a typed result or a `ClientError`. Every call also returns a
// `CallTrace` describing what was sent, so the client itself holds no
// mutable state and can be shared freely.

use crate::config::{ClientConfig, DeletePolicy};
use crate::error::{ClientError, ClientResult, ServiceError};
use crate::model::{
    DatasetConfirmation, DeleteOutcome, GenerateRequest, GeneratedData, TypeDescriptor,
    TypesPayload,
};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Payload, Transport};
use reqwest::Url;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

const API: &str = "api";
const TYPES: &str = "types";
const GENERATE: &str = "generate";
const DATASETS: &str = "datasets";

/// Diagnostic record of a single call: what was sent and, on failure,
/// what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct CallTrace {
    pub method: Method,
    /// Final URL including query parameters. `None` if the URL could not
    /// be built.
    pub url: Option<Url>,
    pub payload: Payload,
    pub error: Option<TraceError>,
}

/// Failure detail kept in a `CallTrace`. Service failures carry the status
/// and the response body exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceError {
    pub message: String,
    pub status: Option<u16>,
    pub body: Option<String>,
}

impl From<&ClientError> for TraceError {
    fn from(err: &ClientError) -> Self {
        let service = err.as_service();
        TraceError {
            message: err.to_string(),
            status: service.map(|s| s.status),
            body: service.map(|s| s.body.clone()),
        }
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl CallTrace {
    fn new(method: Method) -> Self {
        CallTrace {
            method,
            url: None,
            payload: Payload::Empty,
            error: None,
        }
    }

    /// True if the request got as far as having a URL; says nothing about
    /// whether it was sent.
    pub fn has_url(&self) -> bool {
        self.url.is_some()
    }
}

impl fmt::Display for CallTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = self
            .url
            .as_ref()
            .map(redact_key)
            .unwrap_or_else(|| "<no url>".to_string());
        write!(f, "{} {} payload={}", self.method, url, self.payload)?;
        if let Some(err) = &self.error {
            write!(f, " error={}", err)?;
        }
        Ok(())
    }
}

/// Outcome of an operation together with its trace.
#[derive(Debug)]
pub struct CallResult<T> {
    pub outcome: ClientResult<T>,
    pub trace: CallTrace,
}

impl<T> CallResult<T> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn trace(&self) -> &CallTrace {
        &self.trace
    }

    pub fn into_result(self) -> ClientResult<T> {
        self.outcome
    }

    pub fn into_parts(self) -> (ClientResult<T>, CallTrace) {
        (self.outcome, self.trace)
    }
}

/// Mockaroo API client. Generic over the transport so tests can observe
/// requests without a network.
#[derive(Clone, Debug)]
pub struct ApiClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl ApiClient<HttpTransport> {
    /// Client backed by the default blocking HTTP transport.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Ok(ApiClient {
            config,
            transport: HttpTransport::new()?,
        })
    }

    /// Create an ApiClient configured from the environment. See
    /// `ClientConfig::from_env` for the key lookup order.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env(None))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        ApiClient { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// List the field types the service supports.
    pub fn types(&self) -> CallResult<Vec<TypeDescriptor>> {
        self.call(
            Method::Get,
            &[API, TYPES],
            Vec::new(),
            || Ok(Payload::Empty),
            |res| Ok(serde_json::from_str::<TypesPayload>(&res.body)?.into_types()),
        )
    }

    /// Generate records from a saved schema or an inline field list.
    ///
    /// JSON output is parsed; csv, txt, xml and sql are returned as text.
    pub fn generate(&self, req: &GenerateRequest) -> CallResult<GeneratedData> {
        let mut segments = vec![API, GENERATE];
        if let Some(schema) = req.schema.as_deref() {
            segments.push(schema);
        }

        let mut query = vec![
            ("count", req.count.to_string()),
            ("fmt", req.format.to_string()),
        ];
        if let Some(header) = req.header {
            query.push(("header", header.to_string()));
        }
        if req.array {
            query.push(("array", "true".to_string()));
        }

        let format = req.format;
        self.call(
            Method::Post,
            &segments,
            query,
            || {
                validate_generate(req)?;
                Ok(match &req.fields {
                    Some(fields) => Payload::Json(serde_json::to_value(fields)?),
                    None => Payload::Empty,
                })
            },
            move |res| {
                if format.is_structured() {
                    Ok(GeneratedData::Json(serde_json::from_str(&res.body)?))
                } else {
                    Ok(GeneratedData::Text(res.body))
                }
            },
        )
    }

    /// Upload a csv or txt file as a named dataset.
    pub fn upload(&self, name: &str, path: impl AsRef<Path>) -> CallResult<DatasetConfirmation> {
        let path = path.as_ref();
        self.call(
            Method::Post,
            &[API, DATASETS, name],
            Vec::new(),
            || {
                let mime = mime_for(path)?;
                Ok(Payload::File {
                    path: path.to_path_buf(),
                    mime,
                })
            },
            |res| Ok(serde_json::from_str(&res.body)?),
        )
    }

    /// Delete a dataset. With `DeletePolicy::Idempotent` a not-found answer
    /// becomes `DeleteOutcome::Missing`; the trace still carries the
    /// service's message.
    pub fn delete(&self, name: &str) -> CallResult<DeleteOutcome> {
        let mut result = self.call(
            Method::Delete,
            &[API, DATASETS, name],
            Vec::new(),
            || Ok(Payload::Empty),
            |res| Ok(DeleteOutcome::Deleted(serde_json::from_str(&res.body)?)),
        );

        if self.config.delete_policy == DeletePolicy::Idempotent {
            if let Err(err) = &result.outcome {
                if err.is_not_found() {
                    debug!(dataset = name, "dataset already absent");
                    result.outcome = Ok(DeleteOutcome::Missing);
                }
            }
        }
        result
    }

    fn call<R>(
        &self,
        method: Method,
        segments: &[&str],
        query: Vec<(&str, String)>,
        payload: impl FnOnce() -> ClientResult<Payload>,
        parse: impl FnOnce(ApiResponse) -> ClientResult<R>,
    ) -> CallResult<R> {
        let mut trace = CallTrace::new(method);
        let outcome = self
            .dispatch(&mut trace, segments, query, payload)
            .and_then(parse);

        if let Err(err) = &outcome {
            warn!(method = %method, error = %err, "mockaroo call failed");
            trace.error = Some(TraceError::from(err));
        }
        CallResult { outcome, trace }
    }

    fn dispatch(
        &self,
        trace: &mut CallTrace,
        segments: &[&str],
        query: Vec<(&str, String)>,
        payload: impl FnOnce() -> ClientResult<Payload>,
    ) -> ClientResult<ApiResponse> {
        let url = self.endpoint(segments, query)?;
        trace.url = Some(url.clone());

        let payload = payload()?;
        trace.payload = payload.clone();

        // Never send a keyless request.
        self.config.require_api_key()?;

        let request = ApiRequest {
            method: trace.method,
            url,
            payload,
        };
        debug!(method = %request.method, url = %redact_key(&request.url), "sending request");
        let response = self.transport.send(&request)?;
        debug!(status = response.status, bytes = response.body.len(), "received response");

        if !response.is_success() {
            return Err(ServiceError::new(response.status, response.body).into());
        }
        Ok(response)
    }

    fn endpoint(&self, segments: &[&str], query: Vec<(&str, String)>) -> ClientResult<Url> {
        let base = self.config.base_url();
        let mut url = Url::parse(&base)
            .map_err(|e| ClientError::config(format!("invalid host '{}': {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::config(format!("invalid host '{}'", base)))?
            .pop_if_empty()
            .extend(segments);

        let mut pairs: Vec<(&str, String)> = Vec::with_capacity(query.len() + 1);
        if let Some(key) = self.config.api_key() {
            pairs.push(("key", key.to_string()));
        }
        pairs.extend(query);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

fn validate_generate(req: &GenerateRequest) -> ClientResult<()> {
    match (&req.schema, &req.fields) {
        (Some(_), Some(_)) => {
            return Err(ClientError::invalid_request(
                "schema and fields are mutually exclusive",
            ))
        }
        (None, None) => {
            return Err(ClientError::invalid_request(
                "either a schema name or a list of fields is required",
            ))
        }
        (Some(schema), None) if schema.trim().is_empty() => {
            return Err(ClientError::invalid_request("schema name is empty"))
        }
        (None, Some(fields)) if fields.is_empty() => {
            return Err(ClientError::invalid_request("field list is empty"))
        }
        _ => {}
    }

    if let Some(fields) = &req.fields {
        if let Some(bad) = fields
            .iter()
            .find(|f| f.name.trim().is_empty() || f.field_type.trim().is_empty())
        {
            return Err(ClientError::invalid_request(format!(
                "each field must have a 'name' and 'type' (got name='{}', type='{}')",
                bad.name, bad.field_type
            )));
        }
    }

    if req.count == 0 {
        return Err(ClientError::invalid_request("count must be at least 1"));
    }
    Ok(())
}

/// Multipart content type for a dataset file, from its extension.
pub fn mime_for(path: &Path) -> ClientResult<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" => Ok("text/csv"),
        "txt" => Ok("text/plain"),
        _ => Err(ClientError::UnsupportedFileType {
            path: path.to_path_buf(),
            extension,
        }),
    }
}

/// URL as text with the API key masked, for logs.
pub fn redact_key(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "key") {
        return url.to_string();
    }
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
