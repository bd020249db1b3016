// Library root
// -----------
// Client library for the Mockaroo mock-data service. The binary
// (`main.rs`) is a thin command-line front-end over these modules.
//
// Module responsibilities:
// - `api`: the `ApiClient` operations (types, generate, upload, delete)
//   and the per-call `CallTrace` diagnostics.
// - `config`: API key and host resolution, key-file persistence.
// - `error`: the `ClientError` taxonomy.
// - `model`: request and response types.
// - `transport`: the `Transport` seam and the blocking reqwest transport.
// - `ui`: argument parsing and rendering for the CLI.
pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod transport;
pub mod ui;

pub use api::{ApiClient, CallResult, CallTrace, TraceError};
pub use config::{ClientConfig, DeletePolicy};
pub use error::{ClientError, ClientResult, ServiceError, ServiceErrorKind};
pub use model::{
    DatasetConfirmation, DeleteOutcome, FieldSpec, Format, GenerateRequest, GeneratedData,
    TypeDescriptor, TypeParameter,
};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Payload, Transport};
