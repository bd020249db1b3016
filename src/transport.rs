// Transport seam: the client builds `ApiRequest` values and hands them to a
// `Transport`. `HttpTransport` is the blocking reqwest implementation used
// by the CLI; tests plug in a recording fake.

use crate::error::{ClientError, ClientResult};
use reqwest::blocking::{multipart, Client};
use reqwest::Url;
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    /// Multipart upload of a local file under the `file` part.
    File { path: PathBuf, mime: &'static str },
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("<empty>"),
            Payload::Json(value) => write!(f, "{}", value),
            Payload::File { path, mime } => write!(f, "{} ({})", path.display(), mime),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub payload: Payload,
}

/// Status and raw body of a response. The body is kept as text because
/// error bodies are surfaced verbatim and non-JSON formats are returned
/// unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and waits for the full response.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        (**self).send(request)
    }
}

/// Blocking reqwest transport with the library's default settings.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

const FILE_PART: &str = "file";

impl HttpTransport {
    pub fn new() -> ClientResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("mockaroo-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpTransport { client })
    }

    fn multipart_form(path: &Path, mime: &str) -> ClientResult<multipart::Form> {
        // The handle moves into the form and is dropped with the request.
        let file = File::open(path).map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();

        let part = multipart::Part::reader(file)
            .file_name(file_name)
            .mime_str(mime)?;
        Ok(multipart::Form::new().part(FILE_PART, part))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let url = request.url.clone();
        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        };
        let builder = match &request.payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::File { path, mime } => builder.multipart(Self::multipart_form(path, mime)?),
        };

        let res = builder.send()?;
        let status = res.status().as_u16();
        let body = res.text()?;
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(302, "").is_success());
        assert!(!ApiResponse::new(404, "").is_success());
    }

    #[test]
    fn payload_display() {
        assert_eq!(Payload::Empty.to_string(), "<empty>");
        let file = Payload::File {
            path: PathBuf::from("data/people.csv"),
            mime: "text/csv",
        };
        assert_eq!(file.to_string(), "data/people.csv (text/csv)");
    }

    #[test]
    fn missing_upload_file_fails_before_sending() {
        let transport = HttpTransport::new().unwrap();
        let request = ApiRequest {
            method: Method::Post,
            url: Url::parse("http://127.0.0.1:9/api/datasets/x").unwrap(),
            payload: Payload::File {
                path: PathBuf::from("/definitely/not/here.csv"),
                mime: "text/csv",
            },
        };
        let err = transport.send(&request).unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
    }
}
