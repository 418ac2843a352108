use anyhow::Result;
use bytes::Bytes;
use http::{Request, Response, StatusCode};

use body::{FromBody, IntoBody, Json};

pub mod body;

/// Handler failure caused by the caller's input rather than the server.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BadRequest(pub String);

// Request handling helpers

/// Decode the body, call `handler`, and encode its response.
///
/// Failures become JSON `{"error": ...}` responses: 400 for undecodable bodies
/// and [`BadRequest`] errors, 500 for anything else.
pub fn run<I, O, F>(req: Request<Bytes>, handler: F) -> Response<Bytes>
where
    F: FnOnce(Request<I>) -> Result<Response<O>>,
    I: FromBody,
    O: IntoBody,
{
    let (parts, body) = req.into_parts();
    let body = match I::from_data(body) {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(error = %err, "errored during body parsing");
            return json_error_response(StatusCode::BAD_REQUEST, err);
        }
    };
    let req = Request::from_parts(parts, body);

    let res = match handler(req) {
        Ok(res) => res,
        Err(err) if err.is::<BadRequest>() => {
            tracing::warn!(error = %err, "rejected request");
            return json_error_response(StatusCode::BAD_REQUEST, err);
        }
        Err(err) => {
            tracing::error!(error = %err, "errored during request handling");
            return json_error_response(StatusCode::INTERNAL_SERVER_ERROR, err);
        }
    };

    let (mut parts, data) = res.into_parts();
    data.extend_response_parts(&mut parts);
    match data.into_body() {
        Ok(body) => Response::from_parts(parts, body),
        Err(err) => {
            tracing::error!(error = %err, "errored during response encoding");
            json_error_response(StatusCode::INTERNAL_SERVER_ERROR, err)
        }
    }
}

fn json_error_response(status_code: StatusCode, err: anyhow::Error) -> Response<Bytes> {
    let message = format!("{err:#}");
    let body = Json(serde_json::json!({ "error": message }))
        .into_body()
        .unwrap_or_else(|_| Bytes::from_static(br#"{"error":"internal error"}"#));

    let mut res = Response::new(body);
    *res.status_mut() = status_code;
    res.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    res
}
