use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{http::StatusCode, Body, Error, Response};

pub fn with_cors_headers(mut resp: Response<Body>, allow_origin: &str) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(allow_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    if allow_origin != "*" {
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
    resp
}

pub fn finalize_response(
    resp: Result<Response<Body>, Error>,
    allow_origin: &str,
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(r, allow_origin))
}

/// Empty 200 for OPTIONS requests.
pub fn preflight(allow_origin: &str) -> Result<Response<Body>, Error> {
    let resp = Response::builder()
        .status(StatusCode::OK)
        .body(Body::Empty)
        .map_err(Box::new)?;
    Ok(with_cors_headers(resp, allow_origin))
}
