use lambda_http::{http::StatusCode, Body, Error, Response};

const STATUS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Gigboard API</title>
</head>
<body>
  <h1>Gigboard API is running</h1>
  <p>Tasks: <code>/api/v1/tasks</code> &middot; Featured: <code>/api/v1/featured-tasks</code> &middot; Bids: <code>/api/v1/my-bids</code></p>
</body>
</html>
"#;

/// GET / liveness page.
pub fn status_page() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(STATUS_PAGE.into())
        .map_err(Box::new)?)
}
