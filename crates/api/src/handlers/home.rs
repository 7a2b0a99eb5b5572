use axum::response::Html;

const WELCOME_PAGE: &str = "<!DOCTYPE html>
<html>
<head><title>Stereo Pan Rig</title></head>
<body>
<h1>Welcome to the stereo pan rig</h1>
<p>Camera control API is under <code>/api/v1</code>.</p>
</body>
</html>
";

/// GET /
pub async fn welcome() -> Html<&'static str> {
    Html(WELCOME_PAGE)
}
