use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// GET /
/// Single-page front end driving the upload → analyse → enhance → download flow.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
