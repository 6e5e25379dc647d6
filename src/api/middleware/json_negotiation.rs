use axum::{
    extract::Request,
    http::{header::ACCEPT, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use crate::utils::response_handler::HandlerResponse;

/// Media ranges that admit a JSON response, most specific first
const JSON_RANGES: [&str; 3] = ["application/json", "application/*", "*/*"];

/// Quality of one `type/subtype;q=..` range; missing or unparsable `q` counts as 1
fn quality(params: &str) -> f32 {
    params
        .split(';')
        .filter_map(|param: &str| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, value)| value.trim().parse::<f32>().ok())
        .unwrap_or(1.0)
}

/// True when the request has no Accept header, or the most specific range
/// matching JSON has a non-zero quality
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let ranges: Vec<(String, f32)> = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value: &str| value.split(','))
        .filter(|range: &&str| !range.trim().is_empty())
        .map(|range: &str| {
            let (media, params) = range.split_once(';').unwrap_or((range, ""));
            (media.trim().to_ascii_lowercase(), quality(params))
        })
        .collect();

    if ranges.is_empty() {
        return true;
    }

    JSON_RANGES
        .iter()
        .find_map(|json: &&str| {
            ranges
                .iter()
                .filter(|(media, _)| media == json)
                .map(|(_, q)| *q)
                .reduce(f32::max)
        })
        .is_some_and(|q: f32| q > 0.0)
}

/// Person routes only produce JSON; anything else is answered with 406
pub async fn require_json(
    request: Request,
    next: Next,
) -> Result<Response, HandlerResponse> {
    if !accepts_json(request.headers()) {
        tracing::debug!("Rejecting request that does not accept JSON");
        return Err(HandlerResponse::new(StatusCode::NOT_ACCEPTABLE)
            .message("Only application/json responses are produced"));
    }

    Ok(next.run(request).await)
}
