//! Ad-click and campaign attribution carried by the donation redirect.

use serde::{Deserialize, Serialize};

/// Attribution parameters parsed from the landing URL's query string.
///
/// Absent parameters stay `None` and are forwarded as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionParams {
    #[serde(default)]
    pub gclid: Option<String>,
    #[serde(default)]
    pub gbraid: Option<String>,
    #[serde(default)]
    pub wbraid: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub utm_term: Option<String>,
    #[serde(default)]
    pub utm_content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;
    use serde_json::json;

    #[test]
    fn test_query_string_maps_to_payload() {
        let uri: Uri = "/donate?gclid=abc123&utm_source=google&ref=ignored"
            .parse()
            .unwrap();
        let Query(params) = Query::<AttributionParams>::try_from_uri(&uri).unwrap();

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "gclid": "abc123",
                "gbraid": null,
                "wbraid": null,
                "utm_source": "google",
                "utm_medium": null,
                "utm_campaign": null,
                "utm_term": null,
                "utm_content": null
            })
        );
    }

    #[test]
    fn test_empty_query_is_all_null() {
        let uri: Uri = "/donate".parse().unwrap();
        let Query(params) = Query::<AttributionParams>::try_from_uri(&uri).unwrap();
        assert_eq!(params, AttributionParams::default());
    }
}
