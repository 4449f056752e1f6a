//! Magic-link token handoff from a hosted login page.

/// Query parameter carrying the handoff token.
const TOKEN_PARAM: &str = "token";

/// Extract a `token` query parameter from a navigable URL.
///
/// Returns the token and the URL with the parameter removed, so the host
/// can replace its visible location. `None` when the URL carries no
/// token.
pub fn extract_token_param(url: &str) -> Option<(String, String)> {
    let (base, rest) = url.split_once('?')?;
    let (query, fragment) = match rest.split_once('#') {
        Some((query, fragment)) => (query, Some(fragment)),
        None => (rest, None),
    };

    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
    let token = pairs
        .iter()
        .find(|(name, value)| name == TOKEN_PARAM && !value.is_empty())?
        .1
        .clone();

    let remaining: Vec<(String, String)> = pairs
        .into_iter()
        .filter(|(name, _)| name != TOKEN_PARAM)
        .collect();

    let mut cleaned = base.to_string();
    if !remaining.is_empty() {
        let query = serde_urlencoded::to_string(&remaining).ok()?;
        cleaned.push('?');
        cleaned.push_str(&query);
    }
    if let Some(fragment) = fragment {
        cleaned.push('#');
        cleaned.push_str(fragment);
    }

    Some((token, cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_token_and_cleans_url() {
        let (token, cleaned) =
            extract_token_param("https://app.example.com/dashboard?token=abc123").unwrap();
        assert_eq!(token, "abc123");
        assert_eq!(cleaned, "https://app.example.com/dashboard");
    }

    #[test]
    fn test_preserves_other_params_and_fragment() {
        let (token, cleaned) =
            extract_token_param("https://app.example.com/?tab=billing&token=abc#section").unwrap();
        assert_eq!(token, "abc");
        assert_eq!(cleaned, "https://app.example.com/?tab=billing#section");
    }

    #[test]
    fn test_no_token_param_yields_none() {
        assert!(extract_token_param("https://app.example.com/?tab=billing").is_none());
        assert!(extract_token_param("https://app.example.com/").is_none());
    }

    #[test]
    fn test_empty_token_treated_as_absent() {
        assert!(extract_token_param("https://app.example.com/?token=").is_none());
    }

    #[test]
    fn test_url_encoded_token_is_decoded() {
        let (token, _) = extract_token_param("https://a.example.com/?token=a%2Bb").unwrap();
        assert_eq!(token, "a+b");
    }
}
