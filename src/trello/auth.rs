use crate::store::ApiCredentials;

/// Query parameters carrying the key/token pair on every request.
pub fn query_params(creds: &ApiCredentials) -> [(&'static str, &str); 2] {
    [("key", creds.api_key.as_str()), ("token", creds.api_token.as_str())]
}

/// Credentials with the secret part masked, for logs.
pub fn redacted(creds: &ApiCredentials) -> String {
    format!("key={} token={}", mask(&creds.api_key), mask(&creds.api_token))
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> ApiCredentials {
        ApiCredentials {
            api_key: "abcdef123456".to_string(),
            api_token: "tok".to_string(),
        }
    }

    #[test]
    fn test_query_params_order() {
        let c = creds();
        assert_eq!(query_params(&c), [("key", "abcdef123456"), ("token", "tok")]);
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let shown = redacted(&creds());
        assert_eq!(shown, "key=abcd**** token=****");
        assert!(!shown.contains("123456"));
    }
}
