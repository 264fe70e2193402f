//! Credential extraction from intercepted request headers.
//!
//! A credential is two fields of the `Cookie` header: an auth token and an
//! account id. The account id is URL-decoded. Guest and placeholder sessions
//! are rejected so they never overwrite a real account on the panel.

use std::collections::HashMap;

use crate::error::ExtractionError;

/// Minimum accepted auth token length, in characters.
pub const MIN_TOKEN_LEN: usize = 10;

/// Names and sentinels used to read a credential out of a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieFields {
    /// Cookie field holding the auth token.
    pub token_key: String,
    /// Cookie field holding the account id.
    pub account_key: String,
    /// Token prefix marking a placeholder session.
    pub fake_prefix: String,
    /// Account id (case-insensitive) marking a guest session.
    pub guest_account: String,
}

impl Default for CookieFields {
    fn default() -> Self {
        Self {
            token_key: "pt_key".to_string(),
            account_key: "pt_pin".to_string(),
            fake_prefix: "fake_".to_string(),
            guest_account: "guest".to_string(),
        }
    }
}

impl CookieFields {
    /// Use different field names, keeping the default sentinels.
    pub fn named(token_key: impl Into<String>, account_key: impl Into<String>) -> Self {
        Self {
            token_key: token_key.into(),
            account_key: account_key.into(),
            ..Default::default()
        }
    }
}

/// A validated credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub auth_token: String,
    /// URL-decoded account id.
    pub account_id: String,
}

/// A credential together with its canonical cookie string.
///
/// The cookie string (`token=...;account=...;`) is what gets cached and
/// written to the panel, so all comparisons use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub credential: Credential,
    pub cookie: String,
}

/// Look up a header case-insensitively.
///
/// An exact-case match wins over other spellings. Empty values count as
/// absent.
pub fn header_value<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .or_else(|| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Find the first non-empty value of `key` in a `;`-separated cookie string.
pub fn cookie_value<'a>(cookie: &'a str, key: &str) -> Option<&'a str> {
    cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| k.trim() == key && !v.trim().is_empty())
        .map(|(_, v)| v.trim())
}

/// Parses and validates credentials.
#[derive(Debug, Clone, Default)]
pub struct CredentialExtractor {
    fields: CookieFields,
}

impl CredentialExtractor {
    pub fn new(fields: CookieFields) -> Self {
        Self { fields }
    }

    /// The field names in use.
    pub fn fields(&self) -> &CookieFields {
        &self.fields
    }

    /// Extract a credential from request headers.
    pub fn extract(&self, headers: &HashMap<String, String>) -> Result<Captured, ExtractionError> {
        let cookie = header_value(headers, "Cookie").ok_or(ExtractionError::MissingHeader)?;
        self.extract_cookie(cookie)
    }

    /// Extract a credential from a raw cookie string.
    pub fn extract_cookie(&self, cookie: &str) -> Result<Captured, ExtractionError> {
        let fields = &self.fields;

        let (Some(token), Some(raw_account)) = (
            cookie_value(cookie, &fields.token_key),
            cookie_value(cookie, &fields.account_key),
        ) else {
            return Err(ExtractionError::MalformedCookie(format!(
                "{} or {} not found in cookie",
                fields.token_key, fields.account_key
            )));
        };

        let account = decode_account(raw_account).ok_or_else(|| {
            ExtractionError::MalformedCookie(format!("{} is not valid percent-encoding", fields.account_key))
        })?;

        if token.chars().count() < MIN_TOKEN_LEN {
            return Err(ExtractionError::GuestCredential(format!(
                "{} shorter than {} characters",
                fields.token_key, MIN_TOKEN_LEN
            )));
        }

        if !fields.fake_prefix.is_empty() && token.starts_with(&fields.fake_prefix) {
            return Err(ExtractionError::GuestCredential(format!(
                "{} carries placeholder prefix '{}'",
                fields.token_key, fields.fake_prefix
            )));
        }

        if account.to_lowercase() == fields.guest_account.to_lowercase() {
            return Err(ExtractionError::GuestCredential(format!(
                "{} is a guest account",
                fields.account_key
            )));
        }

        let cookie = format!(
            "{}={};{}={};",
            fields.token_key, token, fields.account_key, account
        );

        Ok(Captured {
            credential: Credential {
                auth_token: token.to_string(),
                account_id: account,
            },
            cookie,
        })
    }

    /// Recover the account id embedded in a stored cookie value.
    pub fn account_of(&self, value: &str) -> Option<String> {
        cookie_value(value, &self.fields.account_key).and_then(decode_account)
    }
}

fn decode_account(raw: &str) -> Option<String> {
    urlencoding::decode(raw)
        .ok()
        .map(|s| s.into_owned())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn jd() -> CredentialExtractor {
        CredentialExtractor::default()
    }

    #[test]
    fn test_missing_cookie_header() {
        let err = jd()
            .extract(&headers(&[("User-Agent", "JD4iPhone/1.0")]))
            .unwrap_err();
        assert_eq!(err, ExtractionError::MissingHeader);

        let err = jd().extract(&headers(&[("Cookie", "")])).unwrap_err();
        assert_eq!(err, ExtractionError::MissingHeader);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let h = headers(&[("cookie", "pt_key=AAAAAAAAAAAA;pt_pin=user1;")]);
        assert!(jd().extract(&h).is_ok());

        let h = headers(&[("COOKIE", "pt_key=AAAAAAAAAAAA;pt_pin=user1;")]);
        assert!(jd().extract(&h).is_ok());
    }

    #[test]
    fn test_extracts_and_normalizes() {
        let h = headers(&[(
            "Cookie",
            "whwswswws=abc; pt_key=AAJmZ0123456789; pt_pin=jd_%E4%BA%AC%E4%B8%9C; pwdt_id=x",
        )]);
        let captured = jd().extract(&h).unwrap();
        assert_eq!(captured.credential.auth_token, "AAJmZ0123456789");
        assert_eq!(captured.credential.account_id, "jd_京东");
        assert_eq!(captured.cookie, "pt_key=AAJmZ0123456789;pt_pin=jd_京东;");
    }

    #[test]
    fn test_round_trip_with_named_fields() {
        let extractor = CredentialExtractor::new(CookieFields::named("authToken", "accountId"));
        let captured = extractor
            .extract_cookie("authToken=ABCDEFGHIJ;accountId=user1;")
            .unwrap();
        assert_eq!(
            captured.credential,
            Credential {
                auth_token: "ABCDEFGHIJ".to_string(),
                account_id: "user1".to_string(),
            }
        );
        assert_eq!(captured.cookie, "authToken=ABCDEFGHIJ;accountId=user1;");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        for cookie in ["pt_key=AAAAAAAAAAAA;", "pt_pin=user1;", "pt_key=;pt_pin=user1;", "foo=bar"] {
            let err = jd().extract_cookie(cookie).unwrap_err();
            assert!(
                matches!(err, ExtractionError::MalformedCookie(_)),
                "{} gave {:?}",
                cookie,
                err
            );
        }
    }

    #[test]
    fn test_field_names_must_match_exactly() {
        let err = jd()
            .extract_cookie("xpt_key=AAAAAAAAAAAA;pt_pin=user1;")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedCookie(_)));
    }

    #[test]
    fn test_bad_percent_encoding_is_malformed() {
        let err = jd()
            .extract_cookie("pt_key=AAAAAAAAAAAA;pt_pin=%FF%FE;")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedCookie(_)));
    }

    #[test]
    fn test_short_token_is_guest() {
        for token in ["a", "ABCDEFGHI", "123456789"] {
            let cookie = format!("pt_key={};pt_pin=user1;", token);
            let err = jd().extract_cookie(&cookie).unwrap_err();
            assert!(matches!(err, ExtractionError::GuestCredential(_)));
        }
        assert!(jd().extract_cookie("pt_key=ABCDEFGHIJ;pt_pin=user1;").is_ok());
    }

    #[test]
    fn test_fake_prefix_is_guest() {
        let err = jd()
            .extract_cookie("pt_key=fake_0123456789;pt_pin=user1;")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::GuestCredential(_)));
    }

    #[test]
    fn test_guest_account_is_rejected() {
        for account in ["guest", "Guest", "GUEST"] {
            let cookie = format!("pt_key=AAAAAAAAAAAA;pt_pin={};", account);
            let err = jd().extract_cookie(&cookie).unwrap_err();
            assert!(matches!(err, ExtractionError::GuestCredential(_)));
        }
    }

    #[test]
    fn test_account_of_record_value() {
        assert_eq!(
            jd().account_of("pt_key=AAAAAAAAAAAA;pt_pin=jd_%E4%BA%AC;").as_deref(),
            Some("jd_京")
        );
        assert_eq!(jd().account_of("pt_key=AAAAAAAAAAAA;"), None);
        assert_eq!(jd().account_of(""), None);
    }

    #[test]
    fn test_cookie_value_first_match_wins() {
        assert_eq!(cookie_value("a=1; a=2", "a"), Some("1"));
        assert_eq!(cookie_value("a=; a=2", "a"), Some("2"));
        assert_eq!(cookie_value("a=x=y", "a"), Some("x=y"));
    }
}
