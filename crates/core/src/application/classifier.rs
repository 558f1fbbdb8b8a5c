// Request Classifier - validation and parsing of raw user input

use regex::Regex;
use tracing::{debug, error, warn};

use crate::application::constants::REQUEST_PATTERN_KEY;
use crate::domain::{ClassifiedRequest, RequestStatus, SessionId, TAG_MARKER};
use crate::port::ConfigSource;

/// Validates raw input against the configured pattern, then parses it.
///
/// A missing, empty or uncompilable pattern rejects every input.
pub struct RequestClassifier {
    pattern_source: String,
    pattern: Option<Regex>,
}

impl RequestClassifier {
    pub fn new(pattern: Option<&str>) -> Self {
        let pattern_source = pattern.unwrap_or_default().trim().to_string();

        let pattern = if pattern_source.is_empty() {
            error!("Request pattern is not configured, every request will be rejected");
            None
        } else {
            // Full-match semantics
            match Regex::new(&format!("^(?:{})$", pattern_source)) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    error!(pattern = %pattern_source, error = %e, "Invalid request pattern, every request will be rejected");
                    None
                }
            }
        };

        Self {
            pattern_source,
            pattern,
        }
    }

    /// Build from `global.request.pattern`
    pub fn from_config(config: &dyn ConfigSource) -> Self {
        Self::new(config.get_property(REQUEST_PATTERN_KEY).as_deref())
    }

    /// The configured pattern, as shown to callers in error messages
    pub fn pattern(&self) -> &str {
        &self.pattern_source
    }

    /// Whole-input full match (`%lang body`, not just the body)
    pub fn validate(&self, raw_code: &str) -> bool {
        if raw_code.is_empty() {
            return false;
        }
        match &self.pattern {
            Some(regex) => regex.is_match(raw_code),
            None => false,
        }
    }

    /// Validate then parse; `None` when validation fails or the input
    /// cannot be split into language and body
    pub fn classify(&self, raw_code: &str, session_field: Option<&str>) -> Option<ClassifiedRequest> {
        if !self.validate(raw_code) {
            debug!("Request does not match the request pattern");
            return None;
        }
        let request = parse_request(raw_code, session_field);
        if request.status == RequestStatus::WrongSyntax {
            warn!("Request matched the pattern but has no language or body");
            return None;
        }
        Some(request)
    }
}

/// Split `%<language> <body>` and assign the initial status.
///
/// Initial statuses are WRONG_SYNTAX, NO_NEED_FOR_SESSION or GOOD (pending
/// confirmation against the context's sessions).
pub fn parse_request(raw_code: &str, session_field: Option<&str>) -> ClassifiedRequest {
    let mut tokens = raw_code.trim_start().splitn(2, char::is_whitespace);
    let head = tokens.next().unwrap_or_default();
    let body = tokens.next().unwrap_or_default().trim();

    let language = head.replace(TAG_MARKER, "");
    let language = language.trim();

    if language.is_empty() || body.is_empty() {
        return ClassifiedRequest::new(language, body, None, RequestStatus::WrongSyntax);
    }

    let session_id = parse_session_id(session_field);
    let status = if session_id.is_some() {
        RequestStatus::Good
    } else {
        RequestStatus::NoNeedForSession
    };

    ClassifiedRequest::new(language, body, session_id, status)
}

/// Blank means no session; malformed ids degrade to no session
fn parse_session_id(session_field: Option<&str>) -> Option<SessionId> {
    let raw = session_field.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<SessionId>() {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(session_id = %raw, error = %e, "Malformed session id, running without session");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::constants::DEFAULT_REQUEST_PATTERN;
    use crate::port::PropertyMap;

    fn classifier() -> RequestClassifier {
        RequestClassifier::new(Some(DEFAULT_REQUEST_PATTERN))
    }

    #[test]
    fn test_stateless_request() {
        let request = classifier().classify("%python print(1+1)", None).unwrap();
        assert_eq!(request.language, "python");
        assert_eq!(request.code, "print(1+1)");
        assert_eq!(request.session_id, None);
        assert_eq!(request.status, RequestStatus::NoNeedForSession);
    }

    #[test]
    fn test_session_request_is_pending_good() {
        let request = classifier().classify("%python x = 1", Some("156")).unwrap();
        assert_eq!(request.session_id, Some(156));
        assert_eq!(request.status, RequestStatus::Good);
    }

    #[test]
    fn test_body_is_trimmed_and_may_span_lines() {
        let request = classifier()
            .classify("%python   x = 1\nprint(x)  ", None)
            .unwrap();
        assert_eq!(request.code, "x = 1\nprint(x)");
    }

    #[test]
    fn test_rejects_inputs_not_matching_pattern() {
        let c = classifier();
        for raw in [
            "",
            "%python",
            "%python ",
            "python print(1)",
            "%python123 print(1+1)",
            "% print(1)",
            " %python print(1)",
        ] {
            assert!(c.classify(raw, None).is_none(), "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_missing_or_invalid_pattern_fails_closed() {
        assert!(!RequestClassifier::new(None).validate("%python print(1)"));
        assert!(!RequestClassifier::new(Some("")).validate("%python print(1)"));
        assert!(!RequestClassifier::new(Some("   ")).validate("%python print(1)"));
        assert!(!RequestClassifier::new(Some("%[a-z")).validate("%python print(1)"));
    }

    #[test]
    fn test_pattern_from_config() {
        let props = PropertyMap::new().with(REQUEST_PATTERN_KEY, r"%[a-z]+ .+");
        let c = RequestClassifier::from_config(&props);
        assert_eq!(c.pattern(), r"%[a-z]+ .+");
        assert!(c.validate("%shell echo hi"));

        let c = RequestClassifier::from_config(&PropertyMap::new());
        assert!(!c.validate("%shell echo hi"));
    }

    #[test]
    fn test_parse_without_body_is_wrong_syntax() {
        assert_eq!(
            parse_request("%python", None).status,
            RequestStatus::WrongSyntax
        );
        assert_eq!(
            parse_request("%python    ", Some("1")).status,
            RequestStatus::WrongSyntax
        );

        // A permissive pattern lets these through validation, parsing still rejects them
        let c = RequestClassifier::new(Some(".*"));
        assert!(c.classify("%python", None).is_none());
        assert!(c.classify("%python    ", Some("1")).is_none());
        assert!(c.classify("%python  ", None).is_none());
    }

    #[test]
    fn test_malformed_or_blank_session_id_degrades() {
        let request = parse_request("%python x = 1", Some("abc"));
        assert_eq!(request.session_id, None);
        assert_eq!(request.status, RequestStatus::NoNeedForSession);

        let request = parse_request("%python x = 1", Some("  "));
        assert_eq!(request.status, RequestStatus::NoNeedForSession);
    }
}
