// ── Error classifier ──
//
// Collapses any error into one of five semantic kinds. The structured
// status code wins when the error carries one; otherwise the rendered
// message is searched for a status code or a well-known phrase.

use std::fmt;

use strum::{Display, EnumString, IntoStaticStr, VariantNames};
use tmc_api::{HttpStatusCode, StatusCode};

/// Semantic classification of a failed control plane call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, VariantNames,
)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Conflict,
    PreconditionFailed,
    Unknown,
}

impl ErrorKind {
    /// Map an HTTP status to its kind. Total: unrecognized codes are `Unknown`.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::CONFLICT => Self::Conflict,
            StatusCode::PRECONDITION_FAILED => Self::PreconditionFailed,
            _ => Self::Unknown,
        }
    }

    /// Best-effort classification of a rendered error message.
    ///
    /// The first standalone three-digit token that names a known status
    /// decides; failing that, a handful of phrases the control plane and
    /// gateways use are matched case-insensitively.
    pub fn from_message(message: &str) -> Self {
        let by_code = message
            .split(|c: char| !c.is_ascii_digit())
            .filter(|token| token.len() == 3)
            .filter_map(|token| token.parse::<u16>().ok())
            .filter_map(|code| StatusCode::from_u16(code).ok())
            .map(Self::from_status)
            .find(|kind| *kind != Self::Unknown);
        if let Some(kind) = by_code {
            return kind;
        }

        let lower = message.to_ascii_lowercase();
        if lower.contains("not found") || lower.contains("notfound") {
            Self::NotFound
        } else if lower.contains("unauthorized") || lower.contains("unauthenticated") {
            Self::Unauthorized
        } else if lower.contains("precondition failed") {
            Self::PreconditionFailed
        } else if lower.contains("conflict") || lower.contains("already exists") {
            Self::Conflict
        } else {
            Self::Unknown
        }
    }

    pub fn is_not_found(self) -> bool {
        self == Self::NotFound
    }
}

/// Classify `err` by its structured status code, falling back to its message.
pub fn classify_by_status<E>(err: &E) -> ErrorKind
where
    E: HttpStatusCode + fmt::Display + ?Sized,
{
    match err.status_code() {
        Some(status) => ErrorKind::from_status(status),
        None => ErrorKind::from_message(&err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Plain(&'static str);

    impl fmt::Display for Plain {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl HttpStatusCode for Plain {
        fn status_code(&self) -> Option<StatusCode> {
            None
        }
    }

    fn api(status: u16, message: &str) -> tmc_api::Error {
        tmc_api::Error::Api {
            status,
            message: message.into(),
            code: None,
        }
    }

    #[test]
    fn structured_status_wins() {
        assert_eq!(classify_by_status(&api(404, "conflict")), ErrorKind::NotFound);
        assert_eq!(classify_by_status(&api(401, "")), ErrorKind::Unauthorized);
        assert_eq!(classify_by_status(&api(409, "")), ErrorKind::Conflict);
        assert_eq!(classify_by_status(&api(412, "")), ErrorKind::PreconditionFailed);
        assert_eq!(classify_by_status(&api(500, "not found")), ErrorKind::Unknown);
    }

    #[test]
    fn falls_back_to_message_code() {
        let err = Plain("request failed: status 404 returned by gateway");
        assert_eq!(classify_by_status(&err), ErrorKind::NotFound);

        // 4040 is not a status token; 412 is.
        let err = Plain("error 4040 then 412");
        assert_eq!(classify_by_status(&err), ErrorKind::PreconditionFailed);
    }

    #[test]
    fn falls_back_to_message_phrase() {
        assert_eq!(
            classify_by_status(&Plain("cluster group \"g1\" Not Found")),
            ErrorKind::NotFound
        );
        assert_eq!(
            classify_by_status(&Plain("resource already exists")),
            ErrorKind::Conflict
        );
        assert_eq!(
            classify_by_status(&Plain("UNAUTHENTICATED: token expired")),
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn classification_is_total() {
        for message in ["", "   ", "500", "999", "no digits here", "\u{1F600} 12 1234"] {
            assert_eq!(classify_by_status(&Plain(message)), ErrorKind::Unknown, "{message:?}");
        }
    }

    #[test]
    fn kinds_render_snake_case() {
        assert_eq!(ErrorKind::PreconditionFailed.to_string(), "precondition_failed");
        assert_eq!(ErrorKind::VARIANTS.len(), 5);
    }
}
