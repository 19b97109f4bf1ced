use reqwest::StatusCode;

/// Errors that may carry the HTTP status of the response that produced them.
pub trait HttpStatusCode {
    fn status_code(&self) -> Option<StatusCode>;

    fn is_status_code(&self, status_code: StatusCode) -> bool {
        self.status_code()
            .is_some_and(|some| some == status_code)
    }
}

impl<T, E> HttpStatusCode for Result<T, E>
where
    E: HttpStatusCode,
{
    fn status_code(&self) -> Option<StatusCode> {
        self.as_ref().err().and_then(HttpStatusCode::status_code)
    }
}
