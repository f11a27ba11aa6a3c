//! HTML form method override.
//!
//! Browsers only submit forms with GET or POST. A POST carrying a `_method`
//! field of `PUT`, `PATCH` or `DELETE` (in the urlencoded body, or else in
//! the query string) is dispatched with that method instead.

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;

use crate::controller::DispatchError;
use crate::dispatcher::Handler;
use crate::http::{HttpRequest, HttpResponse};

/// Form field holding the overriding method.
pub const METHOD_FIELD: &str = "_method";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Middleware rewriting the method of POST form submissions.
pub fn form_method() -> impl Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static {
    |next: Arc<dyn Handler>| -> Arc<dyn Handler> { Arc::new(FormMethod { next }) }
}

struct FormMethod {
    next: Arc<dyn Handler>,
}

impl Handler for FormMethod {
    fn handle(&self, mut request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        if request.method() == Method::POST {
            if let Some(method) = override_method(&request) {
                tracing::debug!(method = %method, path = %request.uri().path(), "Form method override");
                *request.method_mut() = method;
            }
        }
        self.next.handle(request)
    }
}

fn override_method(request: &HttpRequest) -> Option<Method> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(FORM_CONTENT_TYPE));

    let from_body = is_form
        .then(|| field(request.body()))
        .flatten();
    let value = from_body.or_else(|| field(request.uri().query()?.as_bytes()))?;

    match value.to_ascii_uppercase().as_str() {
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        _ => None,
    }
}

fn field(input: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(key, _)| key == METHOD_FIELD)
        .map(|(_, value)| value.into_owned())
}
