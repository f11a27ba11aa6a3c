//! Values returned by controller operations.
//!
//! An operation returns anything implementing [`IntoOutputs`]; the pipeline
//! sees an ordered list of [`Output`] values and interprets it slot by slot:
//! errors stop the pipeline, text and bytes become the body, integers the
//! status, header maps are merged and streams are copied when no body was
//! given.

use std::fmt;
use std::io::Read;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};

use crate::controller::types::{ActionError, ReturnKind};

/// One returned value.
pub enum Output {
    None,
    Body(Bytes),
    Status(u16),
    Headers(HeaderMap),
    Stream(Stream),
    Error(ActionError),
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::None => f.write_str("None"),
            Output::Body(b) => f.debug_tuple("Body").field(b).finish(),
            Output::Status(s) => f.debug_tuple("Status").field(s).finish(),
            Output::Headers(h) => f.debug_tuple("Headers").field(h).finish(),
            Output::Stream(_) => f.write_str("Stream(..)"),
            Output::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}

/// Byte source copied into the response body.
pub struct Stream(pub Box<dyn Read + Send>);

impl Stream {
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        Stream(Box::new(reader))
    }
}

/// Conversion of an operation's return value into outputs.
pub trait IntoOutputs {
    /// Kinds this type may produce, reported at bind time.
    fn return_kinds() -> Vec<ReturnKind>;

    fn into_outputs(self) -> Vec<Output>;
}

impl IntoOutputs for () {
    fn return_kinds() -> Vec<ReturnKind> {
        Vec::new()
    }

    fn into_outputs(self) -> Vec<Output> {
        Vec::new()
    }
}

impl IntoOutputs for Output {
    fn return_kinds() -> Vec<ReturnKind> {
        vec![ReturnKind::Any]
    }

    fn into_outputs(self) -> Vec<Output> {
        vec![self]
    }
}

impl IntoOutputs for Vec<Output> {
    fn return_kinds() -> Vec<ReturnKind> {
        vec![ReturnKind::Any]
    }

    fn into_outputs(self) -> Vec<Output> {
        self
    }
}

macro_rules! body_output {
    ($($ty:ty => $conv:expr),* $(,)?) => {
        $(
            impl IntoOutputs for $ty {
                fn return_kinds() -> Vec<ReturnKind> {
                    vec![ReturnKind::Body]
                }

                fn into_outputs(self) -> Vec<Output> {
                    let conv: fn($ty) -> Bytes = $conv;
                    vec![Output::Body(conv(self))]
                }
            }
        )*
    };
}

body_output! {
    String => Bytes::from,
    &'static str => |s| Bytes::from_static(s.as_bytes()),
    Vec<u8> => Bytes::from,
    Bytes => |b| b,
}

macro_rules! status_output {
    ($($ty:ty),*) => {
        $(
            impl IntoOutputs for $ty {
                fn return_kinds() -> Vec<ReturnKind> {
                    vec![ReturnKind::Status]
                }

                fn into_outputs(self) -> Vec<Output> {
                    vec![Output::Status(status_code(self as i128))]
                }
            }
        )*
    };
}

status_output!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

fn status_code(value: i128) -> u16 {
    match u16::try_from(value) {
        Ok(code) => code,
        Err(_) => panic!("status code {} is out of range", value),
    }
}

impl IntoOutputs for StatusCode {
    fn return_kinds() -> Vec<ReturnKind> {
        vec![ReturnKind::Status]
    }

    fn into_outputs(self) -> Vec<Output> {
        vec![Output::Status(self.as_u16())]
    }
}

impl IntoOutputs for HeaderMap {
    fn return_kinds() -> Vec<ReturnKind> {
        vec![ReturnKind::Headers]
    }

    fn into_outputs(self) -> Vec<Output> {
        vec![Output::Headers(self)]
    }
}

impl IntoOutputs for Stream {
    fn return_kinds() -> Vec<ReturnKind> {
        vec![ReturnKind::Stream]
    }

    fn into_outputs(self) -> Vec<Output> {
        vec![Output::Stream(self)]
    }
}

impl IntoOutputs for ActionError {
    fn return_kinds() -> Vec<ReturnKind> {
        vec![ReturnKind::Error]
    }

    fn into_outputs(self) -> Vec<Output> {
        vec![Output::Error(self)]
    }
}

/// `None` yields a nil output, which the pipeline ignores.
impl<T: IntoOutputs> IntoOutputs for Option<T> {
    fn return_kinds() -> Vec<ReturnKind> {
        T::return_kinds()
    }

    fn into_outputs(self) -> Vec<Output> {
        match self {
            Some(value) => value.into_outputs(),
            None => vec![Output::None],
        }
    }
}

impl<T, E> IntoOutputs for Result<T, E>
where
    T: IntoOutputs,
    E: Into<ActionError>,
{
    fn return_kinds() -> Vec<ReturnKind> {
        let mut kinds = T::return_kinds();
        kinds.push(ReturnKind::Error);
        kinds
    }

    fn into_outputs(self) -> Vec<Output> {
        match self {
            Ok(value) => value.into_outputs(),
            Err(err) => vec![Output::Error(err.into())],
        }
    }
}

macro_rules! tuple_output {
    ($($ty:ident),+) => {
        impl<$($ty: IntoOutputs),+> IntoOutputs for ($($ty,)+) {
            fn return_kinds() -> Vec<ReturnKind> {
                let mut kinds = Vec::new();
                $(kinds.extend($ty::return_kinds());)+
                kinds
            }

            #[allow(non_snake_case)]
            fn into_outputs(self) -> Vec<Output> {
                let ($($ty,)+) = self;
                let mut outputs = Vec::new();
                $(outputs.extend($ty.into_outputs());)+
                outputs
            }
        }
    };
}

tuple_output!(A);
tuple_output!(A, B);
tuple_output!(A, B, C);
tuple_output!(A, B, C, D);
tuple_output!(A, B, C, D, E);
tuple_output!(A, B, C, D, E, F);
