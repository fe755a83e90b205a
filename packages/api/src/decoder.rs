//! Response body decoding
//!
//! [`TextDelegateDecoder`] answers `text/plain` responses itself and hands
//! everything else to another [`Decoder`], by default [`JsonDecoder`].

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use http::Response;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

const TEXT_PLAIN: &[u8] = b"text/plain";

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures turning a response body into a value
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("response body is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("failed to decode JSON response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to decode response body: {0}")]
    Other(#[source] BoxError),
}

impl DecodeError {
    /// Wraps an arbitrary decoder failure.
    pub fn other<E: Into<BoxError>>(e: E) -> Self {
        DecodeError::Other(e.into())
    }
}

/// Turns a buffered HTTP response into a value.
pub trait Decoder {
    type Output;

    /// # Errors
    ///
    /// Returns a `DecodeError` if the body cannot be represented as `Output`.
    fn decode(&self, response: &Response<Bytes>) -> Result<Self::Output, DecodeError>;
}

impl<D: Decoder + ?Sized> Decoder for &D {
    type Output = D::Output;

    fn decode(&self, response: &Response<Bytes>) -> Result<Self::Output, DecodeError> {
        (**self).decode(response)
    }
}

/// Decodes `text/plain` bodies as UTF-8 strings and delegates every other
/// response.
///
/// Only a response carrying exactly one `Content-Type` value, equal to
/// `text/plain`, is handled locally. No header, several values, or any other
/// media type (including `text/plain` with parameters) go to the delegate.
#[derive(Debug, Clone, Default)]
pub struct TextDelegateDecoder<D> {
    delegate: D,
}

impl<D> TextDelegateDecoder<D> {
    pub fn new(delegate: D) -> Self {
        Self { delegate }
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn into_inner(self) -> D {
        self.delegate
    }
}

impl<D> Decoder for TextDelegateDecoder<D>
where
    D: Decoder,
    D::Output: From<String>,
{
    type Output = D::Output;

    fn decode(&self, response: &Response<Bytes>) -> Result<Self::Output, DecodeError> {
        if is_plain_text(response) {
            tracing::trace!("decoding text/plain response body as string");
            let text = String::from_utf8(response.body().to_vec())?;
            return Ok(text.into());
        }

        self.delegate.decode(response)
    }
}

fn is_plain_text<B>(response: &Response<B>) -> bool {
    let mut values = response.headers().get_all(CONTENT_TYPE).iter();
    match (values.next(), values.next()) {
        (Some(value), None) => value.as_bytes() == TEXT_PLAIN,
        _ => false,
    }
}

/// Deserializes the body as JSON.
pub struct JsonDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder")
            .field("output", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> Decoder for JsonDecoder<T> {
    type Output = T;

    fn decode(&self, response: &Response<Bytes>) -> Result<T, DecodeError> {
        Ok(serde_json::from_slice(response.body())?)
    }
}
