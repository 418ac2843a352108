use anyhow::Result;
use bytes::Bytes;

pub trait FromBody: Sized {
    fn from_data(data: Bytes) -> Result<Self>;
}

pub trait IntoBody: Sized {
    fn into_body(self) -> Result<Bytes>;

    #[allow(unused_variables)]
    fn extend_response_parts(&self, parts: &mut http::response::Parts) {}
}

impl FromBody for Bytes {
    fn from_data(data: Bytes) -> Result<Self> {
        Ok(data)
    }
}

impl IntoBody for Bytes {
    fn into_body(self) -> Result<Bytes> {
        Ok(self)
    }
}

// Data types

#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: serde::de::DeserializeOwned> FromBody for Json<T> {
    /// An empty body reads as JSON `null`, so optional payloads may be omitted.
    fn from_data(bytes: Bytes) -> Result<Self> {
        let data = if bytes.is_empty() {
            serde_json::from_value(serde_json::Value::Null)?
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(Self(data))
    }
}

impl<T: serde::Serialize> IntoBody for Json<T> {
    fn into_body(self) -> Result<Bytes> {
        use bytes::{BufMut, BytesMut};

        let mut buf = BytesMut::with_capacity(512).writer();
        serde_json::to_writer(&mut buf, &self.0)?;
        Ok(buf.into_inner().freeze())
    }

    fn extend_response_parts(&self, parts: &mut http::response::Parts) {
        parts
            .headers
            .entry(http::header::CONTENT_TYPE)
            .or_insert(http::HeaderValue::from_static("application/json"));
    }
}
