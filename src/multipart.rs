//! Opaque multipart form payload.
//!
//! A [`MultipartForm`] is the one piece of configuration the resolver never
//! copies: it is carried behind an `Arc` so that merging and cloning a
//! configuration preserve the payload's identity, and the transport receives
//! the same object the caller built.

use bytes::Bytes;

/// A multipart/form-data payload.
///
/// Deliberately not `Clone`: the form travels by reference (`Arc`) through
/// configuration merges.
#[derive(Debug, Default)]
pub struct MultipartForm {
    parts: Vec<Part>,
}

impl MultipartForm {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::new(name, value.into().into_bytes()));
        self
    }

    /// Append a prepared part.
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// All parts, in append order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True when the form has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// A single field of a multipart form.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// Create a part from raw bytes.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// Set the file name reported for this part.
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the content type of this part.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name, if set.
    pub fn file_name_ref(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Content type, if set.
    pub fn content_type_ref(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Raw payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_building() {
        let form = MultipartForm::new()
            .text("field1", "value1")
            .part(Part::new("file", &b"test content"[..]).file_name("test.txt"));

        assert_eq!(form.len(), 2);
        assert_eq!(form.parts()[0].name(), "field1");
        assert_eq!(form.parts()[1].file_name_ref(), Some("test.txt"));
        assert_eq!(&form.parts()[1].data()[..], b"test content");
    }
}
