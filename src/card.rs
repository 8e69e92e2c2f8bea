//! The inspection card data model.
//!
//! A [`Card`] owns everything that belongs to it: its three text fields,
//! its photo slot and the validation status of each field. Nothing is ever
//! looked up by position or proximity; the validator writes statuses onto
//! the card and the presentation layer reads them back.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a card within one session.
///
/// Ids are handed out in increasing order and never reused, so removing a
/// card does not shift the identity of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the four required inputs of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardField {
    SerialNumber,
    Location,
    Comments,
    Image,
}

impl CardField {
    /// The three free-text fields, in display order.
    pub const TEXT: [CardField; 3] = [
        CardField::SerialNumber,
        CardField::Location,
        CardField::Comments,
    ];

    /// Short label used in the document and in reports.
    pub fn label(self) -> &'static str {
        match self {
            CardField::SerialNumber => "S/N",
            CardField::Location => "Location",
            CardField::Comments => "Comments",
            CardField::Image => "Photo",
        }
    }
}

/// Validation result for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldStatus {
    /// Satisfies its constraint, or has not been checked yet.
    #[default]
    Valid,
    /// Required but empty (or, for the photo, absent).
    Missing,
}

impl FieldStatus {
    pub fn is_missing(self) -> bool {
        self == FieldStatus::Missing
    }
}

/// Per-field validation state carried by every card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardStatus {
    pub serial_number: FieldStatus,
    pub location: FieldStatus,
    pub comments: FieldStatus,
    pub image: FieldStatus,
}

impl CardStatus {
    pub fn get(&self, field: CardField) -> FieldStatus {
        match field {
            CardField::SerialNumber => self.serial_number,
            CardField::Location => self.location,
            CardField::Comments => self.comments,
            CardField::Image => self.image,
        }
    }

    pub fn set(&mut self, field: CardField, status: FieldStatus) {
        match field {
            CardField::SerialNumber => self.serial_number = status,
            CardField::Location => self.location = status,
            CardField::Comments => self.comments = status,
            CardField::Image => self.image = status,
        }
    }

    /// True when no field is marked.
    pub fn is_clean(&self) -> bool {
        [
            CardField::SerialNumber,
            CardField::Location,
            CardField::Comments,
            CardField::Image,
        ]
        .iter()
        .all(|f| !self.get(*f).is_missing())
    }
}

/// A photo in self-describing encoded form: MIME type plus base64 payload.
///
/// Equivalent to a `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub mime_type: String,
    /// Base64 (standard alphabet, padded) image bytes.
    pub data: String,
}

impl EncodedImage {
    /// Wrap raw image bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Parse a `data:` URL. Only base64 payloads are accepted.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        if mime_type.is_empty() {
            return None;
        }
        Some(Self {
            mime_type: mime_type.to_string(),
            data: payload.to_string(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the base64 payload back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// One inspection record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub serial_number: String,
    pub location: String,
    pub comments: String,
    pub image: Option<EncodedImage>,
    /// Validation marks from the most recent validation pass.
    pub status: CardStatus,
}

impl Card {
    /// A fresh, empty card.
    pub fn new(id: CardId) -> Self {
        Self {
            id,
            serial_number: String::new(),
            location: String::new(),
            comments: String::new(),
            image: None,
            status: CardStatus::default(),
        }
    }

    /// Read a text field. Returns `None` for [`CardField::Image`].
    pub fn text(&self, field: CardField) -> Option<&str> {
        match field {
            CardField::SerialNumber => Some(&self.serial_number),
            CardField::Location => Some(&self.location),
            CardField::Comments => Some(&self.comments),
            CardField::Image => None,
        }
    }

    /// Overwrite a text field. Returns `false` for [`CardField::Image`].
    pub fn set_text(&mut self, field: CardField, value: impl Into<String>) -> bool {
        let slot = match field {
            CardField::SerialNumber => &mut self.serial_number,
            CardField::Location => &mut self.location,
            CardField::Comments => &mut self.comments,
            CardField::Image => return false,
        };
        *slot = value.into();
        true
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn attach_image(&mut self, image: EncodedImage) {
        self.image = Some(image);
    }

    pub fn clear_image(&mut self) -> Option<EncodedImage> {
        self.image.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_card_is_empty_and_unmarked() {
        let card = Card::new(CardId(7));
        assert!(card.serial_number.is_empty());
        assert!(!card.has_image());
        assert!(card.status.is_clean());
    }

    #[test]
    fn set_text_rejects_image_field() {
        let mut card = Card::new(CardId(1));
        assert!(card.set_text(CardField::Location, "Room 1"));
        assert!(!card.set_text(CardField::Image, "nope"));
        assert_eq!(card.text(CardField::Location), Some("Room 1"));
        assert_eq!(card.text(CardField::Image), None);
    }

    #[test]
    fn data_url_round_trip() {
        let img = EncodedImage::from_bytes("image/png", b"\x89PNG\r\n");
        let url = img.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        let parsed = EncodedImage::from_data_url(&url).expect("parses");
        assert_eq!(parsed, img);
        assert_eq!(parsed.decode().unwrap(), b"\x89PNG\r\n");
    }

    #[test]
    fn data_url_without_base64_marker_is_rejected() {
        assert!(EncodedImage::from_data_url("data:image/png,abc").is_none());
        assert!(EncodedImage::from_data_url("http://x/y.png").is_none());
        assert!(EncodedImage::from_data_url("data:;base64,abc").is_none());
    }

    #[test]
    fn status_set_and_get() {
        let mut s = CardStatus::default();
        s.set(CardField::Comments, FieldStatus::Missing);
        assert!(s.get(CardField::Comments).is_missing());
        assert!(!s.is_clean());
        s.set(CardField::Comments, FieldStatus::Valid);
        assert!(s.is_clean());
    }
}
