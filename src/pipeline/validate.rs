//! Required-field validation for the card list.
//!
//! Every call re-checks every field of every card from scratch and writes
//! the result onto the card's [`CardStatus`](crate::card::CardStatus):
//! failing fields become [`FieldStatus::Missing`], passing fields are reset
//! to [`FieldStatus::Valid`]. Running it twice on an unchanged list gives the
//! same marks and the same verdict.
//!
//! Rendering the marks is a separate step: [`issues`] turns them into a flat
//! list of messages the caller can show however it likes.

use crate::card::{Card, CardField, FieldStatus};
use serde::Serialize;
use tracing::debug;

/// Message attached to a missing photo.
pub const IMAGE_REQUIRED: &str = "Image is required";

/// Message attached to an empty text field.
pub const FIELD_REQUIRED: &str = "This field is required";

/// Validate all cards, updating their status marks.
///
/// Returns `true` iff no card has a failing field. An empty list is
/// trivially valid; refusing to export nothing is the export driver's job.
pub fn validate(cards: &mut [Card]) -> bool {
    let mut invalid = 0usize;

    for card in cards.iter_mut() {
        let mut card_ok = true;

        let image = if card.has_image() {
            FieldStatus::Valid
        } else {
            card_ok = false;
            FieldStatus::Missing
        };
        card.status.set(CardField::Image, image);

        for field in CardField::TEXT {
            let filled = card
                .text(field)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            let status = if filled {
                FieldStatus::Valid
            } else {
                card_ok = false;
                FieldStatus::Missing
            };
            card.status.set(field, status);
        }

        if !card_ok {
            invalid += 1;
        }
    }

    debug!("Validated {} cards, {} incomplete", cards.len(), invalid);
    invalid == 0
}

/// Count the cards currently carrying at least one mark.
pub fn invalid_card_count(cards: &[Card]) -> usize {
    cards.iter().filter(|c| !c.status.is_clean()).count()
}

/// A single marked field, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// 1-indexed position of the card in the list.
    pub position: usize,
    pub field: CardField,
    pub message: &'static str,
}

/// The message shown next to a field in the given state, if any.
pub fn message_for(field: CardField, status: FieldStatus) -> Option<&'static str> {
    match (field, status) {
        (_, FieldStatus::Valid) => None,
        (CardField::Image, FieldStatus::Missing) => Some(IMAGE_REQUIRED),
        (_, FieldStatus::Missing) => Some(FIELD_REQUIRED),
    }
}

/// List every marked field from the last validation pass, in card order.
pub fn issues(cards: &[Card]) -> Vec<FieldIssue> {
    let order = [
        CardField::Image,
        CardField::SerialNumber,
        CardField::Location,
        CardField::Comments,
    ];

    cards
        .iter()
        .enumerate()
        .flat_map(|(i, card)| {
            order.into_iter().filter_map(move |field| {
                message_for(field, card.status.get(field)).map(|message| FieldIssue {
                    position: i + 1,
                    field,
                    message,
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardId, EncodedImage};

    fn full_card(id: u64) -> Card {
        let mut card = Card::new(CardId(id));
        card.serial_number = "A1".into();
        card.location = "Room 1".into();
        card.comments = "ok".into();
        card.attach_image(EncodedImage::from_bytes("image/jpeg", &[0xFF, 0xD8, 0xFF]));
        card
    }

    #[test]
    fn fully_valid_list_passes_and_is_clean() {
        let mut cards = vec![full_card(1), full_card(2)];
        assert!(validate(&mut cards));
        assert!(cards.iter().all(|c| c.status.is_clean()));
        assert!(issues(&cards).is_empty());
    }

    #[test]
    fn empty_list_is_valid() {
        let mut cards: Vec<Card> = Vec::new();
        assert!(validate(&mut cards));
    }

    #[test]
    fn marks_exactly_the_failing_fields() {
        let mut cards = vec![full_card(1), full_card(2), full_card(3)];
        cards[1].serial_number = "   ".into();
        cards[2].clear_image();
        cards[2].comments = "\n\t".into();

        assert!(!validate(&mut cards));

        assert!(cards[0].status.is_clean());
        assert!(cards[1].status.serial_number.is_missing());
        assert!(!cards[1].status.location.is_missing());
        assert!(!cards[1].status.comments.is_missing());
        assert!(!cards[1].status.image.is_missing());
        assert!(cards[2].status.image.is_missing());
        assert!(cards[2].status.comments.is_missing());
        assert!(!cards[2].status.serial_number.is_missing());

        let found = issues(&cards);
        assert_eq!(
            found,
            vec![
                FieldIssue {
                    position: 2,
                    field: CardField::SerialNumber,
                    message: FIELD_REQUIRED,
                },
                FieldIssue {
                    position: 3,
                    field: CardField::Image,
                    message: IMAGE_REQUIRED,
                },
                FieldIssue {
                    position: 3,
                    field: CardField::Comments,
                    message: FIELD_REQUIRED,
                },
            ]
        );
        assert_eq!(invalid_card_count(&cards), 2);
    }

    #[test]
    fn fixing_a_field_clears_its_mark() {
        let mut cards = vec![Card::new(CardId(1))];
        assert!(!validate(&mut cards));
        assert!(cards[0].status.image.is_missing());
        assert!(cards[0].status.location.is_missing());

        cards[0] = Card {
            status: cards[0].status,
            ..full_card(1)
        };
        assert!(validate(&mut cards));
        assert!(cards[0].status.is_clean());
    }

    #[test]
    fn validation_is_idempotent() {
        let mut cards = vec![full_card(1), Card::new(CardId(2))];
        cards[0].location.clear();

        let first = validate(&mut cards);
        let marks: Vec<_> = cards.iter().map(|c| c.status).collect();
        let second = validate(&mut cards);
        let marks_again: Vec<_> = cards.iter().map(|c| c.status).collect();

        assert_eq!(first, second);
        assert_eq!(marks, marks_again);
    }

    #[test]
    fn message_for_valid_is_none() {
        assert_eq!(message_for(CardField::Image, FieldStatus::Valid), None);
        assert_eq!(
            message_for(CardField::Location, FieldStatus::Missing),
            Some(FIELD_REQUIRED)
        );
    }
}
