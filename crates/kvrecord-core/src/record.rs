//! Record: one submitted challenge and its lifecycle state.
//!
//! Everything except `status` is fixed at creation time.

use std::cmp::Ordering;

use crate::error::CoreError;
use crate::status::Status;
use crate::types::{Owner, RecordId, Score, UnixSeconds};

/// The challenge artifact and the creator's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// The challenge image, typically a `data:` URL.
    pub image_data: String,
    /// Free-text answer supplied by the creator.
    pub answer: String,
}

impl Payload {
    pub fn new(image_data: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            image_data: image_data.into(),
            answer: answer.into(),
        }
    }

    /// Check the payload is acceptable for a new record.
    ///
    /// The image must be present and the answer must contain something
    /// other than whitespace.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.image_data.is_empty() {
            return Err(CoreError::InvalidPayload("image data is empty".into()));
        }
        if self.answer.trim().is_empty() {
            return Err(CoreError::InvalidPayload("answer is blank".into()));
        }
        Ok(())
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub payload: Payload,
    pub created_at: UnixSeconds,
    pub owner: Owner,
    pub status: Status,
    /// Fixed at creation; only meaningful once the record is verified.
    pub score: Score,
}

impl Record {
    /// Build a new `Pending` record.
    pub fn new(
        id: RecordId,
        payload: Payload,
        owner: Owner,
        score: Score,
        created_at: UnixSeconds,
    ) -> Self {
        Self {
            id,
            payload,
            created_at,
            owner,
            status: Status::Pending,
            score,
        }
    }

    pub fn is_owned_by(&self, actor: &Owner) -> bool {
        self.owner.matches(actor)
    }

    /// Whether `actor` may still verify or reject this record.
    pub fn can_transition(&self, actor: &Owner) -> bool {
        self.is_owned_by(actor) && self.status == Status::Pending
    }

    /// Move to `target`, leaving the record untouched on failure.
    pub fn apply_transition(&mut self, target: Status) -> Result<(), CoreError> {
        self.status = self.status.transition(target)?;
        Ok(())
    }

    /// The score, if it should be shown.
    pub fn visible_score(&self) -> Option<Score> {
        (self.status == Status::Verified).then_some(self.score)
    }

    /// Listing order: newest first, ties broken by id ascending.
    pub fn listing_order(a: &Record, b: &Record) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Sort records into listing order in place.
pub fn sort_for_listing(records: &mut [Record]) {
    records.sort_by(Record::listing_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, created_at: i64) -> Record {
        Record::new(
            RecordId::new(id).unwrap(),
            Payload::new("data:image/png;base64,AAAA", "a red circle"),
            Owner::new("0xAA").unwrap(),
            Score::new(50).unwrap(),
            created_at,
        )
    }

    #[test]
    fn test_new_record_is_pending() {
        let r = record("1-a", 10);
        assert_eq!(r.status, Status::Pending);
        assert_eq!(r.visible_score(), None);
    }

    #[test]
    fn test_payload_validation() {
        assert!(Payload::new("img", "answer").validate().is_ok());
        assert!(Payload::new("img", "   \n").validate().is_err());
        assert!(Payload::new("", "answer").validate().is_err());
    }

    #[test]
    fn test_apply_transition() {
        let mut r = record("1-a", 10);
        r.apply_transition(Status::Verified).unwrap();
        assert_eq!(r.status, Status::Verified);
        assert_eq!(r.visible_score(), Some(Score::new(50).unwrap()));

        let err = r.apply_transition(Status::Rejected).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: Status::Verified,
                to: Status::Rejected
            }
        );
        assert_eq!(r.status, Status::Verified);
    }

    #[test]
    fn test_can_transition() {
        let mut r = record("1-a", 10);
        let owner = Owner::new("0xaa").unwrap();
        let stranger = Owner::new("0xBB").unwrap();

        assert!(r.can_transition(&owner));
        assert!(!r.can_transition(&stranger));

        r.apply_transition(Status::Rejected).unwrap();
        assert!(!r.can_transition(&owner));
    }

    #[test]
    fn test_listing_order() {
        let mut records = vec![record("b", 10), record("c", 20), record("a", 10)];
        sort_for_listing(&mut records);

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
