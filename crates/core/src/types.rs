use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::validation::ValidationError;

/// A real-estate listing together with the reviews it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub contact: String,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Property {
    /// Appends a review, keeping earlier reviews in submission order.
    pub fn push_review(&mut self, review: Review) {
        self.reviews.push(review);
    }
}

/// Feedback attached to a single property.
///
/// Every field is optional. The rating keeps the exact JSON number the client
/// sent, so an integer rating is echoed back as an integer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Unvalidated property fields as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

impl PropertyDraft {
    /// Checks that every required field is present and non-empty.
    pub fn validate(self) -> Result<NewProperty, ValidationError> {
        let mut missing = Vec::new();
        let title = required(self.title, "title", &mut missing);
        let description = required(self.description, "description", &mut missing);
        let image = required(self.image, "image", &mut missing);
        let contact = required(self.contact, "contact", &mut missing);

        match (title, description, image, contact) {
            (Some(title), Some(description), Some(image), Some(contact)) => Ok(NewProperty {
                title,
                description,
                image,
                contact,
            }),
            _ => Err(ValidationError::IncompleteProperty { missing }),
        }
    }
}

fn required(
    value: Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            missing.push(field);
            None
        }
    }
}

/// Property fields that passed validation and are ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub image: String,
    pub contact: String,
}

impl NewProperty {
    /// Builds the stored document for this listing under the given identifier.
    pub fn into_property(self, id: String) -> Property {
        Property {
            id,
            title: self.title,
            description: self.description,
            image: self.image,
            contact: self.contact,
            reviews: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_draft() -> PropertyDraft {
        PropertyDraft {
            title: Some("Cabin".into()),
            description: Some("Cozy".into()),
            image: Some("img.jpg".into()),
            contact: Some("a@b.com".into()),
        }
    }

    #[test]
    fn complete_draft_validates() {
        let new_property = complete_draft().validate().expect("draft is complete");
        assert_eq!(new_property.title, "Cabin");
        assert_eq!(new_property.contact, "a@b.com");
    }

    #[test]
    fn empty_field_counts_as_missing() {
        let draft = PropertyDraft {
            image: Some(String::new()),
            ..complete_draft()
        };
        let err = draft.validate().expect_err("empty image must be rejected");
        assert_eq!(
            err,
            ValidationError::IncompleteProperty {
                missing: vec!["image"]
            }
        );
    }

    #[test]
    fn reports_every_missing_field() {
        let draft = PropertyDraft {
            title: Some("Cabin".into()),
            ..PropertyDraft::default()
        };
        let err = draft.validate().expect_err("draft is incomplete");
        assert_eq!(
            err,
            ValidationError::IncompleteProperty {
                missing: vec!["description", "image", "contact"]
            }
        );
    }

    #[test]
    fn new_property_starts_without_reviews() {
        let property = complete_draft()
            .validate()
            .expect("draft is complete")
            .into_property("p-1".into());
        assert_eq!(property.id, "p-1");
        assert!(property.reviews.is_empty());
    }

    #[test]
    fn review_omits_absent_fields_and_keeps_integer_rating() {
        let review: Review =
            serde_json::from_value(json!({"user": "Al", "rating": 5})).expect("review parses");
        assert_eq!(
            serde_json::to_value(&review).expect("serialize"),
            json!({"user": "Al", "rating": 5})
        );
    }

    #[test]
    fn push_review_preserves_order() {
        let mut property = complete_draft()
            .validate()
            .expect("draft is complete")
            .into_property("p-1".into());
        property.push_review(Review {
            user: Some("first".into()),
            ..Review::default()
        });
        property.push_review(Review {
            user: Some("second".into()),
            ..Review::default()
        });

        let users: Vec<_> = property
            .reviews
            .iter()
            .map(|review| review.user.as_deref())
            .collect();
        assert_eq!(users, vec![Some("first"), Some("second")]);
    }
}
