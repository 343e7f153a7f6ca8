use portfolio_models::{
    contact::{
        ContactMessageAuthorName, ContactMessageContent, ContactMessageDraft, ContactMessageField,
        ContactValidationViolation, NewContactMessage,
    },
    email_address::EmailAddress,
};

/// A predicate on the trimmed field value and the message reported if it
/// does not hold.
type Rule = (fn(&str) -> bool, &'static str);

struct FieldRules<T> {
    field: ContactMessageField,
    rules: &'static [Rule],
    build: fn(&str) -> Option<T>,
}

const NAME: FieldRules<ContactMessageAuthorName> = FieldRules {
    field: ContactMessageField::Name,
    rules: &[
        (|s| !s.is_empty(), "Name is required"),
        (
            |s| {
                (ContactMessageAuthorName::MIN_LENGTH..=ContactMessageAuthorName::MAX_LENGTH)
                    .contains(&s.chars().count())
            },
            "Name must be between 2 and 50 characters",
        ),
    ],
    build: |s| ContactMessageAuthorName::try_from(s).ok(),
};

const EMAIL: FieldRules<EmailAddress> = FieldRules {
    field: ContactMessageField::Email,
    rules: &[(
        |s| s.parse::<EmailAddress>().is_ok(),
        "Please provide a valid email",
    )],
    build: |s| s.parse().ok(),
};

const MESSAGE: FieldRules<ContactMessageContent> = FieldRules {
    field: ContactMessageField::Message,
    rules: &[
        (|s| !s.is_empty(), "Message is required"),
        (
            |s| {
                (ContactMessageContent::MIN_LENGTH..=ContactMessageContent::MAX_LENGTH)
                    .contains(&s.chars().count())
            },
            "Message must be between 10 and 1000 characters",
        ),
    ],
    build: |s| ContactMessageContent::try_from(s).ok(),
};

impl<T> FieldRules<T> {
    /// Apply all rules to `value` and construct the field if none of them
    /// failed.
    fn apply(
        &self,
        value: Option<String>,
        violations: &mut Vec<ContactValidationViolation>,
    ) -> Option<T> {
        let value = value.unwrap_or_default();
        let value = value.trim();

        let before = violations.len();
        violations.extend(
            self.rules
                .iter()
                .filter(|(check, _)| !check(value))
                .map(|&(_, message)| ContactValidationViolation {
                    field: self.field,
                    message,
                }),
        );
        if violations.len() > before {
            return None;
        }

        let result = (self.build)(value);
        if result.is_none() {
            if let Some(&(_, message)) = self.rules.last() {
                violations.push(ContactValidationViolation {
                    field: self.field,
                    message,
                });
            }
        }
        result
    }
}

/// Validate and normalize a contact form submission.
///
/// All violated rules are reported, in field order.
pub fn validate(draft: ContactMessageDraft) -> Result<NewContactMessage, Vec<ContactValidationViolation>> {
    let mut violations = Vec::new();

    let name = NAME.apply(draft.name, &mut violations);
    let email = EMAIL.apply(draft.email, &mut violations);
    let message = MESSAGE.apply(draft.message, &mut violations);

    match (name, email, message) {
        (Some(name), Some(email), Some(message)) => Ok(NewContactMessage {
            name,
            email,
            message,
        }),
        _ => Err(violations),
    }
}
