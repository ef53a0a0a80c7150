//! Registrations and registrant naming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventposter_core::{AccountId, DomainError, DomainResult, EventId, RegistrationId};

/// A seat held at an event, optionally tied to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    #[serde(rename = "user_id")]
    pub account_id: Option<AccountId>,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Reject `caller` unless it is the registrant. Anonymous registrations
    /// have no owner and cannot be changed through an identity.
    pub fn ensure_owned_by(&self, caller: AccountId, action: &str) -> DomainResult<()> {
        if self.account_id == Some(caller) {
            return Ok(());
        }
        Err(DomainError::permission_denied(format!(
            "you don't have permission to {action} this registration"
        )))
    }
}

/// Registration joined with the fields of its event that callers display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationDetails {
    #[serde(flatten)]
    pub registration: Registration,
    pub event_title: String,
    pub event_description: Option<String>,
    pub event_location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub event_id: Option<EventId>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl RegistrationRequest {
    pub fn for_event(event_id: EventId) -> Self {
        Self {
            event_id: Some(event_id),
            ..Self::default()
        }
    }

    pub fn with_names(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// Shape check; yields the referenced event.
    pub fn validate(&self) -> DomainResult<EventId> {
        self.event_id
            .ok_or_else(|| DomainError::validation("event ID is required"))
    }

    fn supplied_first(&self) -> Option<&str> {
        non_blank(self.first_name.as_deref())
    }

    fn supplied_last(&self) -> Option<&str> {
        non_blank(self.last_name.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// First and last name recorded on a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrantName {
    pub first: String,
    pub last: String,
}

impl RegistrantName {
    /// Split a display name on its first whitespace run.
    ///
    /// With no whitespace the whole name is used for both parts.
    pub fn from_display_name(display_name: &str) -> Self {
        let name = display_name.trim();
        match name.split_once(char::is_whitespace) {
            Some((first, rest)) => Self {
                first: first.to_string(),
                last: rest.trim_start().to_string(),
            },
            None => Self {
                first: name.to_string(),
                last: name.to_string(),
            },
        }
    }

    /// Names for a new registration.
    ///
    /// An authenticated registrant is named after its display name; an
    /// anonymous one must supply both names in the request.
    pub fn for_new_registration(
        display_name: Option<&str>,
        request: &RegistrationRequest,
    ) -> DomainResult<Self> {
        if let Some(display_name) = display_name {
            return Ok(Self::from_display_name(display_name));
        }

        let first = request
            .supplied_first()
            .ok_or_else(|| DomainError::validation("first name is required"))?;
        let last = request
            .supplied_last()
            .ok_or_else(|| DomainError::validation("last name is required"))?;
        Ok(Self {
            first: first.to_string(),
            last: last.to_string(),
        })
    }

    /// Names after an edit: request values where given, current ones otherwise.
    pub fn for_update(current: &Registration, request: &RegistrationRequest) -> Self {
        Self {
            first: request
                .supplied_first()
                .unwrap_or(current.first_name.as_str())
                .to_string(),
            last: request
                .supplied_last()
                .unwrap_or(current.last_name.as_str())
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registration(account_id: Option<AccountId>) -> Registration {
        Registration {
            id: RegistrationId::new(),
            event_id: EventId::new(),
            account_id,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn display_name_splits_on_first_whitespace() {
        let name = RegistrantName::from_display_name("Ada King Lovelace");
        assert_eq!(name.first, "Ada");
        assert_eq!(name.last, "King Lovelace");
    }

    #[test]
    fn single_word_name_fills_both_parts() {
        let name = RegistrantName::from_display_name("ada");
        assert_eq!(name.first, "ada");
        assert_eq!(name.last, "ada");
    }

    #[test]
    fn missing_event_reference_is_rejected() {
        let req = RegistrationRequest::default();
        assert_eq!(
            req.validate(),
            Err(DomainError::validation("event ID is required"))
        );
    }

    #[test]
    fn authenticated_registrant_ignores_request_names() {
        let req = RegistrationRequest::for_event(EventId::new()).with_names("X", "Y");
        let name = RegistrantName::for_new_registration(Some("grace hopper"), &req).unwrap();
        assert_eq!(name.first, "grace");
        assert_eq!(name.last, "hopper");
    }

    #[test]
    fn anonymous_registrant_must_supply_names() {
        let req = RegistrationRequest::for_event(EventId::new());
        assert_eq!(
            RegistrantName::for_new_registration(None, &req),
            Err(DomainError::validation("first name is required"))
        );

        let req = RegistrationRequest::for_event(EventId::new()).with_names("Ada", " ");
        assert_eq!(
            RegistrantName::for_new_registration(None, &req),
            Err(DomainError::validation("last name is required"))
        );

        let req = RegistrationRequest::for_event(EventId::new()).with_names("Ada", "Lovelace");
        let name = RegistrantName::for_new_registration(None, &req).unwrap();
        assert_eq!(name.first, "Ada");
        assert_eq!(name.last, "Lovelace");
    }

    #[test]
    fn update_keeps_names_not_supplied() {
        let current = registration(Some(AccountId::new()));
        let mut req = RegistrationRequest::for_event(current.event_id);
        req.last_name = Some("Byron".to_string());

        let name = RegistrantName::for_update(&current, &req);
        assert_eq!(name.first, "Ada");
        assert_eq!(name.last, "Byron");
    }

    #[test]
    fn only_registrant_owns_registration() {
        let owner = AccountId::new();
        assert!(registration(Some(owner)).ensure_owned_by(owner, "update").is_ok());
        assert_eq!(
            registration(Some(owner)).ensure_owned_by(AccountId::new(), "delete"),
            Err(DomainError::permission_denied(
                "you don't have permission to delete this registration"
            ))
        );
        assert!(registration(None).ensure_owned_by(owner, "update").is_err());
    }

    #[test]
    fn request_deserializes_with_optional_names() {
        let id = EventId::new();
        let req: RegistrationRequest =
            serde_json::from_value(serde_json::json!({ "event_id": id.to_string() })).unwrap();
        assert_eq!(req.validate(), Ok(id));
        assert_eq!(req.first_name, None);
    }

    #[test]
    fn registration_serializes_account_as_user_id() {
        let json = serde_json::to_value(registration(None)).unwrap();
        assert!(json["user_id"].is_null());
        assert_eq!(json["first_name"], "Ada");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the first part never contains whitespace, and joining the
        /// parts with a single space reproduces a single-spaced display name.
        #[test]
        fn name_split_round_trips(words in prop::collection::vec("[A-Za-z]{1,8}", 1..5)) {
            let display = words.join(" ");
            let name = RegistrantName::from_display_name(&display);

            prop_assert!(!name.first.chars().any(char::is_whitespace));
            prop_assert_eq!(&name.first, &words[0]);
            if words.len() == 1 {
                prop_assert_eq!(&name.last, &words[0]);
            } else {
                prop_assert_eq!(format!("{} {}", name.first, name.last), display);
            }
        }
    }
}
