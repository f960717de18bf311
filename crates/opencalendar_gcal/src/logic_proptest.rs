#[cfg(test)]
mod tests {
    use crate::logic::{append_attendee, CreateEventRequest, ResponseStatus, SendInviteRequest};
    use google_calendar3::api::{Event, EventAttendee};
    use proptest::prelude::*;

    fn event_with(emails: &[String]) -> Event {
        Event {
            attendees: Some(
                emails
                    .iter()
                    .map(|email| EventAttendee {
                        email: Some(email.clone()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    proptest! {
        #[test]
        fn test_only_the_four_literals_are_accepted(response in "\\PC{0,16}") {
            let request = SendInviteRequest {
                recipient: Some("a@b.com".to_string()),
                response: Some(response.clone()),
            };
            let listed = ResponseStatus::ALL.iter().any(|s| s.as_str() == response);

            match request.validate("evt123") {
                Ok(invite) => {
                    prop_assert!(listed);
                    prop_assert_eq!(invite.response.as_str(), response.as_str());
                }
                Err(err) => {
                    prop_assert!(!listed);
                    prop_assert!(err.to_string().starts_with("response should be one of"));
                }
            }
        }

        #[test]
        fn test_append_grows_list_by_one_and_keeps_existing(
            emails in prop::collection::vec("[a-z]{1,8}@[a-z]{1,8}\\.com", 0..8),
            recipient in "[a-z]{1,8}@[a-z]{1,8}\\.com",
            status_index in 0usize..4,
        ) {
            let status = ResponseStatus::ALL[status_index];
            let mut event = event_with(&emails);

            append_attendee(&mut event, &recipient, status);

            let attendees = event.attendees.unwrap_or_default();
            prop_assert_eq!(attendees.len(), emails.len() + 1);
            for (attendee, email) in attendees.iter().zip(emails.iter()) {
                prop_assert_eq!(attendee.email.as_deref(), Some(email.as_str()));
                prop_assert!(attendee.response_status.is_none());
            }
            let last = &attendees[emails.len()];
            prop_assert_eq!(last.email.as_deref(), Some(recipient.as_str()));
            prop_assert_eq!(last.response_status.as_deref(), Some(status.as_str()));
        }

        #[test]
        fn test_create_without_summary_never_validates(
            location in "[a-zA-Z ]{0,20}",
            description in "[a-zA-Z ]{0,20}",
        ) {
            let request = CreateEventRequest {
                summary: None,
                location: Some(location),
                description: Some(description),
                ..Default::default()
            };
            let err = request.validate().unwrap_err();
            prop_assert!(err.to_string().starts_with("summary is required"));
        }
    }
}
