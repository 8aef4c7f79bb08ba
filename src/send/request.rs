use lettre::Address;

use crate::error::{AppError, Result};
use crate::mail::{Attachment, SenderCredentials};

/// Form fields as they arrive, before validation
#[derive(Debug, Default, Clone)]
pub struct SendForm {
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    pub sender_display_name: Option<String>,
    pub recipients: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub attachment: Option<Attachment>,
}

/// A validated bulk send
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub credentials: SenderCredentials,
    pub display_name: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

/// Split on newlines, trim, drop blanks
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SendForm {
    /// Check every required field at once; `default_display_name` comes from
    /// server configuration.
    pub fn validate(self, default_display_name: Option<&str>) -> Result<SendRequest> {
        let sender_email = present(self.sender_email).map(|e| e.trim().to_string());
        let sender_password = present(self.sender_password);
        // A whitespace-only list is present but yields no recipients
        let recipients = self.recipients.filter(|r| !r.is_empty());
        let subject = present(self.subject);
        let body = present(self.body);

        let mut missing = Vec::new();
        if sender_email.is_none() {
            missing.push("senderEmail");
        }
        if sender_password.is_none() {
            missing.push("senderPassword");
        }
        if recipients.is_none() {
            missing.push("recipients");
        }
        if subject.is_none() {
            missing.push("subject");
        }
        if body.is_none() {
            missing.push("body");
        }

        let (Some(email), Some(password), Some(recipients), Some(subject), Some(body)) =
            (sender_email, sender_password, recipients, subject, body)
        else {
            return Err(AppError::Validation { missing });
        };

        email
            .parse::<Address>()
            .map_err(|e| AppError::BadRequest(format!("Invalid sender email address: {}", e)))?;

        let recipients = parse_recipients(&recipients);
        if recipients.is_empty() {
            return Err(AppError::NoRecipients);
        }

        let display_name = present(self.sender_display_name)
            .map(|n| n.trim().to_string())
            .or_else(|| default_display_name.map(str::to_string))
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(SendRequest {
            credentials: SenderCredentials { email, password },
            display_name,
            recipients,
            subject,
            body,
            attachment: self.attachment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn form() -> SendForm {
        SendForm {
            sender_email: Some("alice@example.com".to_string()),
            sender_password: Some("pw".to_string()),
            sender_display_name: None,
            recipients: Some("a@x.com\nb@x.com".to_string()),
            subject: Some("Hi".to_string()),
            body: Some("Hello".to_string()),
            attachment: None,
        }
    }

    #[test]
    fn test_recipients_trimmed_and_blank_lines_dropped() {
        assert_eq!(
            parse_recipients("a@x.com\n\n b@x.com \n"),
            vec!["a@x.com".to_string(), "b@x.com".to_string()]
        );
        assert_eq!(parse_recipients("a@x.com\r\nb@x.com"), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_all_missing_fields_reported() {
        let mut f = form();
        f.sender_password = None;
        f.subject = Some("   ".to_string());
        f.body = Some(String::new());
        match f.validate(None) {
            Err(AppError::Validation { missing }) => {
                assert_eq!(missing, vec!["senderPassword", "subject", "body"]);
            }
            other => panic!("expected validation error, got {:?}", other.map(|r| r.recipients)),
        }
    }

    #[test]
    fn test_only_blank_recipients() {
        let mut f = form();
        f.recipients = Some("\n \n".to_string());
        assert!(matches!(f.validate(None), Err(AppError::NoRecipients)));

        let mut f = form();
        f.recipients = Some(String::new());
        assert!(matches!(f.validate(None), Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_invalid_sender_address() {
        let mut f = form();
        f.sender_email = Some("not an address".to_string());
        assert!(matches!(f.validate(None), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_display_name_precedence() {
        let request = form().validate(None).unwrap();
        assert_eq!(request.display_name, "alice");

        let request = form().validate(Some("Ops Team")).unwrap();
        assert_eq!(request.display_name, "Ops Team");

        let mut f = form();
        f.sender_display_name = Some(" Alice Liddell ".to_string());
        let request = f.validate(Some("Ops Team")).unwrap();
        assert_eq!(request.display_name, "Alice Liddell");
    }
}
