//! Field-level validation shared by story drafts, patches and registration.

use crate::errors::{DomainError, DomainResult};

pub const MAX_DESCRIPTION_CHARS: usize = 200;
pub const MIN_PASSWORD_CHARS: usize = 6;
pub const DEFAULT_AUTHOR_NAME: &str = "Anonymous";

const YOUTUBE_HOSTS: [&str; 4] = ["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// Trims `value` and fails if nothing is left.
pub fn required(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional value; blank input collapses to `None`.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn description(value: Option<&str>) -> DomainResult<Option<String>> {
    let description = optional(value);
    if let Some(text) = &description {
        if text.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(DomainError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
    }
    Ok(description)
}

pub fn youtube_url(value: Option<&str>) -> DomainResult<Option<String>> {
    let Some(url) = optional(value) else {
        return Ok(None);
    };

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| DomainError::Validation("youtube link must be an http(s) URL".into()))?;
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if !YOUTUBE_HOSTS.contains(&host.as_str()) {
        return Err(DomainError::Validation(
            "youtube link must point to youtube.com or youtu.be".into(),
        ));
    }
    Ok(Some(url))
}

/// Loose `local@domain.tld` shape check; the mailbox itself is never contacted.
pub fn email(value: &str) -> DomainResult<String> {
    let email = value.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(name, tld)| !name.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::Validation("Invalid email address".into()));
    }
    Ok(email)
}

pub fn password(value: &str) -> DomainResult<()> {
    if value.chars().count() < MIN_PASSWORD_CHARS {
        return Err(DomainError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("title", "  Moon  ").unwrap(), "Moon");
        assert!(matches!(required("title", "   "), Err(DomainError::Validation(_))));
    }

    #[test]
    fn description_is_capped() {
        let long = "a".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(description(Some(&long)).is_err());
        assert_eq!(description(Some("  ")).unwrap(), None);
        assert_eq!(description(Some("short")).unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn youtube_hosts_are_checked() {
        assert!(youtube_url(Some("https://www.youtube.com/watch?v=abc")).unwrap().is_some());
        assert!(youtube_url(Some("https://youtu.be/abc")).unwrap().is_some());
        assert!(youtube_url(Some("https://vimeo.com/1")).is_err());
        assert!(youtube_url(Some("youtube.com/watch")).is_err());
        assert_eq!(youtube_url(None).unwrap(), None);
    }

    #[test]
    fn email_shape() {
        assert_eq!(email(" Kid@Example.com ").unwrap(), "kid@example.com");
        assert!(email("nobody").is_err());
        assert!(email("a@b").is_err());
        assert!(email("@example.com").is_err());
    }

    #[test]
    fn password_length() {
        assert!(password("12345").is_err());
        assert!(password("123456").is_ok());
    }
}
