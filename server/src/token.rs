/// Raised before any network call when neither a user-granted nor a
/// configured fallback credential is available.
#[derive(Debug, thiserror::Error)]
#[error("no github credential available")]
pub struct NoCredential;

/// Picks the effective credential for a sync: the user-granted token when
/// present, otherwise the configured fallback. A distinct fallback is kept
/// around so a failing primary can be retried exactly once against it.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    primary: String,
    fallback: Option<String>,
}

impl TokenResolver {
    pub fn new(
        user_token: Option<&str>,
        configured_fallback: Option<&str>,
    ) -> Result<Self, NoCredential> {
        let user = user_token.filter(|token| !token.is_empty());
        let configured = configured_fallback.filter(|token| !token.is_empty());

        match (user, configured) {
            (Some(user), Some(fallback)) if user != fallback => Ok(Self {
                primary: user.to_string(),
                fallback: Some(fallback.to_string()),
            }),
            (Some(user), _) => Ok(Self {
                primary: user.to_string(),
                fallback: None,
            }),
            (None, Some(fallback)) => Ok(Self {
                primary: fallback.to_string(),
                fallback: None,
            }),
            (None, None) => Err(NoCredential),
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// The retry credential, present only when distinct from the primary.
    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_token_wins_and_keeps_distinct_fallback() {
        let resolver = TokenResolver::new(Some("user"), Some("env")).unwrap();
        assert_eq!(resolver.primary(), "user");
        assert_eq!(resolver.fallback(), Some("env"));
    }

    #[test]
    fn identical_fallback_is_dropped() {
        let resolver = TokenResolver::new(Some("same"), Some("same")).unwrap();
        assert_eq!(resolver.primary(), "same");
        assert_eq!(resolver.fallback(), None);
    }

    #[test]
    fn missing_user_token_promotes_the_fallback() {
        let resolver = TokenResolver::new(None, Some("env")).unwrap();
        assert_eq!(resolver.primary(), "env");
        assert_eq!(resolver.fallback(), None);
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let resolver = TokenResolver::new(Some(""), Some("env")).unwrap();
        assert_eq!(resolver.primary(), "env");

        assert!(TokenResolver::new(Some(""), Some("")).is_err());
        assert!(TokenResolver::new(None, None).is_err());
    }
}
