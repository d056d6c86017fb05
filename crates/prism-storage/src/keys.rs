//! Storage key constants.

/// Storage keys for the persisted credential set.
pub struct StorageKeys;

impl StorageKeys {
    /// Bearer token attached to API requests
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Token exchanged at `/auth/refresh`
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Email of the signed-in user
    pub const USER_EMAIL: &'static str = "user_email";

    /// Display name of the signed-in user
    pub const USER_NAME: &'static str = "user_name";

    /// Every key that makes up one credential set.
    pub const CREDENTIAL_SET: [&'static str; 4] = [
        Self::ACCESS_TOKEN,
        Self::REFRESH_TOKEN,
        Self::USER_EMAIL,
        Self::USER_NAME,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_credential_keys_unique() {
        let unique: HashSet<_> = StorageKeys::CREDENTIAL_SET.iter().collect();
        assert_eq!(unique.len(), StorageKeys::CREDENTIAL_SET.len());
        assert!(StorageKeys::CREDENTIAL_SET.iter().all(|k| !k.is_empty()));
    }
}
