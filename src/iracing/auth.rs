use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

/// Hash the password the way the iRacing auth endpoint expects:
/// base64( SHA256( plainPassword + lower(email) ) ).
///
/// When `hashed` is set the password is passed through untouched.
pub fn hash_password(password: &str, email: &str, hashed: bool) -> String {
    if hashed {
        return password.to_owned();
    }

    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(email.to_lowercase().as_bytes());
    STANDARD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::hash_password;

    #[test]
    fn hashes_password_with_lowercased_email() {
        assert_eq!(
            hash_password("MyPassword", "user@example.com", false),
            "h2Zj9H7E1uB4wrZKwsqittrRrvAqOnrdCMehKDnYME4="
        );
        // The email is lowercased before hashing.
        assert_eq!(
            hash_password("MyPassword", "User@Example.COM", false),
            hash_password("MyPassword", "user@example.com", false)
        );
        assert_eq!(
            hash_password("hunter2", "racer@iracing.com", false),
            "BIfzlip3k9DH8Vwzh550OVsameJQyqvSL3iepa09AQE="
        );
    }

    #[test]
    fn prehashed_password_is_passed_through() {
        assert_eq!(
            hash_password("already-hashed", "user@example.com", true),
            "already-hashed"
        );
    }
}
