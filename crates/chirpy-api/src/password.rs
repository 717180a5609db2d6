use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};

/// Hash with Argon2id. The PHC string is returned as bytes, which is how
/// account records carry it.
pub fn hash_password(plaintext: &str) -> Result<Vec<u8>, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(plaintext.as_bytes(), &salt)?;
    Ok(hash.to_string().into_bytes())
}

/// False for a wrong password and for anything that is not a valid hash.
pub fn verify_password(hash: &[u8], plaintext: &str) -> bool {
    let Ok(encoded) = std::str::from_utf8(hash) else {
        return false;
    };
    let Ok(parsed) = PasswordHash::new(encoded) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
