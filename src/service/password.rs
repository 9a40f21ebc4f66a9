use crate::error::ProfileError;

/// bcrypt on the blocking pool; hashing at cost 10 takes tens of milliseconds.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ProfileError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, ProfileError> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(ok)
}
