pub mod auth;
pub mod password;
pub mod policy;
pub mod ports;
pub mod profile;
pub mod uploads;

pub use auth::AuthService;
pub use policy::AccountRules;
pub use ports::{AccountPolicy, CredentialVerifier, ProfileStore};
pub use profile::{ImageUpload, ProfileWorkflow};
pub use uploads::UploadDir;
