pub mod reply;
pub mod requests;

pub use reply::{ProfileReply, ProfileView};
pub use requests::{EditNicknameRequest, EditPasswordRequest, LoginRequest, SignUpRequest};
