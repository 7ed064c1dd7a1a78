pub mod create_token;
pub mod verify_token;
