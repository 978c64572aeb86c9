pub mod question;
pub mod quiz;
pub mod quiz_attempt;
pub mod user_response;
