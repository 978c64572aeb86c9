pub mod ai_service;
pub mod assembly_service;
pub mod feedback_service;
pub mod grading_service;
pub mod quiz_service;
pub mod validation_service;
