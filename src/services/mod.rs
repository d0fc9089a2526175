pub mod ai_service;
pub mod audit_service;
pub mod grading_service;
pub mod prompt_service;
pub mod quiz_service;
