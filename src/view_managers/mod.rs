pub mod quiz_manager;
pub mod setup_manager;

pub(crate) use quiz_manager::QuizManager;
pub(crate) use setup_manager::SetupManager;
