pub mod db;
pub mod import;
pub mod instance;
pub mod question;
pub mod survey;

pub use db::{DbCommands, handle_db_command};
pub use import::{ImportArgs, handle_import_command};
pub use instance::{InstanceCommands, handle_instance_command};
pub use question::{QuestionCommands, handle_question_command};
pub use survey::{SurveyCommands, handle_survey_command};
