pub mod agent;
pub mod errors;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod registry;
pub mod todoist;
pub mod tools;
