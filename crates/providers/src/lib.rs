pub mod config_file;
pub mod newsapi;
pub mod openai;
pub mod research;

pub use research::{LiveResearch, Research, ResearchError};
