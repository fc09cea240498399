pub mod autodoc_config;
pub mod chunk;
pub mod config;
pub mod errors;
pub mod factory;
pub mod generate;
pub mod harvest;
pub mod init;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod prompts;
pub mod reduce;
pub mod ui;
pub mod util;
