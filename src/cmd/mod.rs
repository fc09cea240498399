//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `project` | `Init`           |
//! | `run`     | `Run`            |
//! | `chunk`   | `Chunk`          |
//! | `order`   | `Order`          |
//! | `config`  | `Config`         |

pub mod chunk;
pub mod config;
pub mod order;
pub mod project;
pub mod run;

pub use chunk::cmd_chunk;
pub use config::cmd_config;
pub use order::cmd_order;
pub use project::cmd_init;
pub use run::{RunArgs, cmd_run};
