//! CLI command implementations

mod config;
mod ports;
mod state;
mod watch;

pub use config::{
    config_get, config_init, config_init_project, config_path, config_set, config_show,
    load_board_config, resolve_config_path,
};
pub use ports::ports_command;
pub use state::{state_clear, state_list};
pub use watch::watch_command;
