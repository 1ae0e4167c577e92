//! Command implementations

mod analyze;
mod classify;
mod corrections;

pub use analyze::cmd_analyze;
pub use classify::cmd_classify;
pub use corrections::{
    cmd_corrections_add, cmd_corrections_list, cmd_corrections_path, cmd_corrections_remove,
    open_store,
};
