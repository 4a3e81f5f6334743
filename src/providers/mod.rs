pub mod remote_store;
pub mod util;
