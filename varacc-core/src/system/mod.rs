pub mod paths;

pub use paths::{
    default_config_path, generate_utc_timestamp, legacy_store_dir, live_store_dir, varacc_home,
};
