use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let store = if env::var_os("CARGO_FEATURE_HDF5_STORE").is_some() {
        "hdf5"
    } else {
        "in-memory only"
    };
    println!("cargo:rustc-env=PROTSCOPE_BUILD_STAMP={stamp}");
    println!("cargo:rustc-env=PROTSCOPE_STORE_BACKEND={store}");
}
