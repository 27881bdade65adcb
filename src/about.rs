//! Version strings for `--version` and debug logs.

pub const PROTSCOPE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PROTSCOPE_BUILD_STAMP: &str = env!("PROTSCOPE_BUILD_STAMP");
pub const PROTSCOPE_STORE_BACKEND: &str = env!("PROTSCOPE_STORE_BACKEND");

/// Long clap version: crate version, build stamp and embedding store backend.
pub const PROTSCOPE_LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (build ",
    env!("PROTSCOPE_BUILD_STAMP"),
    ", embedding store: ",
    env!("PROTSCOPE_STORE_BACKEND"),
    ")"
);

pub fn version_cli_text() -> String {
    format!("protscope {PROTSCOPE_LONG_VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_version_names_backend_and_stamp() {
        let text = version_cli_text();
        assert!(text.starts_with(&format!("protscope {PROTSCOPE_VERSION} (build ")));
        assert!(text.contains(PROTSCOPE_BUILD_STAMP));
        assert_eq!(
            text.contains("embedding store: hdf5"),
            cfg!(feature = "hdf5-store")
        );
    }
}
