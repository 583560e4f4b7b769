//! Build script for svmprobe-core
//!
//! Checks the toolchain before compilation.
//!
//! ## Requirements
//!
//! - **Rust**: 1.76.0 or newer (`Result::inspect_err`, let-else)

fn main()
{
    // let-else needs 1.65 and `inspect_err` needs 1.76
    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 76, 0);

        if rustc_version < min_rust_version {
            panic!("svmprobe-core requires Rust {min_rust_version} or newer, found {rustc_version}");
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }
}
