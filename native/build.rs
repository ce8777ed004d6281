// Build script for the keychain native module
// Sets up napi linking and the Apple frameworks the keychain calls need

use std::env;

fn main() {
    napi_build::setup();

    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("apple") {
        println!("cargo:rustc-link-lib=framework=Security");
        println!("cargo:rustc-link-lib=framework=CoreFoundation");
    } else {
        println!(
            "cargo:warning=Keychain Services are unavailable on {}; every keychain call will fail",
            target
        );
    }

    println!("cargo:rustc-env=BUILD_TARGET={}", target);
}
