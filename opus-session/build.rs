fn main() {
    println!("cargo:rerun-if-env-changed=OPUS_LIB_DIR");

    match std::env::var("OPUS_LIB_DIR") {
        Ok(dir) => println!("cargo:rustc-link-search=native={}", dir),
        Err(_) => println!("cargo:rustc-link-search=native=/opt/homebrew/lib"),
    }
    println!("cargo:rustc-link-lib=opus");
}
