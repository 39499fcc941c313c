fn main() {
    // ESP-IDF build metadata is only meaningful when cross-compiling the
    // firmware binary; host-side lib/test builds skip it.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
