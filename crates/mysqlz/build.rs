fn main() {
    for (var, key) in [
        ("TARGET", "MYSQLZ_BUILD_TARGET"),
        ("PROFILE", "MYSQLZ_BUILD_PROFILE"),
    ] {
        if let Ok(value) = std::env::var(var) {
            println!("cargo:rustc-env={key}={value}");
        }
        println!("cargo:rerun-if-env-changed={var}");
    }
}
