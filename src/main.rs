//! `zcl` CLI binary.
//!
//! This is the minimal entrypoint; all logic lives in `zcl_cli::run()`.

fn main() {
    let exit_code = zcl::cli::run();
    std::process::exit(exit_code.as_i32());
}
