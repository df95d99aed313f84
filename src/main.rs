//! Conductor CLI entry point

fn main() {
    conductor::cli::init_tracing();
    conductor::cli::run();
}
