use std::process;

fn main() {
    if let Err(e) = vartask::cli::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
