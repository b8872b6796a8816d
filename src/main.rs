fn main() {
    if let Err(err) = carewatch_lib::run() {
        eprintln!("carewatch failed: {err:#}");
        std::process::exit(1);
    }
}
