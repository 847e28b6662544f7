fn main() {
    if let Err(err) = json_sift::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
