fn main() {
    if let Err(e) = thumbnail_cache::run() {
        eprintln!("thumbcache: {:#}", e);
        std::process::exit(1);
    }
}
