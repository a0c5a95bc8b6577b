fn main() {
    if let Err(err) = flowgraph_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
