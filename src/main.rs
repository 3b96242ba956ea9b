#[tokio::main]
async fn main() {
    if let Err(e) = wealth_calc::cli::run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
