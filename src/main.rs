use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = imgrelay::cli::Cli::parse();
    if let Err(e) = imgrelay::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
