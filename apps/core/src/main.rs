use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = lumen_core::runtime::Cli::parse();

    if let Err(error) = lumen_core::logging::init() {
        eprintln!("[lumen-core] logging disabled: {error}");
    }

    if let Err(error) = lumen_core::runtime::run(cli).await {
        tracing::error!(%error, "runtime failed");
        eprintln!("[lumen-core] {error}");
        std::process::exit(error.exit_code());
    }
}
