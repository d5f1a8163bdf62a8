use clap::Parser;
use minitwit::Settings;
use minitwit::layers::ErrorLayer;

#[tokio::main]
async fn main() -> Result<(), color_eyre::eyre::Report> {
    ErrorLayer.setup()?;
    let settings = Settings::parse();
    tracing::debug!(
        socket_addr = %settings.socket_addr,
        database_url = settings.database_url,
        "Starting MiniTwit"
    );
    minitwit::run(settings).await
}
