mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rscrobbler::config::load_dotenv();
    env_logger::init();

    cli::run().await?;
    Ok(())
}
