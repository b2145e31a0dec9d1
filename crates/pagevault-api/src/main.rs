use pagevault_api::setup;
use pagevault_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Optional .env file; real environment wins
    let config = Config::from_env()?;

    let (state, app) = setup::initialize_app(config).await?;

    setup::server::start_server(&state.config, app).await?;

    Ok(())
}
