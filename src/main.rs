use cars_server::{config::Config, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::load()?;
	start_server(config).await
}
