use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = edital_api::Args::parse();
	edital_api::run(args).await
}
