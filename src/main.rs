use clap::Parser;
use clientid::{
    cli::{Args, SettingsLoader, execute},
    error::ClientIdError,
};

#[tokio::main]
async fn main() -> Result<(), ClientIdError> {
    env_logger::init();

    let args = Args::parse();

    let settings = SettingsLoader::load(&args)?;

    let exit_code = execute(&args.command, &settings).await?;
    std::process::exit(exit_code);
}
