use anyhow::Result;
use render_core::GatewaySettings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = GatewaySettings::from_env()?;
    render_gateway::telemetry::init(settings.log_format);

    let addr = settings.bind_addr();
    let ax = render_gateway::build(&settings)?;

    ax.listen(addr, render_gateway::shutdown_signal()).await?;

    tracing::info!("render gateway shut down");
    Ok(())
}
