use anyhow::Result;

use scal_core::ScalConfig;

#[tokio::main]
async fn main() -> Result<()> {
    scal_server::init_tracing();

    let config = ScalConfig::load(None)?;
    scal_server::serve(config).await
}
