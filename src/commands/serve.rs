use anyhow::Result;
use scal_core::ScalConfig;

pub async fn run(mut config: ScalConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    scal_server::serve(config).await
}
