//! `wext dev`

use wext_config::Command;

use crate::cli::DevArgs;
use crate::config::{ConfigRequest, DevOverrides};
use crate::dev::DevSession;
use crate::error::Result;
use crate::ui;

/// Build, then watch and reload until Ctrl+C.
pub async fn execute(args: DevArgs) -> Result<()> {
    let request = ConfigRequest::new(args.target, Command::Serve)?.with_dev(DevOverrides {
        port: args.port,
        host: args.host,
    });

    let session = DevSession::start(request, !args.no_runner).await?;
    session.run().await?;

    ui::success("Development session stopped");
    Ok(())
}
