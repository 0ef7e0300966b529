use color_eyre::Result;
use tracing::info;

use crate::{
    http_server::{routes, run_server},
    AppState,
};

pub(crate) async fn serve() -> Result<()> {
    let app_state = AppState::from_env().await?;

    info!(
        git_commit = app_state.versions.git_commit,
        "Starting recipe service"
    );
    run_server(routes::make_router().with_state(app_state)).await?;

    info!("Main Returning");

    Ok(())
}
