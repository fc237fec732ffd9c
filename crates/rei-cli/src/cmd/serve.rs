use rei_server::AppState;
use std::path::Path;

pub fn run(
    root: &Path,
    port: Option<u16>,
    bind: Option<String>,
    memory_log: bool,
) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let root = root.to_path_buf();

    rt.block_on(async move {
        let state = AppState::open(root, memory_log)?;
        let port = port.unwrap_or(state.config.server.port);
        let bind = bind.unwrap_or_else(|| state.config.server.bind.clone());
        rei_server::serve(state, &bind, port).await
    })
}
