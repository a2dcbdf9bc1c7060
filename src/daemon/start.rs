use crate::config::Config;
use crate::container::LifecycleHandle;
use crate::engine::Engine;

pub fn print_banner(config: &Config) {
    let ascii_art = format!(
        r#"
                 __                      __        __
   ____ ___  ___/ /__ ___ _____  ___ ___/ /  ___  / /
  / __ `__ \/ __/ / _ `/ // / _ \/ __/ _ \/ _ \/ _  /
 / / / / / / /_/ /\_,_/\_,_/_//_/\__/_//_/\___/\_,_/
/_/ /_/ /_/\__/_/

mclaunchd v{}
container: {} ({})
"#,
        config.get_version(),
        config.minecraft.container_name,
        config.minecraft.image,
    );

    println!("{}", ascii_art);
}

/// Ping the engine once. An unreachable engine is only a warning: every
/// command reports its own connectivity error later.
pub async fn ping_engine(engine: &dyn Engine) -> bool {
    match engine.ping().await {
        Ok(()) => {
            tracing::info!("Container engine accessible");
            true
        }
        Err(e) => {
            tracing::warn!("Container engine not accessible yet: {}", e);
            false
        }
    }
}

/// Pick up a server that was left running by a previous daemon run.
pub async fn adopt_running(lifecycle: &LifecycleHandle) {
    match lifecycle.adopt_running().await {
        Ok(true) => tracing::info!("Server container already running, console attached"),
        Ok(false) => tracing::debug!("No running server container to adopt"),
        Err(e) => tracing::warn!("Could not check for a running server container: {}", e),
    }
}
