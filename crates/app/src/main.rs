mod report;
mod telemetry;

use dbginit_core::{LifetimeManager, SystemInitializer};
use dbginit_util::{load_env_file, AppConfig};
use tracing::{error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = if config.metrics_enabled {
        Some(telemetry::init_metrics()?)
    } else {
        None
    };

    info!(
        stage = "app",
        profile = config.profile.as_str(),
        policy = config.failure_policy.as_str(),
        env = %config.environment.as_str(),
        "starting lifecycle"
    );

    let mut manager = LifetimeManager::new(config.failure_policy);
    let initializers = SystemInitializer::for_profile(config.profile, &config.common);

    let outcome = manager.initialize(initializers);
    let status = match &outcome {
        Ok(startup) => {
            for failure in &startup.failures {
                warn!(stage = "app", tier = failure.tier().as_str(), cause = failure.cause(), "tier unavailable");
            }
            report::StatusReport::new(&config, &manager, startup)
        }
        Err(err) => {
            error!(stage = "app", tier = err.tier().as_str(), cause = err.cause(), "startup failed");
            report::StatusReport::failed(&config, &manager, err)
        }
    };
    println!("{}", status.render(config.environment.is_development())?);

    let terminated = manager.terminate();
    info!(
        stage = "app",
        tiers = ?terminated,
        pristine = manager.context().is_pristine(),
        "shutdown complete"
    );

    if let Some(handle) = metrics {
        print!("{}", telemetry::render_metrics(&handle));
    }

    outcome.map(|_| ()).map_err(|err| err.into())
}
