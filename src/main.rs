use anyhow::Context;
use coupon_app::modules;
use coupon_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load coupon service settings")?;
    coupon_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        addr = %settings.bind_addr(),
        "coupon-app bootstrap starting"
    );

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = coupon_http::start_server(&registry, &settings, coupon_http::shutdown_signal()).await;

    registry.stop_modules().await?;
    served?;

    tracing::info!("coupon-app shutdown complete");
    Ok(())
}
