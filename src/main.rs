use anyhow::Result;
use orbit_advisor::{
    server, Advisor, AdvisorConfig, ModelInput, Predictor, RiskModel, ServerConfig, SurrogateModel,
};

fn load_model(cfg: &ServerConfig) -> Result<Box<dyn RiskModel>> {
    #[cfg(feature = "torch")]
    if let (Some(model_path), Some(meta_path)) = (&cfg.model_path, &cfg.meta_path) {
        let m = orbit_advisor::model::TorchModel::new(model_path, meta_path)?;
        return Ok(Box::new(m));
    }

    match &cfg.model_path {
        Some(path) => Ok(Box::new(SurrogateModel::load(path)?)),
        None => {
            tracing::warn!("MODEL_PATH not set; using the built-in surrogate model");
            Ok(Box::new(SurrogateModel::builtin()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = ServerConfig::from_env()?;
    let advisor_cfg = match &cfg.advisor_config {
        Some(path) => AdvisorConfig::load(path)?,
        None => AdvisorConfig::default(),
    };

    let predictor = Predictor::new(load_model(&cfg)?)?;

    // Warmup so a broken model fails at startup, not on the first request
    let warm = ModelInput {
        altitude: 550.0,
        inclination: 97.5,
        congestion: 0.5,
        relative_velocity: 7.45,
    };
    let raw = predictor.predict(&warm)?;
    tracing::info!("warmup forward ok (raw={:.4})", raw);
    tracing::info!("loaded model: {}", predictor.describe());

    let advisor = Advisor::new(predictor, advisor_cfg).with_prediction_log(cfg.log_pred);
    let app = server::router(advisor);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
