use anyhow::Context as _;

// html5ever and selectors log every parse step at debug level.
const QUIET_DEPENDENCIES: [&str; 3] = ["html5ever=warn", "selectors=warn", "hyper_util=info"];

pub fn init() -> anyhow::Result<()> {
    let mut filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("build log filter")?;
    for directive in QUIET_DEPENDENCIES {
        filter = filter.add_directive(directive.parse().context("parse log directive")?);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
