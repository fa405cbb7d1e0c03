use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;

/// Build a typed configuration from an optional file plus environment.
///
/// Sources, lowest precedence first: `defaults`, `<file_name>.{toml,yaml,json}`
/// if present, then `<PREFIX>__SECTION__KEY` environment variables. A `.env`
/// file is loaded into the process environment beforehand.
pub fn load_layered<T: DeserializeOwned>(
    file_name: &str,
    env_prefix: &str,
    defaults: &[(&str, &str)],
) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let mut builder = Cfg::builder();
    for (key, value) in defaults {
        builder = builder.set_default(*key, *value)?;
    }

    let config = builder
        .add_source(File::with_name(file_name).required(false))
        .add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
