use super::{types::Config, ConfigError};

/// Longest grace period a transient download reference may be kept alive.
const MAX_RELEASE_DELAY_MS: u64 = 10_000;

/// Validate configuration
/// Currently validates:
/// - Extensions look like `.ext` and source differs from target
/// - Encoder quality and bitrate are in range
/// - The download release delay is non-zero and bounded
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (key, ext) in [
        ("intake.source_extension", &config.intake.source_extension),
        ("intake.target_extension", &config.intake.target_extension),
    ] {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "{} must look like \".ext\", got {:?}",
                key, ext
            )));
        }
    }

    if config
        .intake
        .source_extension
        .eq_ignore_ascii_case(&config.intake.target_extension)
    {
        return Err(ConfigError::ValidationError(
            "intake.source_extension and intake.target_extension must differ".to_string(),
        ));
    }

    if config.profile.crf > 51 {
        return Err(ConfigError::ValidationError(format!(
            "profile.crf must be between 0 and 51, got {}",
            config.profile.crf
        )));
    }

    if config.profile.audio_bitrate_kbps == 0 {
        return Err(ConfigError::ValidationError(
            "profile.audio_bitrate_kbps cannot be 0".to_string(),
        ));
    }

    if config.download.release_delay_ms == 0
        || config.download.release_delay_ms > MAX_RELEASE_DELAY_MS
    {
        return Err(ConfigError::ValidationError(format!(
            "download.release_delay_ms must be between 1 and {}, got {}",
            MAX_RELEASE_DELAY_MS, config.download.release_delay_ms
        )));
    }

    Ok(())
}
