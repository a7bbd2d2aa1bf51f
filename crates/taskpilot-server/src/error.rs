use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: set the {env_var} environment variable")]
    MissingEnvVar { env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Map a missing settings field back to the environment variable the
/// operator needs to set.
pub fn to_env_var(field: &str) -> String {
    let field = field.trim_matches('`');
    let path = match field {
        "type" | "api_key" | "model" => format!("provider.{}", field),
        "api_token" => format!("todoist.{}", field),
        other => other.to_string(),
    };
    format!("TASKPILOT_{}", path.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var_sections() {
        assert_eq!(to_env_var("type"), "TASKPILOT_PROVIDER__TYPE");
        assert_eq!(to_env_var("api_key"), "TASKPILOT_PROVIDER__API_KEY");
        assert_eq!(to_env_var("api_token"), "TASKPILOT_TODOIST__API_TOKEN");
        assert_eq!(to_env_var("server.port"), "TASKPILOT_SERVER__PORT");
    }
}
