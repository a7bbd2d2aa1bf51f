use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use taskpilot::providers::configs::{OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig};
use taskpilot::providers::ollama;
use taskpilot::todoist::{TodoistConfig, TODOIST_HOST};

#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                ConfigError::Other(config::ConfigError::Message(format!(
                    "invalid server address: {}",
                    e
                )))
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        api_key: String,
        #[serde(default = "default_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
    Ollama {
        #[serde(default = "default_ollama_host")]
        host: String,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
}

impl ProviderSettings {
    pub fn into_config(self) -> ProviderConfig {
        match self {
            ProviderSettings::OpenAi {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            }),
            ProviderSettings::Ollama {
                host,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::Ollama(OllamaProviderConfig {
                host,
                model,
                temperature,
                max_tokens,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TodoistSettings {
    #[serde(default = "default_todoist_host")]
    pub host: String,
    pub api_token: String,
}

impl TodoistSettings {
    pub fn into_config(self) -> TodoistConfig {
        TodoistConfig {
            host: self.host,
            api_token: self.api_token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub todoist: TodoistSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("todoist.host", default_todoist_host())?
            .add_source(
                Environment::with_prefix("TASKPILOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                // Surface missing fields as the env var the operator must set
                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_host() -> String {
    "https://api.openai.com".to_string()
}

fn default_ollama_host() -> String {
    ollama::OLLAMA_HOST.to_string()
}

fn default_ollama_model() -> String {
    ollama::OLLAMA_MODEL.to_string()
}

fn default_todoist_host() -> String {
    TODOIST_HOST.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("TASKPILOT_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        env::set_var("TASKPILOT_PROVIDER__TYPE", "openai");
        env::set_var("TASKPILOT_PROVIDER__API_KEY", "test-key");
        env::set_var("TASKPILOT_TODOIST__API_TOKEN", "todoist-token");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.todoist.host, TODOIST_HOST);
        assert_eq!(settings.todoist.api_token, "todoist-token");

        if let ProviderSettings::OpenAi {
            host,
            api_key,
            model,
            temperature,
            max_tokens,
        } = settings.provider
        {
            assert_eq!(host, "https://api.openai.com");
            assert_eq!(api_key, "test-key");
            assert_eq!(model, "gpt-4o");
            assert_eq!(temperature, None);
            assert_eq!(max_tokens, None);
        } else {
            panic!("Expected OpenAI provider");
        }

        env::remove_var("TASKPILOT_PROVIDER__TYPE");
        env::remove_var("TASKPILOT_PROVIDER__API_KEY");
        env::remove_var("TASKPILOT_TODOIST__API_TOKEN");
    }

    #[test]
    #[serial]
    fn test_ollama_settings() {
        clean_env();
        env::set_var("TASKPILOT_PROVIDER__TYPE", "ollama");
        env::set_var("TASKPILOT_PROVIDER__HOST", "http://custom.ollama.host");
        env::set_var("TASKPILOT_PROVIDER__MODEL", "llama2");
        env::set_var("TASKPILOT_PROVIDER__TEMPERATURE", "0.7");
        env::set_var("TASKPILOT_PROVIDER__MAX_TOKENS", "2000");
        env::set_var("TASKPILOT_TODOIST__API_TOKEN", "todoist-token");

        let settings = Settings::new().unwrap();
        if let ProviderSettings::Ollama {
            host,
            model,
            temperature,
            max_tokens,
        } = settings.provider
        {
            assert_eq!(host, "http://custom.ollama.host");
            assert_eq!(model, "llama2");
            assert_eq!(temperature, Some(0.7));
            assert_eq!(max_tokens, Some(2000));
        } else {
            panic!("Expected Ollama provider");
        }

        env::remove_var("TASKPILOT_PROVIDER__TYPE");
        env::remove_var("TASKPILOT_PROVIDER__HOST");
        env::remove_var("TASKPILOT_PROVIDER__MODEL");
        env::remove_var("TASKPILOT_PROVIDER__TEMPERATURE");
        env::remove_var("TASKPILOT_PROVIDER__MAX_TOKENS");
        env::remove_var("TASKPILOT_TODOIST__API_TOKEN");
    }

    #[test]
    #[serial]
    fn test_missing_api_token_names_env_var() {
        clean_env();
        env::set_var("TASKPILOT_PROVIDER__TYPE", "openai");
        env::set_var("TASKPILOT_PROVIDER__API_KEY", "test-key");

        let err = Settings::new().unwrap_err();
        match err {
            ConfigError::MissingEnvVar { env_var } => {
                assert_eq!(env_var, "TASKPILOT_TODOIST__API_TOKEN");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        env::remove_var("TASKPILOT_PROVIDER__TYPE");
        env::remove_var("TASKPILOT_PROVIDER__API_KEY");
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("TASKPILOT_SERVER__PORT", "8080");
        env::set_var("TASKPILOT_PROVIDER__TYPE", "openai");
        env::set_var("TASKPILOT_PROVIDER__API_KEY", "test-key");
        env::set_var("TASKPILOT_PROVIDER__MODEL", "gpt-4o-mini");
        env::set_var("TASKPILOT_TODOIST__API_TOKEN", "todoist-token");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);

        if let ProviderSettings::OpenAi { model, .. } = settings.provider {
            assert_eq!(model, "gpt-4o-mini");
        } else {
            panic!("Expected OpenAI provider");
        }

        env::remove_var("TASKPILOT_SERVER__PORT");
        env::remove_var("TASKPILOT_PROVIDER__TYPE");
        env::remove_var("TASKPILOT_PROVIDER__API_KEY");
        env::remove_var("TASKPILOT_PROVIDER__MODEL");
        env::remove_var("TASKPILOT_TODOIST__API_TOKEN");
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8000");
    }
}
