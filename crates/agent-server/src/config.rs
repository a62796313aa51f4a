//! Server Configuration
//!
//! Read from the environment (after `.env` is loaded).

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => bail!("unknown LLM_PROVIDER '{}' (expected gemini or ollama)", other),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub provider: ProviderKind,
    pub model: String,
    /// Deadline for one chat request
    pub request_timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let provider = var("LLM_PROVIDER")
            .map(|p| p.parse())
            .transpose()?
            .unwrap_or(ProviderKind::Gemini);

        let model = match provider {
            ProviderKind::Gemini => var("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".into()),
            ProviderKind::Ollama => var("OLLAMA_MODEL").unwrap_or_else(|| "llama3.2".into()),
        };

        let request_timeout = var("CHAT_TIMEOUT_SECS")
            .map(|secs| secs.parse::<u64>().context("CHAT_TIMEOUT_SECS must be a number of seconds"))
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            provider,
            model,
            request_timeout,
        })
    }
}
