use std::env;
use std::sync::OnceLock;

pub const TRACE_ENV: &str = "PRIME_COMPOSE_TRACE";

/// Process-wide switches for the composition engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComposeConfig {
    /// Log the linearized statement plan of every built function.
    pub trace_build: bool,
}

impl ComposeConfig {
    pub fn from_env() -> Self {
        Self::from_flag_or_env(None)
    }

    pub fn from_flag_or_env(trace_build: Option<bool>) -> Self {
        let trace_build = trace_build
            .or_else(|| env::var(TRACE_ENV).ok().map(|raw| parse_switch(&raw)))
            .unwrap_or(false);
        Self { trace_build }
    }

    /// Read from the environment on first use.
    pub fn global() -> &'static ComposeConfig {
        static CONFIG: OnceLock<ComposeConfig> = OnceLock::new();
        CONFIG.get_or_init(ComposeConfig::from_env)
    }
}

fn parse_switch(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "off" | "no"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flag_wins_over_environment() {
        assert!(ComposeConfig::from_flag_or_env(Some(true)).trace_build);
        assert!(!ComposeConfig::from_flag_or_env(Some(false)).trace_build);
    }

    #[test]
    fn switch_values() {
        assert!(parse_switch("1"));
        assert!(parse_switch("yes"));
        assert!(!parse_switch("0"));
        assert!(!parse_switch(" OFF "));
        assert!(!parse_switch(""));
    }
}
