use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use directories::BaseDirs;

/// Layered configuration: built-in defaults, then `.datalensrc`, then
/// environment variables (highest precedence). All lookups go through the
/// merged map so a `Config` built from an explicit map behaves the same in
/// tests as one built by `load()`.
#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .datalensrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Build a config from explicit key/value pairs, ignoring the process
    /// environment. Defaults still apply for keys not given.
    pub fn from_map(overrides: HashMap<String, String>) -> Self {
        let mut map = default_map();
        map.extend(overrides);
        Self { inner: map, config_path: default_config_path() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned().filter(|v| !v.trim().is_empty())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "E2B_API_KEY",
        "SANDBOX_API_BASE",
        "OPENROUTER_API_KEY",
        "API_BASE_URL",
        "LLM_MODEL",
        "REQUEST_TIMEOUT",
        "EXECUTION_TIMEOUT",
    ];

    KEYS.contains(&k) || k.starts_with("DATALENS_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("datalens").join(".datalensrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("SANDBOX_API_BASE".into(), "https://api.e2b.dev".into());
    m.insert("API_BASE_URL".into(), "https://openrouter.ai/api/v1".into());
    m.insert("LLM_MODEL".into(), "google/gemini-2.0-flash-exp".into());

    // Seconds. Code execution runs wall-clock seconds inside the sandbox,
    // so it gets a wider window than plain API calls.
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("EXECUTION_TIMEOUT".into(), "300".into());

    m
}
