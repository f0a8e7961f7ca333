//! Tool endpoint discovery
//!
//! Tool base URLs come from two places: the `tools` table in the app config
//! and `services__<name>__http__0` style environment variables injected by
//! deployment tooling. Env entries win over config entries, and https
//! endpoints win over http.

use std::collections::HashMap;

const ENV_PREFIX: &str = "services__";

/// Merge configured tools with environment-discovered ones
pub fn discover_tools(configured: &HashMap<String, String>) -> HashMap<String, String> {
    merge(configured, &tools_from_env_vars(std::env::vars()))
}

fn merge(
    configured: &HashMap<String, String>,
    from_env: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut tools = configured.clone();

    for (name, env_endpoint) in from_env {
        match tools.get(name) {
            Some(cfg_endpoint)
                if !env_endpoint.to_lowercase().starts_with("https:")
                    && cfg_endpoint.to_lowercase().starts_with("https:") => {}
            _ => {
                tools.insert(name.clone(), env_endpoint.clone());
            }
        }
    }

    tools
}

/// Extract tool endpoints from `services__<name>__http__0` env vars,
/// preferring the https variant when both are present
fn tools_from_env_vars(vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
    let mut tools: HashMap<String, String> = HashMap::new();

    for (name, value) in vars {
        let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let Some(service) = rest.split("__http").next().filter(|s| !s.is_empty()) else {
            continue;
        };
        if !rest.contains("__http") {
            continue;
        }

        let is_https = name.ends_with("https__0");
        if tools.contains_key(service) && !is_https {
            continue;
        }
        tools.insert(service.to_string(), value);
    }

    tools
}
