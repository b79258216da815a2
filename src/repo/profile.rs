use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where generated artifacts belong in a particular kind of repository.
///
/// Only `layout_hints` (artifact-kind directory per hint key) drives file
/// placement; `integration_hooks` are reported but never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoProfile {
    pub name: String,
    pub framework: Option<String>,
    pub language: String,
    pub integrations_dir: String,
    pub tests_dir: String,
    #[serde(default)]
    pub conventions: BTreeMap<String, String>,
    #[serde(default)]
    pub layout_hints: BTreeMap<String, String>,
    /// Hook name (`router_file`, `settings_file`) to repository-relative path.
    #[serde(default)]
    pub integration_hooks: BTreeMap<String, String>,
}

pub const DEFAULT_PROFILE: &str = "default";

pub fn builtin_profile_names() -> &'static [&'static str] {
    &[DEFAULT_PROFILE, "nextjs-app-router", "django-rest", "fastapi"]
}

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Look up a built-in profile by name.
pub fn builtin_profile(name: &str) -> Option<RepoProfile> {
    let profile = match name {
        DEFAULT_PROFILE => default_profile(),
        "nextjs-app-router" => RepoProfile {
            name: name.to_string(),
            framework: Some("nextjs".to_string()),
            language: "typescript".to_string(),
            integrations_dir: "lib/integrations".to_string(),
            tests_dir: "__tests__/integrations".to_string(),
            conventions: map(&[
                ("client_module_pattern", "clients/{provider}.ts"),
                ("flow_module_pattern", "flows/{provider}/{task}.ts"),
            ]),
            layout_hints: map(&[
                ("clients_dir", "lib/integrations/clients"),
                ("flows_dir", "lib/integrations/flows"),
                ("tests_dir", "__tests__/integrations"),
                ("config_dir", "lib/integrations/config"),
            ]),
            integration_hooks: map(&[("router_file", "app/api/integrations/route.ts")]),
        },
        "django-rest" => RepoProfile {
            name: name.to_string(),
            framework: Some("django".to_string()),
            language: "python".to_string(),
            integrations_dir: "integrations".to_string(),
            tests_dir: "tests/integrations".to_string(),
            conventions: map(&[
                ("client_module_pattern", "clients/{provider}.py"),
                ("flow_module_pattern", "services/{provider}_{task}.py"),
            ]),
            layout_hints: map(&[
                ("clients_dir", "integrations/clients"),
                ("flows_dir", "integrations/services"),
                ("tests_dir", "tests/integrations"),
            ]),
            integration_hooks: map(&[
                ("router_file", "config/urls.py"),
                ("settings_file", "config/settings.py"),
            ]),
        },
        "fastapi" => RepoProfile {
            name: name.to_string(),
            framework: Some("fastapi".to_string()),
            language: "python".to_string(),
            integrations_dir: "app/integrations".to_string(),
            tests_dir: "tests/integrations".to_string(),
            conventions: map(&[
                ("client_module_pattern", "clients/{provider}.py"),
                ("flow_module_pattern", "services/{provider}_{task}.py"),
            ]),
            layout_hints: map(&[
                ("clients_dir", "app/integrations/clients"),
                ("flows_dir", "app/integrations/services"),
                ("tests_dir", "tests/integrations"),
            ]),
            integration_hooks: map(&[("router_file", "app/main.py")]),
        },
        _ => return None,
    };
    Some(profile)
}

/// Profile used when the caller selects none; relies on built-in layout
/// defaults instead of hints.
pub fn default_profile() -> RepoProfile {
    RepoProfile {
        name: DEFAULT_PROFILE.to_string(),
        framework: None,
        language: "python".to_string(),
        integrations_dir: "src/integrations".to_string(),
        tests_dir: "tests/integrations".to_string(),
        conventions: map(&[
            ("client_module_pattern", "clients/{provider}_client.py"),
            ("flow_module_pattern", "flows/{task}_flow.py"),
            ("test_module_pattern", "test_{task}.py"),
        ]),
        layout_hints: BTreeMap::new(),
        integration_hooks: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_name_resolves() {
        for name in builtin_profile_names() {
            let profile = builtin_profile(name).expect("builtin profile");
            assert_eq!(&profile.name, name);
        }
        assert!(builtin_profile("rails").is_none());
    }
}
