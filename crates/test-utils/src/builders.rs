use sitepipe::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the defaults an empty `Sitepipe.toml` would give.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn source(mut self, dir: &str) -> Self {
        self.config.paths.source = dir.to_string();
        self
    }

    pub fn outputs(mut self, development: &str, production: &str) -> Self {
        self.config.paths.development = development.to_string();
        self.config.paths.production = production.to_string();
        self
    }

    pub fn disable(mut self, task: &str) -> Self {
        self.config.tasks.disabled.push(task.to_string());
        self
    }

    pub fn global_name(mut self, name: &str) -> Self {
        self.config.scripts.global_name = name.to_string();
        self
    }

    pub fn queue_length(mut self, len: usize) -> Self {
        self.config.watch.queue_length = len;
        self
    }

    /// The raw config, for tests that exercise validation themselves.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
