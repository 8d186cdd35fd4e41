use towers::RegistrySettings;

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub tick_rate: u32,
    pub arenas: Vec<String>,
    pub bots_per_arena: u32,
    /// Stop after this many ticks; run until interrupted when `None`.
    pub max_ticks: Option<u64>,
    /// Seed of the scripted bots' action schedule.
    pub seed: u64,
    pub registry: RegistrySettings,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            arenas: vec!["arena-1".to_string()],
            bots_per_arena: 4,
            max_ticks: None,
            seed: 0x5eed,
            registry: RegistrySettings::default(),
        }
    }
}
