use clap::Args;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Tunables for deposit/withdraw processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Args)]
pub struct ProcessingConfig {
    /// How many times a deposit or withdrawal is re-attempted after losing a
    /// version race before it fails. 0 means a single attempt.
    #[arg(long, env = "WALLET_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
