use std::time::Duration;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

// --- Runtime Configuration ---

/// Configuration for the `ActorRuntime`.
#[derive(Clone, Debug)]
pub struct ActorRuntimeConfig {
    /// The default capacity for actor mailboxes. `None` means unbounded.
    pub default_mailbox_capacity: Option<usize>,

    /// How long a caller waits for its turn to finish. `None` waits forever.
    pub default_call_timeout: Option<Duration>,

    /// Activations idle for longer than this are deactivated.
    pub idle_timeout: Duration,

    /// How often the idle sweeper runs.
    pub scan_interval: Duration,

    /// The timeout for runtime shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for ActorRuntimeConfig {
    fn default() -> Self {
        Self {
            default_mailbox_capacity: None,
            default_call_timeout: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ActorRuntimeConfig {
    /// Merge runtime configuration with actor-type-specific configuration.
    /// This applies defaults from the runtime config where the type config doesn't specify values.
    pub fn merge_with_type_config(&self, type_config: &ActorTypeConfig) -> ActorTypeConfig {
        ActorTypeConfig {
            mailbox_capacity: type_config.mailbox_capacity.or(self.default_mailbox_capacity),
            call_timeout: type_config.call_timeout.or(self.default_call_timeout),
            idle_timeout: type_config.idle_timeout.or(Some(self.idle_timeout)),
        }
    }
}

// --- Actor Type Configuration ---

/// Per actor type overrides of the runtime defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorTypeConfig {
    /// The capacity of each activation's mailbox.
    pub mailbox_capacity: Option<usize>,

    /// The caller-side timeout for turns of this type.
    pub call_timeout: Option<Duration>,

    /// Idle time after which activations of this type are deactivated.
    pub idle_timeout: Option<Duration>,
}
