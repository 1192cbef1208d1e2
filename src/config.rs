//! Configuration surfaces for [`EventLoop`](crate::event_loop::EventLoop) and
//! [`EventLoopGroup`](crate::group::EventLoopGroup), in the familiar
//! `Config { ..Config::default() }` construction style.

/// Linux caps thread names (via `pthread_setname_np`) at 16 bytes including
/// the nul terminator; macOS and the BSDs are more generous, but we target
/// the tightest common denominator so a name never gets silently truncated
/// on one platform and not another.
const MAX_THREAD_NAME_LEN: usize = 15;

/// Configuration for a single [`EventLoop`](crate::event_loop::EventLoop).
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of readiness events the Selector will return per `wait` call.
    pub event_batch_size: usize,
    /// Base name this loop's worker thread is derived from; see [`Config::thread_name`].
    pub thread_name_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            event_batch_size: 1024,
            thread_name_base: "loomcore".to_owned(),
        }
    }
}

impl Config {
    /// The worker thread name for the loop at `index` within its group,
    /// truncating [`Config::thread_name_base`] to leave room for the index
    /// suffix so the combined name never exceeds the platform limit.
    pub fn thread_name(&self, index: usize) -> String {
        let suffix = format!("-{index}");
        let max_base_len = MAX_THREAD_NAME_LEN.saturating_sub(suffix.len());

        let base: String = self.thread_name_base.chars().take(max_base_len).collect();
        format!("{base}{suffix}")
    }
}

/// Configuration for an [`EventLoopGroup`](crate::group::EventLoopGroup).
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Number of [`EventLoop`](crate::event_loop::EventLoop)s the group owns.
    pub num_threads: usize,
    /// Config each owned loop is constructed with.
    pub loop_config: Config,
}

impl Default for GroupConfig {
    fn default() -> Self {
        GroupConfig {
            num_threads: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            loop_config: Config::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod thread_name {
        use super::*;

        #[test]
        fn fits_within_the_platform_limit() {
            let config = Config { thread_name_base: "a-very-long-base-name-indeed".to_owned(), ..Config::default() };
            for index in [0, 7, 42, 12345] {
                assert!(config.thread_name(index).len() <= MAX_THREAD_NAME_LEN);
            }
        }

        #[test]
        fn preserves_short_base_names_verbatim() {
            let config = Config { thread_name_base: "io".to_owned(), ..Config::default() };
            assert_eq!(config.thread_name(3), "io-3");
        }
    }

    #[test]
    fn group_config_defaults_to_available_parallelism() {
        let config = GroupConfig::default();
        assert!(config.num_threads >= 1);
    }
}
