use crate::config::Config;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Dependencies whose records are dropped below Trace. Push fan-outs open one
/// connection per subscription, so the HTTP and TLS stacks are the loudest.
const NOISY_DEPENDENCIES: &[&str] = &[
    "sqlx", "sea_orm", "tower", "tracing", "hyper", "axum", "reqwest", "rustls",
];

/// What the terminal logger is built from.
#[derive(Debug, PartialEq)]
struct LogSettings {
    level: LevelFilter,
    filter_dependencies: bool,
    colors: ColorChoice,
}

impl LogSettings {
    fn from_config(config: &Config) -> Self {
        Self {
            level: config.log_level_filter,
            filter_dependencies: config.log_level_filter != LevelFilter::Trace,
            // Production output goes to a log collector, not a terminal.
            colors: if config.is_production() {
                ColorChoice::Never
            } else {
                ColorChoice::Auto
            },
        }
    }

    fn ignored_targets(&self) -> &'static [&'static str] {
        if self.filter_dependencies {
            NOISY_DEPENDENCIES
        } else {
            &[]
        }
    }

    fn build(&self) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        for target in self.ignored_targets() {
            builder.add_filter_ignore_str(target);
        }

        builder.build()
    }
}

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger. Calling it a second time leaves the
    /// first logger in place.
    pub fn init_logger(config: &Config) {
        let settings = LogSettings::from_config(config);

        if let Err(e) = TermLogger::init(
            settings.level,
            settings.build(),
            TerminalMode::Mixed,
            settings.colors,
        ) {
            eprintln!("Logger already initialized: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config_with(args: &[&str]) -> Config {
        let mut argv = vec!["pushpost_rs"];
        argv.extend_from_slice(args);
        Config::try_from_args(argv).unwrap()
    }

    #[test]
    #[serial]
    fn dependencies_are_filtered_below_trace() {
        let settings = LogSettings::from_config(&config_with(&["--log-level-filter", "DEBUG"]));

        assert!(settings.filter_dependencies);
        assert!(settings.ignored_targets().contains(&"reqwest"));
        assert!(settings.ignored_targets().contains(&"sea_orm"));
    }

    #[test]
    #[serial]
    fn trace_shows_every_dependency() {
        let settings = LogSettings::from_config(&config_with(&["--log-level-filter", "TRACE"]));

        assert_eq!(settings.level, LevelFilter::Trace);
        assert!(settings.ignored_targets().is_empty());
    }

    #[test]
    #[serial]
    fn production_disables_colors() {
        let production = LogSettings::from_config(&config_with(&["--runtime-env", "production"]));
        let development =
            LogSettings::from_config(&config_with(&["--runtime-env", "development"]));

        assert_eq!(production.colors, ColorChoice::Never);
        assert_eq!(development.colors, ColorChoice::Auto);
    }

    #[test]
    fn building_the_simplelog_config_does_not_panic() {
        let settings = LogSettings {
            level: LevelFilter::Info,
            filter_dependencies: true,
            colors: ColorChoice::Auto,
        };
        let _config = settings.build();
    }
}
