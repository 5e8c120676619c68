//! Command-line surface

use crate::config::ConfigOverrides;
use crate::parameters::{Direction, OnlyLast, RequestParameters, Threshold};
use clap::{ArgAction, Parser, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Submit a time series to the hosted anomaly detection service",
    long_about = None
)]
pub struct Cli {
    /// Input CSV file (timestamp,value). Synthetic data is generated when omitted
    #[arg(short = 'f', long, value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Output CSV file. Defaults to <uuid>.csv in the current directory
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file (TOML)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Write a sample configuration file and exit
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub generate_config: Option<PathBuf>,

    /// Scoring service URL
    #[arg(long, env = "ANOMALY_DETECTION_URL")]
    pub url: Option<String>,

    /// Scoring service API key
    #[arg(long, env = "ANOMALY_DETECTION_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds (no timeout by default)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Also write logs to this directory
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,

    /// Input field delimiter
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Generate random data (only used when no input file is given)
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub random: bool,

    #[command(flatten)]
    pub parameters: ParameterArgs,
}

/// Scoring options; anything left unset falls back to the configuration
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ParameterArgs {
    /// Maximum anomalies to return, as a fraction of the data [default: 0.1]
    #[arg(short = 'm', long = "max_anoms")]
    pub max_anomalies: Option<f64>,

    /// Directionality of the anomalies: pos, neg or both [default: both]
    #[arg(short, long)]
    pub direction: Option<Direction>,

    /// Only report anomalies above the median (med_max), 95th (p95) or 99th (p99)
    /// percentile of the daily max values: None, med_max, p95, p99 [default: None]
    #[arg(short, long)]
    pub threshold: Option<Threshold>,

    /// Statistical significance level [default: 0.05]
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Only report anomalies within the last day or hour: None, day, hr [default: None]
    #[arg(short = 'l', long = "onlylast")]
    pub only_last: Option<OnlyLast>,

    /// Add a column with the expected value
    #[arg(short = 'e', long = "expectedvalue", action = ArgAction::SetTrue)]
    pub expected_value: bool,

    /// Piecewise median time window in weeks [default: 2]
    #[arg(short = 'w', long = "piecewise")]
    pub piecewise_median_weeks: Option<i64>,

    /// Return a plot of the series with the anomalies marked
    #[arg(short = 'p', long = "plot", action = ArgAction::SetTrue)]
    pub create_plot: bool,

    /// Apply log scaling to the plot's y-axis
    #[arg(short = 'g', long = "y_log", num_args = 0..=1, default_missing_value = "true")]
    pub log_scaling: Option<bool>,

    /// X-axis label (plot only) [default: X]
    #[arg(short = 'x', long = "xlabel")]
    pub x_label: Option<String>,

    /// Y-axis label (plot only) [default: Y]
    #[arg(short = 'y', long = "ylabel")]
    pub y_label: Option<String>,

    /// Plot title (plot only) [default: Anomalies]
    #[arg(short = 'z', long = "title")]
    pub title: Option<String>,

    /// Remove NAs in timestamps
    #[arg(short = 'n', long = "NA", action = ArgAction::SetTrue)]
    pub remove_nas: bool,

    /// The series spans more than a month
    #[arg(short = 's', long = "longterm", num_args = 0..=1, default_missing_value = "true")]
    pub longterm: Option<bool>,
}

impl ParameterArgs {
    /// Apply the flags that were given on top of `base`
    ///
    /// Plot labels and title are only taken from the command line when a
    /// plot is requested.
    pub fn apply(&self, base: RequestParameters) -> RequestParameters {
        let mut params = base;

        if let Some(v) = self.max_anomalies {
            params.max_anomalies = v;
        }
        if let Some(v) = &self.direction {
            params.direction = v.clone();
        }
        if let Some(v) = &self.threshold {
            params.threshold = v.clone();
        }
        if let Some(v) = self.alpha {
            params.alpha = v;
        }
        if let Some(v) = &self.only_last {
            params.only_last = v.clone();
        }
        if let Some(v) = self.piecewise_median_weeks {
            params.piecewise_median_weeks = v;
        }
        if self.longterm.is_some() {
            params.longterm = self.longterm;
        }
        if self.log_scaling.is_some() {
            params.log_scaling = self.log_scaling;
        }
        params.expected_value |= self.expected_value;
        params.remove_nas |= self.remove_nas;
        params.create_plot |= self.create_plot;

        if params.create_plot {
            if let Some(v) = &self.x_label {
                params.x_label = v.clone();
            }
            if let Some(v) = &self.y_label {
                params.y_label = v.clone();
            }
            if let Some(v) = &self.title {
                params.title = v.clone();
            }
        }

        params
    }
}

impl Cli {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            file: self.config.clone(),
            url: self.url.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout,
        }
    }

    /// Delimiter as a single byte; only ASCII delimiters are supported
    pub fn delimiter_byte(&self) -> Option<u8> {
        u8::try_from(self.delimiter).ok().filter(u8::is_ascii)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("anomaly-client").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_flags_keeps_defaults() {
        let cli = parse(&[]);
        assert!(cli.input.is_none());
        assert_eq!(cli.delimiter_byte(), Some(b','));
        assert_eq!(
            cli.parameters.apply(RequestParameters::default()),
            RequestParameters::default()
        );
    }

    #[test]
    fn test_flags_override_parameters() {
        let cli = parse(&[
            "-f", "in.csv", "-o", "out.csv", "-vv", "--max_anoms", "0.02", "-d", "pos",
            "--threshold", "p95", "--onlylast", "day", "-e", "--piecewise", "4", "--NA",
            "--longterm", "--y_log", "false",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("in.csv")));
        assert_eq!(cli.output, Some(PathBuf::from("out.csv")));
        assert_eq!(cli.verbose, 2);

        let params = cli.parameters.apply(RequestParameters::default());
        assert_eq!(params.max_anomalies, 0.02);
        assert_eq!(params.direction, Direction::Pos);
        assert_eq!(params.threshold, Threshold::P95);
        assert_eq!(params.only_last, OnlyLast::Day);
        assert!(params.expected_value);
        assert_eq!(params.piecewise_median_weeks, 4);
        assert!(params.remove_nas);
        assert_eq!(params.longterm, Some(true));
        assert_eq!(params.log_scaling, Some(false));
    }

    #[test]
    fn test_labels_only_with_plot() {
        let without_plot = parse(&["--xlabel", "time", "--title", "Mine"]);
        let params = without_plot.parameters.apply(RequestParameters::default());
        assert_eq!(params.x_label, "X");
        assert_eq!(params.title, "Anomalies");

        let with_plot = parse(&["-p", "--xlabel", "time", "--title", "Mine"]);
        let params = with_plot.parameters.apply(RequestParameters::default());
        assert!(params.create_plot);
        assert_eq!(params.x_label, "time");
        assert_eq!(params.title, "Mine");
    }

    #[test]
    fn test_unknown_direction_is_forwarded() {
        let cli = parse(&["--direction", "up"]);
        let params = cli.parameters.apply(RequestParameters::default());
        assert_eq!(params.direction.as_str(), "up");
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let cli = parse(&["--delimiter", "§"]);
        assert_eq!(cli.delimiter_byte(), None);
    }
}
