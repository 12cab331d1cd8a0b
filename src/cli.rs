use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(name = "mediarender")]
#[command(about = "Headless network media renderer")]
#[command(version)]
pub struct Cli {
  /// Output module to use; see --list-outputs.
  #[arg(short, long)]
  pub output: Option<String>,

  /// List available output modules and exit.
  #[arg(long)]
  pub list_outputs: bool,

  /// Override config file path.
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Log filter when RUST_LOG is not set (error, warn, info, debug, trace).
  #[arg(long)]
  pub log_level: Option<String>,

  /// Play this URI once the output is ready.
  #[arg(long, value_name = "URI")]
  pub play: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_parse_output_and_play() {
    let cli = Cli::try_parse_from(["mediarender", "-o", "mpv", "--play", "http://host/a.mp3"]).unwrap();
    assert_eq!(cli.output.as_deref(), Some("mpv"));
    assert_eq!(cli.play.as_deref(), Some("http://host/a.mp3"));
    assert!(!cli.list_outputs);
  }
}
