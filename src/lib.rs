use std::ffi::OsString;
use std::io;
use std::sync::Arc;

mod cli;
mod config;
pub mod mpv;
pub mod output;

pub use config::{AppConfig, ConfigError};
use clap::{ArgMatches, CommandFactory, FromArgMatches};
use cli::Cli;
use output::{
  InitContext, MainLoop, MetadataCallback, OptionContext, Output, OutputError, OutputRegistry,
  PlayFeedback, SongMetaData, TransitionCallback,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Output(#[from] OutputError),
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error(transparent)]
  Cli(#[from] clap::Error),
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
}

pub fn run() -> Result<(), AppError> {
  let output = Arc::new(Output::new(OutputRegistry::builtin()));
  let matches = parse_command_line(&output, std::env::args_os())?;
  let cli = Cli::from_arg_matches(&matches)?;

  if cli.list_outputs {
    output.registry().dump_modules(&mut io::stdout().lock())?;
    return Ok(());
  }

  let config = match cli.config.clone().or_else(AppConfig::default_path) {
    Some(path) => AppConfig::load(&path)?,
    None => AppConfig::default(),
  };
  init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

  let main_loop = MainLoop::new()?;
  let init = InitContext {
    runtime: main_loop.runtime(),
    matches: &matches,
    config: &config,
  };
  output.select(cli.output.as_deref().or(config.output.as_deref()), &init)?;

  if let Some(uri) = cli.play.as_deref() {
    start_playback(&output, uri)?;
  }

  main_loop.run();
  Ok(())
}

/// Every module contributes its options before anything is parsed.
fn parse_command_line<I, T>(output: &Output, args: I) -> Result<ArgMatches, AppError>
where
  I: IntoIterator<Item = T>,
  T: Into<OsString> + Clone,
{
  let base = Cli::command();
  let mut options = OptionContext::for_command(&base);
  output.add_options(&mut options)?;
  Ok(options.apply(base).try_get_matches_from(args)?)
}

fn init_logging(level: &str) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  // `log` records are bridged into the subscriber.
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .try_init();
}

fn start_playback(output: &Output, uri: &str) -> Result<(), OutputError> {
  let on_metadata: MetadataCallback = Arc::new(|meta: &SongMetaData| {
    log::info!(
      "Now playing: {} - {}",
      meta.artist.as_deref().unwrap_or("?"),
      meta.title.as_deref().unwrap_or("?")
    );
  });
  let on_transition: TransitionCallback = Arc::new(|feedback: PlayFeedback| {
    log::info!("Playback transition: {:?}", feedback);
  });

  output.set_uri(uri, on_metadata)?;
  output.play(on_transition)
}
