//! Output module backed by an external MPV process.
//!
//! `init` waits until MPV is up and answering on its socket. After that, calls
//! from the dispatcher never wait on MPV: they queue a [`Request`] and update the
//! cached playback state once it is queued. A single worker task on the main loop owns the
//! MPV connection, serves requests in order, and turns MPV events into
//! transition and metadata callbacks.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use async_channel::{Receiver, Sender};
use clap::{Arg, ArgAction, ArgMatches};
use parking_lot::Mutex;

use super::client::{LaunchOptions, MpvClient, MpvError};
use super::process::ipc_path;
use super::protocol::{song_metadata, MpvEvent};
use crate::config::AppConfig;
use crate::output::{
  InitContext, MetadataCallback, OptionContext, OutputError, OutputModule, PlayFeedback, Result,
  SongMetaData, TrackPosition, TransitionCallback,
};

const OPTION_HEADING: &str = "MPV output options";

const OBSERVED_PROPERTIES: [(i64, &str); 5] = [
  (1, "time-pos"),
  (2, "duration"),
  (3, "volume"),
  (4, "mute"),
  (5, "metadata"),
];

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Work queued for the MPV worker.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Request {
  Load(String),
  Pause(bool),
  Stop,
  /// Absolute position in seconds.
  Seek(f64),
  /// MPV scale, 0-100.
  Volume(f64),
  Mute(bool),
}

/// What we know about MPV's playback, kept current by property observers.
struct PlaybackState {
  uri: Option<String>,
  next_uri: Option<String>,
  /// Whether `uri` has been handed to MPV.
  loaded: bool,
  duration_secs: f64,
  time_pos_secs: f64,
  volume: f64,
  mute: bool,
  metadata: SongMetaData,
  transition_cb: Option<TransitionCallback>,
  meta_cb: Option<MetadataCallback>,
}

impl PlaybackState {
  fn new() -> Self {
    Self {
      uri: None,
      next_uri: None,
      loaded: false,
      duration_secs: 0.0,
      time_pos_secs: 0.0,
      volume: 100.0,
      mute: false,
      metadata: SongMetaData::default(),
      transition_cb: None,
      meta_cb: None,
    }
  }
}

pub struct MpvOutput {
  state: Arc<Mutex<PlaybackState>>,
  requests: OnceLock<Sender<Request>>,
}

impl MpvOutput {
  pub fn new() -> Self {
    Self {
      state: Arc::new(Mutex::new(PlaybackState::new())),
      requests: OnceLock::new(),
    }
  }

  fn send(&self, request: Request) -> Result<()> {
    let tx = self
      .requests
      .get()
      .ok_or(OutputError::Mpv(MpvError::NotConnected))?;
    tx.try_send(request)
      .map_err(|_| OutputError::Mpv(MpvError::NotConnected))
  }

  #[cfg(test)]
  fn attach(&self) -> Receiver<Request> {
    let (tx, rx) = async_channel::unbounded();
    let _ = self.requests.set(tx);
    rx
  }
}

impl Default for MpvOutput {
  fn default() -> Self {
    Self::new()
  }
}

/// Command line first, then config file, then auto-detection.
fn launch_options(matches: &ArgMatches, config: &AppConfig) -> LaunchOptions {
  let mpv_path = matches
    .try_get_one::<PathBuf>("mpv-path")
    .ok()
    .flatten()
    .cloned()
    .or_else(|| {
      config
        .mpv_path
        .as_ref()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
    });

  let extra_args = matches
    .try_get_many::<String>("mpv-arg")
    .ok()
    .flatten()
    .map(|args| args.cloned().collect())
    .unwrap_or_else(|| config.mpv_args.clone());

  LaunchOptions {
    mpv_path,
    extra_args,
    ipc_path: ipc_path(),
  }
}

impl OutputModule for MpvOutput {
  fn name(&self) -> &'static str {
    "mpv"
  }

  fn description(&self) -> &'static str {
    "MPV media player (JSON IPC)"
  }

  fn add_options(&self, ctx: &mut OptionContext) -> Result<()> {
    ctx.add(
      OPTION_HEADING,
      Arg::new("mpv-path")
        .long("mpv-path")
        .value_name("PATH")
        .value_parser(clap::value_parser!(PathBuf))
        .help("MPV executable to use (default: search PATH)"),
    )?;
    ctx.add(
      OPTION_HEADING,
      Arg::new("mpv-arg")
        .long("mpv-arg")
        .value_name("ARG")
        .action(ArgAction::Append)
        .allow_hyphen_values(true)
        .help("Extra argument passed to MPV; may be repeated"),
    )?;
    Ok(())
  }

  fn init(&self, ctx: &InitContext<'_>) -> Result<()> {
    if self.requests.get().is_some() {
      return Err(OutputError::Failed("MPV output already initialized".into()));
    }

    let options = launch_options(ctx.matches, ctx.config);
    let mut client = MpvClient::spawn(&options)?;
    let events = ctx.runtime.block_on(start_client(&mut client))?;
    log::info!("MPV output ready");

    let (tx, rx) = async_channel::unbounded();
    ctx.runtime.spawn(run_worker(client, events, self.state.clone(), rx));
    let _ = self.requests.set(tx);
    Ok(())
  }

  fn set_uri(&self, uri: &str, meta_cb: MetadataCallback) -> Result<()> {
    log::info!("mpv: set uri to {}", uri);
    let mut state = self.state.lock();
    state.uri = Some(uri.to_string());
    state.loaded = false;
    state.time_pos_secs = 0.0;
    state.duration_secs = 0.0;
    state.metadata = SongMetaData::default();
    state.meta_cb = Some(meta_cb);
    Ok(())
  }

  fn set_next_uri(&self, uri: &str) -> Result<()> {
    log::info!("mpv: set next uri to {}", uri);
    self.state.lock().next_uri = Some(uri.to_string());
    Ok(())
  }

  fn play(&self, transition_cb: TransitionCallback) -> Result<()> {
    let mut state = self.state.lock();
    let Some(uri) = state.uri.clone().or_else(|| state.next_uri.clone()) else {
      return Err(OutputError::Failed("No URI to play".into()));
    };
    let request = if state.loaded {
      Request::Pause(false)
    } else {
      Request::Load(uri.clone())
    };
    self.send(request)?;

    if state.uri.is_none() {
      state.next_uri = None;
      state.uri = Some(uri);
    }
    state.loaded = true;
    state.transition_cb = Some(transition_cb);
    Ok(())
  }

  fn pause(&self) -> Result<()> {
    self.send(Request::Pause(true))
  }

  fn stop(&self) -> Result<()> {
    let mut state = self.state.lock();
    self.send(Request::Stop)?;
    state.loaded = false;
    state.time_pos_secs = 0.0;
    Ok(())
  }

  fn seek(&self, position_nanos: i64) -> Result<()> {
    self.send(Request::Seek(position_nanos as f64 / NANOS_PER_SEC))
  }

  fn get_position(&self) -> Result<TrackPosition> {
    let state = self.state.lock();
    Ok(TrackPosition {
      duration_nanos: secs_to_nanos(state.duration_secs),
      position_nanos: secs_to_nanos(state.time_pos_secs),
    })
  }

  fn get_volume(&self) -> Result<f32> {
    Ok((self.state.lock().volume / 100.0) as f32)
  }

  fn set_volume(&self, volume: f32) -> Result<()> {
    let mpv_volume = f64::from(volume) * 100.0;
    let mut state = self.state.lock();
    self.send(Request::Volume(mpv_volume))?;
    state.volume = mpv_volume;
    Ok(())
  }

  fn get_mute(&self) -> Result<bool> {
    Ok(self.state.lock().mute)
  }

  fn set_mute(&self, mute: bool) -> Result<()> {
    let mut state = self.state.lock();
    self.send(Request::Mute(mute))?;
    state.mute = mute;
    Ok(())
  }
}

fn secs_to_nanos(secs: f64) -> i64 {
  (secs * NANOS_PER_SEC).round() as i64
}

/// Connect to the freshly spawned MPV and subscribe to the properties we track.
async fn start_client(client: &mut MpvClient) -> std::result::Result<Receiver<MpvEvent>, MpvError> {
  client.connect().await?;
  let events = client.events().ok_or(MpvError::NotConnected)?;
  for (id, name) in OBSERVED_PROPERTIES {
    client.observe_property(id, name).await?;
  }
  Ok(events)
}

async fn run_worker(
  mut client: MpvClient,
  events: Receiver<MpvEvent>,
  state: Arc<Mutex<PlaybackState>>,
  requests: Receiver<Request>,
) {
  loop {
    tokio::select! {
      request = requests.recv() => {
        let Ok(request) = request else {
          break;
        };
        log::debug!("MPV request: {:?}", request);
        if let Err(e) = perform(&client, request).await {
          log::error!("MPV request failed: {}", e);
        }
      }
      event = events.recv() => {
        let Ok(event) = event else {
          log::error!("Lost connection to MPV");
          requests.close();
          connection_lost(&state);
          return;
        };
        if let Some(next) = handle_event(&state, &event) {
          if let Err(e) = client.loadfile(&next).await {
            log::error!("Failed to load next stream: {}", e);
          }
        }
      }
    }
  }

  client.quit().await;
}

/// MPV went away underneath us; whatever was playing has stopped.
fn connection_lost(state: &Mutex<PlaybackState>) {
  let cb = {
    let mut s = state.lock();
    s.loaded = false;
    s.time_pos_secs = 0.0;
    s.transition_cb.clone()
  };
  if let Some(cb) = cb {
    cb(PlayFeedback::Stopped);
  }
}

async fn perform(client: &MpvClient, request: Request) -> std::result::Result<(), MpvError> {
  match request {
    Request::Load(uri) => {
      client.loadfile(&uri).await?;
      client.set_pause(false).await
    }
    Request::Pause(paused) => client.set_pause(paused).await,
    Request::Stop => client.stop().await,
    Request::Seek(seconds) => client.seek(seconds).await,
    Request::Volume(volume) => client.set_volume(volume).await,
    Request::Mute(mute) => client.set_mute(mute).await,
  }
}

/// Apply an MPV event to the cached state and fire callbacks.
/// Returns the URI to load when playback advances to the queued stream.
fn handle_event(state: &Mutex<PlaybackState>, event: &MpvEvent) -> Option<String> {
  match event.event.as_str() {
    "property-change" => {
      update_property(state, event);
      None
    }
    "end-file" => end_of_file(state, event.reason.as_deref().unwrap_or("")),
    _ => None,
  }
}

fn update_property(state: &Mutex<PlaybackState>, event: &MpvEvent) {
  let Some(name) = event.property() else {
    return;
  };
  let data = event.data.as_ref();

  let mut s = state.lock();
  match name {
    "time-pos" => s.time_pos_secs = data.and_then(|d| d.as_f64()).unwrap_or(0.0),
    "duration" => s.duration_secs = data.and_then(|d| d.as_f64()).unwrap_or(0.0),
    "volume" => {
      if let Some(volume) = data.and_then(|d| d.as_f64()) {
        s.volume = volume;
      }
    }
    "mute" => {
      if let Some(mute) = data.and_then(|d| d.as_bool()) {
        s.mute = mute;
      }
    }
    "metadata" => {
      let meta = data.map(song_metadata).unwrap_or_default();
      if meta.is_empty() || meta == s.metadata {
        return;
      }
      s.metadata = meta.clone();
      let cb = s.meta_cb.clone();
      // Callbacks may call back into the output.
      drop(s);
      if let Some(cb) = cb {
        log::info!("mpv: metadata update {:?}", meta);
        cb(&meta);
      }
    }
    _ => {}
  }
}

fn end_of_file(state: &Mutex<PlaybackState>, reason: &str) -> Option<String> {
  log::info!("MPV end-file event, reason: {}", reason);

  // "stop" follows our own stop/loadfile; "quit" is shutdown.
  if reason != "eof" && reason != "error" {
    return None;
  }

  let (feedback, next, cb) = {
    let mut s = state.lock();
    let next = if reason == "eof" { s.next_uri.take() } else { None };
    s.time_pos_secs = 0.0;
    s.duration_secs = 0.0;
    s.metadata = SongMetaData::default();
    match next {
      Some(uri) => {
        s.uri = Some(uri.clone());
        s.loaded = true;
        (PlayFeedback::StartedNextStream, Some(uri), s.transition_cb.clone())
      }
      None => {
        s.loaded = false;
        (PlayFeedback::Stopped, None, s.transition_cb.clone())
      }
    }
  };

  if let Some(cb) = cb {
    cb(feedback);
  }
  next
}
