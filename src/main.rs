use mediarender_lib::AppError;

fn main() {
  match mediarender_lib::run() {
    Ok(()) => {}
    // Help, version and usage errors
    Err(AppError::Cli(e)) => e.exit(),
    Err(e) => {
      eprintln!("ERROR: {}", e);
      std::process::exit(1);
    }
  }
}
